//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Catalogue requests with retry (`HttpCatalogSource`)
//! - Page iteration and termination (`CatalogPaginator`)
//! - Record extraction from list markup (`ActionListExtractor`)
//! - Title normalization (`TaxonomyNormalizer`)
//! - URL and path derivation (`PathBuilder`)
//! - Streaming downloads (`ArtifactDownloader`)
//! - Renaming of downloaded files (`FileRenamer`)

mod catalog;
mod downloader;
mod extractor;
mod paginator;
mod paths;
mod renamer;
mod taxonomy;

pub use catalog::{HttpCatalogSource, RetryPolicy};
pub use downloader::{ArtifactDownloader, ArtifactFetcher};
pub use extractor::{ActionListExtractor, ItemExtractor, first_quoted_arg};
pub use paginator::{CatalogPaginator, PageSource};
pub use paths::{DEFAULT_EXT, PathBuilder};
pub use renamer::{FileRenamer, RenameReport};
pub use taxonomy::{TaxonomyNormalizer, extract_month, extract_year};

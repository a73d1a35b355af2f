// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod page;
mod record;
mod taxonomy;

// Re-export all public types
pub use config::{
    CatalogConfig, CategoryOption, Config, CrawlerConfig, ExtractorConfig, GradeOption,
    OutputConfig, RenameConfig, SubjectMapping,
};
pub use page::{FilterParams, PageOutcome, PageResult};
pub use record::{RawRecord, Resource, ResourceKind};
pub use taxonomy::{Taxonomy, UNKNOWN_MONTH, UNKNOWN_YEAR};

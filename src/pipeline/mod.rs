//! Pipeline entry points for crawler operations.
//!
//! - `run_crawler`: Walk the catalogue and download every artifact
//! - `run_rename`: Bring existing file names in line with the file template

pub mod rename;
pub mod run;

pub use rename::run_rename;
pub use run::{Pipeline, RunSummary, run_crawler, session_cookies};

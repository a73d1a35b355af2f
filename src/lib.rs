// src/lib.rs

//! Exam Crawler Library
//!
//! Walks a paginated exam catalogue, classifies each entry by year, month and
//! subject, and downloads the problem and solution documents into a
//! predictable directory layout.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;

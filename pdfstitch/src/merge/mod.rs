//! PDF merging operations.
//!
//! This module provides the merge engine:
//! - Page-by-page assembly from heterogeneous sources
//! - Rotation composed with each source page's own rotation
//! - Info dictionary handling
//! - Atomic writes and in-memory previews
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::merge::Merger;
//! use pdfstitch::model::PageRef;
//! use std::path::Path;
//!
//! # async fn example(pages: Vec<PageRef>) -> Result<(), Box<dyn std::error::Error>> {
//! let merger = Merger::new();
//! let stats = merger.merge_to_path(&pages, Path::new("merged.pdf")).await?;
//! println!("Merged {} pages", stats.total_pages);
//! # Ok(())
//! # }
//! ```

pub mod merger;
pub mod metadata;
pub mod pages;

pub use merger::{MergeResult, MergeStatistics, Merger};
pub use metadata::MetadataManager;
pub use pages::PageCopier;

//! pdfstitch - Assemble one PDF from pages of many source files.
//!
//! This library provides the editing model and merge engine behind the
//! `pdfstitch` tool. It supports:
//!
//! - Importing PDFs, images, text and office documents as page lists
//! - Page and file (group) views over one ordered list
//! - Rotation, deletion, reordering and drag with undo/redo
//! - Orientation toggling by reconversion or rotation
//! - Rotation-aware merging to disk or to memory for previews
//!
//! # Examples
//!
//! ## Editing Session
//!
//! ```no_run
//! use pdfstitch::config::Config;
//! use pdfstitch::session::Session;
//! use std::path::{Path, PathBuf};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = Session::from_config(&Config::default());
//! let report = session
//!     .add_files(&[PathBuf::from("a.pdf"), PathBuf::from("scan.png")])
//!     .await?;
//! println!("Imported {} pages", report.pages.len());
//!
//! session.move_item(1, 0)?;
//! session.undo()?;
//!
//! let stats = session.merge_to_path(Path::new("merged.pdf")).await?;
//! println!("Created {} page document", stats.total_pages);
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Individual Components
//!
//! ```no_run
//! use pdfstitch::io::PdfReader;
//! use pdfstitch::merge::Merger;
//! use pdfstitch::model::PageRef;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let path = Path::new("input.pdf");
//! let info = PdfReader::new().pdf_info(path)?;
//!
//! let pages: Vec<PageRef> = info
//!     .pages
//!     .iter()
//!     .enumerate()
//!     .map(|(i, page)| PageRef::new(path, path, i, page.is_portrait))
//!     .rev()
//!     .collect();
//!
//! Merger::new().merge_to_path(&pages, Path::new("reversed.pdf")).await?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod convert;
pub mod error;
pub mod grouping;
pub mod history;
pub mod import;
pub mod io;
pub mod merge;
pub mod model;
pub mod output;
pub mod render;
pub mod reorder;
pub mod session;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, StitchError};
pub use model::{PageId, PageRef, Rotation, ViewMode};
pub use session::{OrientationOutcome, Session, Target};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

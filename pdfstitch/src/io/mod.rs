//! I/O operations for pdfstitch.
//!
//! This module handles all PDF file I/O:
//! - Loading and inspecting source documents
//! - Writing merged documents atomically
//! - Serialising documents to memory for previews
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::io::{PdfReader, PdfWriter};
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let loaded = reader.load(Path::new("input.pdf"))?;
//!
//! let writer = PdfWriter::new();
//! writer.save_blocking(loaded.document, Path::new("output.pdf"))?;
//! # Ok(())
//! # }
//! ```

pub mod reader;
pub mod writer;

pub use reader::{LoadedPdf, PageInfo, PdfInfo, PdfReader};
pub use writer::{PdfWriter, WriteOptions, WriteStatistics};

//! PDF writing and saving operations.
//!
//! This module provides safe PDF writing with:
//! - Atomic writes (write to temp file, then rename)
//! - Compression levels
//! - In-memory serialisation for previews
//! - Write statistics
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::io::writer::PdfWriter;
//! use lopdf::Document;
//! use std::path::Path;
//!
//! # fn example(doc: Document) -> Result<(), Box<dyn std::error::Error>> {
//! let writer = PdfWriter::new();
//! let stats = writer.save_blocking(doc, Path::new("output.pdf"))?;
//! println!("wrote {}", stats.format_file_size());
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::CompressionLevel;
use crate::error::{Result, StitchError};
use crate::utils::format_file_size;

/// Options for writing PDF files.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Use atomic writes (write to temp file, then rename).
    pub atomic: bool,

    /// Compress streams before writing.
    pub compress: bool,

    /// Drop unreferenced objects and renumber.
    pub optimize: bool,

    /// Buffer size for writing (in bytes).
    pub buffer_size: usize,
}

impl WriteOptions {
    /// Options matching a compression level.
    pub fn for_compression(level: CompressionLevel) -> Self {
        let (compress, optimize) = match level {
            CompressionLevel::None => (false, false),
            CompressionLevel::Standard => (true, false),
            CompressionLevel::Maximum => (true, true),
        };
        Self {
            compress,
            optimize,
            ..Self::default()
        }
    }
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            compress: true,
            optimize: false,
            buffer_size: 8192,
        }
    }
}

/// Statistics about a write operation.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time taken to write the file.
    pub write_time: Duration,

    /// Size of the written file in bytes.
    pub file_size: u64,

    /// Path where the file was written.
    pub output_path: PathBuf,

    /// Whether compression was applied.
    pub compressed: bool,
}

impl WriteStatistics {
    /// Format file size as human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Create a writer for a compression level.
    pub fn for_compression(level: CompressionLevel) -> Self {
        Self::with_options(WriteOptions::for_compression(level))
    }

    /// Save a PDF on the current thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written. With atomic
    /// writes the target is left untouched on failure.
    pub fn save_blocking(&self, mut doc: Document, path: &Path) -> Result<WriteStatistics> {
        let start = Instant::now();
        self.prepare(&mut doc);

        let write_path = if self.options.atomic {
            temp_path_for(path)
        } else {
            path.to_path_buf()
        };

        if let Err(e) = self.write_file(&mut doc, &write_path) {
            if self.options.atomic {
                let _ = std::fs::remove_file(&write_path);
            }
            return Err(e);
        }

        if self.options.atomic {
            std::fs::rename(&write_path, path).map_err(|e| {
                let _ = std::fs::remove_file(&write_path);
                StitchError::FailedToWrite {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;
        }

        let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        debug!(path = %path.display(), size = file_size, "wrote PDF");

        Ok(WriteStatistics {
            write_time: start.elapsed(),
            file_size,
            output_path: path.to_path_buf(),
            compressed: self.options.compress,
        })
    }

    /// Serialise a PDF into memory.
    pub fn to_bytes(&self, mut doc: Document) -> Result<Vec<u8>> {
        self.prepare(&mut doc);
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)
            .map_err(|e| StitchError::other(format!("Failed to serialise PDF: {e}")))?;
        Ok(bytes)
    }

    fn prepare(&self, doc: &mut Document) {
        if self.options.optimize {
            doc.prune_objects();
            doc.renumber_objects();
        }
        if self.options.compress {
            doc.compress();
        }
    }

    fn write_file(&self, doc: &mut Document, write_path: &Path) -> Result<()> {
        let file =
            std::fs::File::create(write_path).map_err(|e| StitchError::FailedToCreateOutput {
                path: write_path.to_path_buf(),
                source: e,
            })?;

        let mut writer = std::io::BufWriter::with_capacity(self.options.buffer_size, file);

        doc.save_to(&mut writer)
            .map_err(|e| StitchError::FailedToWrite {
                path: write_path.to_path_buf(),
                source: std::io::Error::other(e),
            })?;

        writer.flush().map_err(|e| StitchError::FailedToWrite {
            path: write_path.to_path_buf(),
            source: e,
        })
    }
}

/// Sibling temp file used for atomic writes: `out.pdf` -> `out.pdf.tmp`.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}

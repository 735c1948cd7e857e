//! Error types for pdfstitch.
//!
//! Errors fall into a few families:
//!
//! - **Input errors**: a source file is missing, unreadable or cannot be converted.
//!   These are per-file and recoverable; import skips the file and keeps going.
//! - **Merge errors**: assembling or writing the output failed. A merge either
//!   succeeds completely or reports one of these.
//! - **Editing errors**: an operation addressed an item that does not exist, or
//!   was attempted while a drag is still in progress.

use std::io;
use std::path::PathBuf;

/// Result type alias for pdfstitch operations.
pub type Result<T> = std::result::Result<T, StitchError>;

/// Main error type for pdfstitch operations.
#[derive(Debug, thiserror::Error)]
pub enum StitchError {
    /// Input file was not found.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Failed to load a PDF file.
    #[error("Failed to load PDF: {}\n  Reason: {reason}", path.display())]
    FailedToLoadPdf {
        /// Path to the PDF file.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// PDF file has a structure we cannot work with.
    #[error("Corrupted or invalid PDF: {}\n  Details: {details}", path.display())]
    CorruptedPdf {
        /// Path to the corrupted PDF.
        path: PathBuf,
        /// Details about the corruption.
        details: String,
    },

    /// Conversion of a non-PDF source failed.
    #[error("Failed to convert {} to PDF\n  Reason: {reason}", path.display())]
    ConversionFailed {
        /// Source file that was being converted.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// No converter knows how to handle this file type.
    #[error("Unsupported file type: {}", path.display())]
    UnsupportedFormat {
        /// Source file with the unsupported extension.
        path: PathBuf,
    },

    /// The page list is empty.
    #[error("No pages to merge")]
    NoPagesToMerge,

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  Use --force to overwrite or choose a different output path",
        path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to create output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Rotation is not a multiple of 90 degrees.
    #[error("Invalid rotation: {degrees}. Must be a multiple of 90 degrees")]
    InvalidRotation {
        /// Requested rotation.
        degrees: i64,
    },

    /// An item index does not exist in the current view.
    #[error("Item {index} does not exist (list has {len} item(s))")]
    IndexOutOfRange {
        /// Requested zero-based index.
        index: usize,
        /// Number of items in the addressed view.
        len: usize,
    },

    /// A drag must be finished or cancelled first.
    #[error("A drag is in progress; finish or cancel it first")]
    DragInProgress,

    /// Merge operation failed.
    #[error("Merge operation failed: {reason}")]
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// User cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<lopdf::Error> for StitchError {
    fn from(err: lopdf::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl From<image::ImageError> for StitchError {
    fn from(err: image::ImageError) -> Self {
        Self::other(err.to_string())
    }
}

impl StitchError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a FailedToLoadPdf error.
    pub fn failed_to_load_pdf(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::FailedToLoadPdf {
            path,
            reason: reason.into(),
        }
    }

    /// Create a CorruptedPdf error.
    pub fn corrupted_pdf(path: PathBuf, details: impl Into<String>) -> Self {
        Self::CorruptedPdf {
            path,
            details: details.into(),
        }
    }

    /// Create a ConversionFailed error.
    pub fn conversion_failed(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::ConversionFailed {
            path,
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedFormat error.
    pub fn unsupported_format(path: PathBuf) -> Self {
        Self::UnsupportedFormat { path }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create an IndexOutOfRange error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error only affects a single input file.
    ///
    /// Import skips files that fail with a recoverable error and carries on
    /// with the rest of the batch.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. }
                | Self::FailedToLoadPdf { .. }
                | Self::CorruptedPdf { .. }
                | Self::ConversionFailed { .. }
                | Self::UnsupportedFormat { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::FailedToLoadPdf { .. } => 3,
            Self::CorruptedPdf { .. } => 3,
            Self::ConversionFailed { .. } => 3,
            Self::UnsupportedFormat { .. } => 3,
            Self::NoPagesToMerge => 1,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::InvalidRotation { .. } => 1,
            Self::IndexOutOfRange { .. } => 1,
            Self::DragInProgress => 1,
            Self::MergeFailed { .. } => 6,
            Self::InvalidConfig { .. } => 1,
            Self::Cancelled => 130, // Standard exit code for SIGINT
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}

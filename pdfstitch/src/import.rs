//! Importing source files into page references.
//!
//! Non-PDF sources go through a [`Converter`] first. Each resulting PDF is
//! inspected for its page count and per-page orientation and turned into one
//! [`PageRef`] per page.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::convert::{Converter, SourceKind};
use crate::error::{Result, StitchError};
use crate::io::PdfReader;
use crate::model::PageRef;

/// A file that could not be imported.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of importing a batch of files.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Imported pages, in input order.
    pub pages: Vec<PageRef>,

    /// Files that contributed no pages.
    pub skipped: Vec<SkippedFile>,

    /// Number of files that were imported.
    pub imported_files: usize,

    pub elapsed: Duration,
}

impl ImportReport {
    /// Whether every file was imported.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(&mut self, path: &Path, reason: String) {
        warn!(path = %path.display(), %reason, "skipping file");
        self.skipped.push(SkippedFile {
            path: path.to_path_buf(),
            reason,
        });
    }
}

/// Turns source files into page references.
#[derive(Clone)]
pub struct Importer {
    converter: Arc<dyn Converter>,
    reader: PdfReader,
    jobs: usize,
}

impl Importer {
    /// Create an importer running up to `jobs` files at once.
    pub fn new(converter: Arc<dyn Converter>, jobs: usize) -> Self {
        Self {
            converter,
            reader: PdfReader::new(),
            jobs: jobs.max(1),
        }
    }

    pub fn converter(&self) -> &Arc<dyn Converter> {
        &self.converter
    }

    /// Import one file.
    ///
    /// # Errors
    ///
    /// Returns an error if conversion fails, the converted file is missing,
    /// or the resulting PDF cannot be read.
    pub fn import_file(&self, path: &Path) -> Result<Vec<PageRef>> {
        let pdf_path = if SourceKind::of(path) == SourceKind::Pdf {
            path.to_path_buf()
        } else {
            let converted = self.converter.convert(path, false)?;
            if !converted.exists() {
                return Err(StitchError::conversion_failed(
                    path.to_path_buf(),
                    format!("converter output {} does not exist", converted.display()),
                ));
            }
            converted
        };

        let info = self.reader.pdf_info(&pdf_path)?;
        debug!(
            source = %path.display(),
            pdf = %pdf_path.display(),
            pages = info.page_count,
            "imported file"
        );

        Ok(info
            .pages
            .iter()
            .enumerate()
            .map(|(index, page)| PageRef::new(path, &pdf_path, index, page.is_portrait))
            .collect())
    }

    /// Import many files concurrently, keeping input order.
    ///
    /// Failures are logged and collected in [`ImportReport::skipped`]; they
    /// never abort the batch.
    pub async fn import_all(&self, paths: &[PathBuf]) -> ImportReport {
        use futures::stream::{self, StreamExt};

        let start = Instant::now();

        let tasks = paths.iter().enumerate().map(|(idx, path)| {
            let importer = self.clone();
            let path = path.clone();
            async move {
                let result = tokio::task::spawn_blocking(move || importer.import_file(&path))
                    .await
                    .unwrap_or_else(|e| Err(StitchError::other(format!("Import task failed: {e}"))));
                (idx, result)
            }
        });

        let mut indexed_results: Vec<(usize, Result<Vec<PageRef>>)> = stream::iter(tasks)
            .buffer_unordered(self.jobs)
            .collect()
            .await;
        indexed_results.sort_by_key(|(idx, _)| *idx);

        let mut report = ImportReport::default();
        for (idx, result) in indexed_results {
            let path = &paths[idx];
            match result {
                Ok(pages) if pages.is_empty() => {
                    report.skip(path, "file has no pages".to_string());
                }
                Ok(pages) => {
                    report.imported_files += 1;
                    report.pages.extend(pages);
                }
                Err(e) => report.skip(path, e.to_string()),
            }
        }
        report.elapsed = start.elapsed();
        report
    }
}

impl std::fmt::Debug for Importer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Importer")
            .field("reader", &self.reader)
            .field("jobs", &self.jobs)
            .finish_non_exhaustive()
    }
}

//! Core merge implementation.
//!
//! This module turns an ordered list of page references into one output
//! document. Each distinct source path is opened once per merge; pages are
//! copied in list order with their rotation applied.

use lopdf::Document;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{CompressionLevel, DocumentInfo};
use crate::error::{Result, StitchError};
use crate::io::{LoadedPdf, PdfReader, PdfWriter};
use crate::merge::metadata::MetadataManager;
use crate::merge::pages::PageCopier;
use crate::model::PageRef;
use crate::utils::format_file_size;

/// Statistics about a merge operation.
#[derive(Debug, Clone, Default)]
pub struct MergeStatistics {
    /// Number of distinct source files opened.
    pub files_opened: usize,

    /// Number of pages in the merged document.
    pub total_pages: usize,

    /// Entries skipped because their page index was out of range.
    pub pages_skipped: usize,

    /// Time taken to assemble the document.
    pub merge_time: Duration,

    /// Size of the written file, when written to disk.
    pub output_size: Option<u64>,
}

impl MergeStatistics {
    /// Format output size as human-readable string.
    pub fn format_output_size(&self) -> Option<String> {
        self.output_size.map(format_file_size)
    }
}

/// Result of a merge operation.
pub struct MergeResult {
    /// The merged PDF document.
    pub document: Document,

    /// Statistics about the merge.
    pub statistics: MergeStatistics,
}

/// Assembles output documents from page references.
#[derive(Debug, Clone)]
pub struct Merger {
    reader: PdfReader,
    metadata_manager: MetadataManager,
    info: DocumentInfo,
    compression: CompressionLevel,
}

impl Merger {
    /// Create a new merger with default settings.
    pub fn new() -> Self {
        Self {
            reader: PdfReader::new(),
            metadata_manager: MetadataManager::new(),
            info: DocumentInfo::default(),
            compression: CompressionLevel::default(),
        }
    }

    /// Set the Info dictionary entries for merged documents.
    pub fn with_info(mut self, info: DocumentInfo) -> Self {
        self.info = info;
        self
    }

    /// Set the compression level used when serialising.
    pub fn with_compression(mut self, compression: CompressionLevel) -> Self {
        self.compression = compression;
        self
    }

    /// Build the merged document in memory.
    ///
    /// Entries whose page index is past the end of their source are
    /// skipped and counted in [`MergeStatistics::pages_skipped`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The list is empty, or every entry was skipped
    /// - A source file cannot be loaded
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfstitch::merge::Merger;
    /// # use pdfstitch::model::PageRef;
    /// # fn example(pages: Vec<PageRef>) -> Result<(), Box<dyn std::error::Error>> {
    /// let merger = Merger::new();
    /// let result = merger.merge_document(&pages)?;
    /// println!("Merged {} pages", result.statistics.total_pages);
    /// # Ok(())
    /// # }
    /// ```
    pub fn merge_document(&self, pages: &[PageRef]) -> Result<MergeResult> {
        if pages.is_empty() {
            return Err(StitchError::NoPagesToMerge);
        }

        let start = Instant::now();
        let mut sources: HashMap<&Path, LoadedPdf> = HashMap::new();
        let mut copier = PageCopier::new();
        let mut pages_skipped = 0;

        for page in pages {
            let source = match sources.entry(page.path.as_path()) {
                std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
                std::collections::hash_map::Entry::Vacant(entry) => {
                    let loaded = self.reader.load(&page.path)?;
                    debug!(
                        path = %loaded.path.display(),
                        pages = loaded.page_count(),
                        load_time_ms = loaded.load_time.as_millis() as u64,
                        "loaded source"
                    );
                    entry.insert(loaded)
                }
            };

            if !copier.copy_page(source, page.page_index, page.rotation)? {
                pages_skipped += 1;
                debug!(
                    path = %page.path.display(),
                    page_index = page.page_index,
                    page_count = source.page_count(),
                    "skipping out-of-range page"
                );
            }
        }

        if copier.page_count() == 0 {
            return Err(StitchError::NoPagesToMerge);
        }

        let mut document = copier.finish();
        self.metadata_manager.set_info(&mut document, &self.info);

        let statistics = MergeStatistics {
            files_opened: sources.len(),
            total_pages: document.get_pages().len(),
            pages_skipped,
            merge_time: start.elapsed(),
            output_size: None,
        };

        Ok(MergeResult {
            document,
            statistics,
        })
    }

    /// Merge and write atomically to `path`.
    ///
    /// The work runs on a blocking task. On any failure the target path is
    /// left as it was.
    pub async fn merge_to_path(&self, pages: &[PageRef], path: &Path) -> Result<MergeStatistics> {
        let merger = self.clone();
        let pages = pages.to_vec();
        let path: PathBuf = path.to_path_buf();

        tokio::task::spawn_blocking(move || merger.merge_to_path_blocking(&pages, &path))
            .await
            .map_err(|e| StitchError::merge_failed(format!("Merge task failed: {e}")))?
    }

    fn merge_to_path_blocking(&self, pages: &[PageRef], path: &Path) -> Result<MergeStatistics> {
        let MergeResult {
            document,
            mut statistics,
        } = self.merge_document(pages)?;

        let written = PdfWriter::for_compression(self.compression).save_blocking(document, path)?;
        statistics.output_size = Some(written.file_size);

        info!(
            path = %path.display(),
            pages = statistics.total_pages,
            skipped = statistics.pages_skipped,
            size = %written.format_file_size(),
            "merged document written"
        );
        Ok(statistics)
    }

    /// Merge into an in-memory PDF for previewing.
    ///
    /// Failures are logged and yield `None`.
    pub fn merge_to_bytes(&self, pages: &[PageRef]) -> Option<Vec<u8>> {
        let result = self.merge_document(pages).and_then(|merged| {
            PdfWriter::for_compression(self.compression).to_bytes(merged.document)
        });

        match result {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "preview merge failed");
                None
            }
        }
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}

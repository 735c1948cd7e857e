//! PDF reading and inspection.
//!
//! This module provides:
//! - Loading a document with errors mapped to per-file failures
//! - Page geometry lookups that follow inherited page attributes
//! - A lightweight `pdf_info` summary used at import time
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::io::reader::PdfReader;
//! use std::path::Path;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = PdfReader::new();
//! let info = reader.pdf_info(Path::new("a.pdf"))?;
//! println!("{} pages, first is portrait: {}", info.page_count, info.pages[0].is_portrait);
//! # Ok(())
//! # }
//! ```

use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{Result, StitchError};

/// Depth limit when walking `/Parent` chains.
const MAX_INHERITANCE_DEPTH: usize = 64;

/// A loaded PDF document with its page table.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Path to the source file.
    pub path: PathBuf,

    /// Page object ids in page order.
    pub pages: Vec<ObjectId>,

    /// Time taken to load the document.
    pub load_time: Duration,
}

impl LoadedPdf {
    fn new(document: Document, path: PathBuf, load_time: Duration) -> Self {
        let pages = document.get_pages().into_values().collect();
        Self {
            document,
            path,
            pages,
            load_time,
        }
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Object id of the page at zero-based `index`.
    pub fn page_id(&self, index: usize) -> Option<ObjectId> {
        self.pages.get(index).copied()
    }
}

/// Geometry of one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    /// MediaBox width in points (0 when unknown).
    pub width: f32,
    /// MediaBox height in points (0 when unknown).
    pub height: f32,
    /// Height at least as large as width. Defaults to true when the
    /// MediaBox cannot be read.
    pub is_portrait: bool,
}

impl PageInfo {
    fn unknown() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            is_portrait: true,
        }
    }
}

/// Page count plus per-page geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfInfo {
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
}

/// PDF reader that rejects documents without pages.
#[derive(Debug, Clone, Default)]
pub struct PdfReader;

impl PdfReader {
    pub fn new() -> Self {
        Self
    }

    /// Load a PDF document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File does not exist
    /// - File is not a valid PDF
    /// - PDF has no pages
    pub fn load(&self, path: &Path) -> Result<LoadedPdf> {
        if !path.exists() {
            return Err(StitchError::file_not_found(path.to_path_buf()));
        }

        let start = Instant::now();
        let document = Document::load(path)
            .map_err(|e| StitchError::failed_to_load_pdf(path.to_path_buf(), e.to_string()))?;

        let loaded = LoadedPdf::new(document, path.to_path_buf(), start.elapsed());
        if loaded.pages.is_empty() {
            return Err(StitchError::corrupted_pdf(
                path.to_path_buf(),
                "PDF has no pages",
            ));
        }

        Ok(loaded)
    }

    /// Page count and per-page orientation of a PDF.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded.
    pub fn pdf_info(&self, path: &Path) -> Result<PdfInfo> {
        let loaded = self.load(path)?;
        let pages: Vec<PageInfo> = loaded
            .pages
            .iter()
            .map(|&id| page_info(&loaded.document, id))
            .collect();

        Ok(PdfInfo {
            page_count: pages.len(),
            pages,
        })
    }
}

/// Geometry of the page `page_id`, following inherited MediaBox entries.
pub fn page_info(doc: &Document, page_id: ObjectId) -> PageInfo {
    let Some(media_box) = inherited_attribute(doc, page_id, b"MediaBox") else {
        return PageInfo::unknown();
    };
    let Some([x0, y0, x1, y1]) = rect_values(doc, resolve(doc, &media_box)) else {
        return PageInfo::unknown();
    };

    let width = (x1 - x0).abs();
    let height = (y1 - y0).abs();
    PageInfo {
        width,
        height,
        is_portrait: height >= width,
    }
}

/// Look up `key` on the page or, failing that, on its ancestors.
///
/// The value is returned as stored, so an indirect reference stays a
/// reference.
pub fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut dict = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_INHERITANCE_DEPTH {
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        dict = parent_of(doc, dict)?;
    }

    None
}

fn parent_of<'a>(doc: &'a Document, dict: &Dictionary) -> Option<&'a Dictionary> {
    let parent_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
    doc.get_dictionary(parent_id).ok()
}

/// Follow a reference to its target, or return the object itself.
pub fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn rect_values(doc: &Document, object: &Object) -> Option<[f32; 4]> {
    let array = object.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut values = [0.0; 4];
    for (slot, value) in values.iter_mut().zip(array) {
        *slot = number(resolve(doc, value))?;
    }
    Some(values)
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

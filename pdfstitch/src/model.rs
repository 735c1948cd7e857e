//! The page reference model.
//!
//! A [`PageRef`] is one page destined for the output document. The document
//! list is an ordered `Vec<PageRef>`; every view of it (pages, files) is
//! derived from that one vector.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, StitchError};

/// Stable identity of a page reference.
///
/// Assigned once at import and never changed, no matter how the page is
/// moved, rotated or restored through undo/redo.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Generate a fresh id of the form `{filename}_{page_index}_{8 hex digits}`.
    pub fn generate(filename: &str, page_index: usize) -> Self {
        Self(format!(
            "{filename}_{page_index}_{:08x}",
            rand::random::<u32>()
        ))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Clockwise rotation applied to a page at merge time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(into = "u16")]
pub enum Rotation {
    /// Upright.
    #[default]
    None,
    /// Rotate 90 degrees clockwise.
    Clockwise90,
    /// Rotate 180 degrees.
    Rotate180,
    /// Rotate 270 degrees clockwise (90 counter-clockwise).
    Clockwise270,
}

impl Rotation {
    /// Parse a rotation from degrees.
    ///
    /// Any multiple of 90 is accepted and normalised into `0..360`, so
    /// `-90` and `450` are both valid.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::InvalidRotation`] if `degrees` is not a
    /// multiple of 90.
    pub fn from_degrees(degrees: i64) -> Result<Self> {
        if degrees % 90 != 0 {
            return Err(StitchError::InvalidRotation { degrees });
        }
        Ok(match degrees.rem_euclid(360) {
            0 => Self::None,
            90 => Self::Clockwise90,
            180 => Self::Rotate180,
            _ => Self::Clockwise270,
        })
    }

    /// Get rotation as degrees.
    pub fn degrees(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Clockwise90 => 90,
            Self::Rotate180 => 180,
            Self::Clockwise270 => 270,
        }
    }

    /// The rotation after turning another 90 degrees clockwise.
    pub fn rotated_clockwise(self) -> Self {
        match self {
            Self::None => Self::Clockwise90,
            Self::Clockwise90 => Self::Rotate180,
            Self::Rotate180 => Self::Clockwise270,
            Self::Clockwise270 => Self::None,
        }
    }

    /// Whether this rotation swaps the page's width and height.
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Self::Clockwise90 | Self::Clockwise270)
    }
}

impl From<Rotation> for u16 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Page orientation as currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Height at least as large as width.
    Portrait,
    /// Width larger than height.
    Landscape,
}

/// How the document list is addressed by editing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// One item per page.
    Page,
    /// One item per run of consecutive pages from the same file.
    #[default]
    File,
}

impl ViewMode {
    /// The other view mode.
    pub fn toggled(self) -> Self {
        match self {
            Self::Page => Self::File,
            Self::File => Self::Page,
        }
    }
}

impl std::str::FromStr for ViewMode {
    type Err = StitchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "page" | "pages" => Ok(Self::Page),
            "file" | "files" => Ok(Self::File),
            _ => Err(StitchError::invalid_config(format!(
                "Invalid view mode: {s}. Must be one of: page, file"
            ))),
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page => f.write_str("page"),
            Self::File => f.write_str("file"),
        }
    }
}

/// One page destined for the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRef {
    /// Stable identity, see [`PageId`].
    pub id: PageId,

    /// PDF currently backing this page. May be a converted file.
    pub path: PathBuf,

    /// The file the user picked.
    pub original_source_path: PathBuf,

    /// Whether `path` was produced by conversion.
    pub is_generated: bool,

    /// Display name, taken from the original source path.
    pub filename: String,

    /// Zero-based page index into `path`.
    pub page_index: usize,

    /// Rotation applied at merge time.
    pub rotation: Rotation,

    /// Orientation of page `page_index` of `path` at rotation 0. Refreshed
    /// from the new file whenever the page is reconverted.
    pub is_portrait_original: bool,

    /// Whether `path` came from a conversion that asked for landscape.
    /// Converters may ignore the request (images keep their shape), so
    /// this says nothing about the page geometry.
    pub is_landscape_generated: bool,
}

impl PageRef {
    /// Create a page reference for page `page_index` of `pdf_path`.
    ///
    /// `source_path` is the file the user picked; it differs from `pdf_path`
    /// when the page came out of a conversion.
    pub fn new(
        source_path: &Path,
        pdf_path: &Path,
        page_index: usize,
        is_portrait_original: bool,
    ) -> Self {
        let filename = display_name(source_path);
        Self {
            id: PageId::generate(&filename, page_index),
            path: pdf_path.to_path_buf(),
            original_source_path: source_path.to_path_buf(),
            is_generated: pdf_path != source_path,
            filename,
            page_index,
            rotation: Rotation::None,
            is_portrait_original,
            is_landscape_generated: false,
        }
    }

    /// Turn the page another 90 degrees clockwise.
    pub fn rotate_clockwise(&mut self) {
        self.rotation = self.rotation.rotated_clockwise();
    }

    /// Orientation as it will appear in the output.
    pub fn orientation(&self) -> Orientation {
        if self.is_portrait_original != self.rotation.is_quarter_turn() {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        }
    }
}

/// The final path component as a display string.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

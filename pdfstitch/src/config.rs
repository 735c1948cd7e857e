//! Configuration module for pdfstitch.
//!
//! This module holds the validated configuration that drives an editing
//! session. It covers:
//! - Output handling (overwrite mode, compression, document info)
//! - Conversion settings (scratch directory, office command)
//! - Editor tunables (history depth, render resolutions, zoom, auto-scroll)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, StitchError};
use crate::model::ViewMode;

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// No compression - streams are written as they were copied.
    None,
    /// Compress uncompressed streams.
    #[default]
    Standard,
    /// Compress streams and drop unreferenced objects.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = StitchError;

    /// Parse compression level from string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation: "none", "standard", or "maximum"
    ///
    /// # Errors
    ///
    /// Returns an error if the string doesn't match a valid compression level.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(StitchError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Info dictionary entries written to the merged document.
///
/// Title and author are always written, as empty strings when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Document title.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
}

impl DocumentInfo {
    /// Create document info from optional strings, trimming whitespace.
    pub fn new(title: Option<String>, author: Option<String>) -> Self {
        let trimmed = |opt: Option<String>| {
            opt.filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
        };

        Self {
            title: trimmed(title),
            author: trimmed(author),
        }
    }

    /// Title to write, empty when unset.
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    /// Author to write, empty when unset.
    pub fn author_or_empty(&self) -> &str {
        self.author.as_deref().unwrap_or("")
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

/// Edge auto-scroll parameters used while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScrollSettings {
    /// Distance from the viewport edge, in pixels, that arms the timer.
    pub margin: f32,
    /// Delay between scroll steps.
    pub interval: Duration,
    /// Scroll distance per step.
    pub step: f32,
}

impl Default for AutoScrollSettings {
    fn default() -> Self {
        Self {
            margin: 50.0,
            interval: Duration::from_millis(20),
            step: 20.0,
        }
    }
}

/// Zoom limits for the thumbnail grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomSettings {
    /// Smallest zoom factor.
    pub min: f32,
    /// Largest zoom factor.
    pub max: f32,
    /// Increment for one zoom step.
    pub step: f32,
}

impl ZoomSettings {
    /// Clamp a zoom factor into range.
    pub fn clamp(&self, zoom: f32) -> f32 {
        zoom.clamp(self.min, self.max)
    }

    /// One step in.
    pub fn zoom_in(&self, zoom: f32) -> f32 {
        self.clamp(zoom + self.step)
    }

    /// One step out.
    pub fn zoom_out(&self, zoom: f32) -> f32 {
        self.clamp(zoom - self.step)
    }
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            min: 0.4,
            max: 3.0,
            step: 0.2,
        }
    }
}

/// Tunables for the interactive editor.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSettings {
    /// Maximum undo depth (None = unbounded).
    pub history_limit: Option<usize>,
    /// Render resolution for thumbnails.
    pub thumbnail_dpi: u32,
    /// Render resolution for the preview window.
    pub preview_dpi: u32,
    /// Thumbnail width at zoom 1.0, in pixels.
    pub base_thumb_size: u32,
    /// Height-to-width ratio of a thumbnail cell.
    pub thumb_aspect: f32,
    /// Padding between a thumbnail cell and the image inside it.
    pub thumb_inset: u32,
    /// Zoom limits.
    pub zoom: ZoomSettings,
    /// Drag auto-scroll parameters.
    pub auto_scroll: AutoScrollSettings,
    /// Maximum cached thumbnails (None = unbounded).
    pub thumbnail_cache_capacity: Option<usize>,
}

impl EditorSettings {
    /// Thumbnail cell width for a zoom factor.
    pub fn thumb_width(&self, zoom: f32) -> u32 {
        (self.base_thumb_size as f32 * self.zoom.clamp(zoom)).round() as u32
    }

    /// Thumbnail cell height for a cell width.
    pub fn thumb_height(&self, width: u32) -> u32 {
        (width as f32 * self.thumb_aspect).round() as u32
    }
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            history_limit: None,
            thumbnail_dpi: 72,
            preview_dpi: 150,
            base_thumb_size: 200,
            thumb_aspect: 1.414,
            thumb_inset: 10,
            zoom: ZoomSettings::default(),
            auto_scroll: AutoScrollSettings::default(),
            thumbnail_cache_capacity: None,
        }
    }
}

/// Complete configuration for an editing session.
///
/// This structure contains all settings needed to run a session,
/// derived and validated from CLI arguments.
#[derive(Debug, Clone)]
pub struct Config {
    /// Files to import at startup, in order.
    pub inputs: Vec<PathBuf>,

    /// Where to save the merged document at the end of the session.
    pub output: Option<PathBuf>,

    /// Shell script to run (`-` for stdin).
    pub script: Option<PathBuf>,

    /// Initial view mode.
    pub view_mode: ViewMode,

    /// Verbose output mode.
    pub verbose: bool,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// Compression level for output.
    pub compression: CompressionLevel,

    /// Info dictionary for the output document.
    pub info: DocumentInfo,

    /// Number of parallel import jobs (None = auto-detect).
    pub jobs: Option<usize>,

    /// Directory for converted files (None = system temp dir).
    pub temp_dir: Option<PathBuf>,

    /// Office converter executable.
    pub office_command: String,

    /// Editor tunables.
    pub editor: EditorSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: None,
            script: None,
            view_mode: ViewMode::default(),
            verbose: false,
            overwrite_mode: OverwriteMode::default(),
            quiet: false,
            compression: CompressionLevel::default(),
            info: DocumentInfo::default(),
            jobs: None,
            temp_dir: None,
            office_command: "soffice".to_string(),
            editor: EditorSettings::default(),
        }
    }
}

impl Config {
    /// Returns a reference to inputs.
    pub fn inputs(&self) -> &[PathBuf] {
        self.inputs.as_ref()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Neither input files nor a script are given
    /// - Verbose and quiet modes are both enabled
    /// - Jobs count is zero
    /// - The output path is also an input
    /// - The history limit is zero
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() && self.script.is_none() {
            return Err(StitchError::invalid_config(
                "No input files specified (pass files or a --script)",
            ));
        }

        if self.verbose && self.quiet {
            return Err(StitchError::invalid_config(
                "Cannot use both --verbose and --quiet",
            ));
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            return Err(StitchError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        if let Some(output) = &self.output
            && self.inputs.iter().any(|input| input == output)
        {
            return Err(StitchError::invalid_config(format!(
                "Output file cannot be the same as an input file: {}",
                output.display()
            )));
        }

        if self.editor.history_limit == Some(0) {
            return Err(StitchError::invalid_config(
                "History limit must be at least 1",
            ));
        }

        if self.office_command.trim().is_empty() {
            return Err(StitchError::invalid_config("Office command cannot be empty"));
        }

        Ok(())
    }

    /// Get the effective number of parallel jobs.
    ///
    /// Returns the configured job count, or the number of CPU cores if auto-detect.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Directory converted files are written to.
    pub fn conversion_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Check if non-error output should be displayed.
    pub fn should_print(&self) -> bool {
        !self.quiet
    }
}

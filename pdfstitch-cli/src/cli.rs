//! CLI argument parsing for pdfstitch.
//!
//! This module defines the command-line interface structure using `clap`.
//! It is also compiled by the build script to render the man page, so it
//! only depends on `clap` and the library.

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use pdfstitch::config::{CompressionLevel, Config, DocumentInfo, EditorSettings, OverwriteMode};
use pdfstitch::error::{Result, StitchError};
use pdfstitch::model::ViewMode;
use pdfstitch::utils::collect_paths_for_patterns;

/// Assemble one PDF from pages of many source files.
///
/// pdfstitch imports PDFs, images, text files and office documents as an
/// editable list of pages. Pages and whole files can be reordered, rotated,
/// deleted and switched between portrait and landscape, with undo and redo,
/// before the result is merged into a single PDF.
#[derive(Parser, Debug)]
#[command(name = "pdfstitch")]
#[command(version)]
#[command(about = "Assemble one PDF from pages of many source files", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Files to import at startup, in order
    ///
    /// Glob patterns are expanded. Non-PDF files (images, text, office
    /// documents) are converted first.
    ///
    /// Examples:
    ///   pdfstitch cover.png chapter*.pdf notes.txt -o book.pdf
    #[arg(value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Save the merged document here when the session ends
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Run editing commands from a file ('-' reads stdin)
    ///
    /// One command per line, e.g. `move 3 1`, `rotate 2`, `undo`.
    /// Lines starting with '#' are ignored. Run `help` for the list.
    #[arg(short, long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Initial view: one item per page, or one per file run
    #[arg(long, value_name = "MODE", default_value = "file")]
    #[arg(value_parser = ["page", "file"])]
    pub view: String,

    /// Show debug output
    #[arg(short, long)]
    pub verbose: bool,

    /// Force overwrite of existing output file without confirmation
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite existing output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Compression level for output PDF
    ///
    /// - none: streams are written as copied
    /// - standard: compress uncompressed streams (default)
    /// - maximum: also drop unreferenced objects
    #[arg(short, long, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: String,

    /// Title written to the output document
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Author written to the output document
    #[arg(long, value_name = "TEXT")]
    pub author: Option<String>,

    /// Number of files imported in parallel
    ///
    /// Default is number of CPU cores.
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Directory for converted files
    #[arg(long, value_name = "DIR", env = "PDFSTITCH_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Office converter executable used for doc/xls/ppt/od* files
    #[arg(long, value_name = "CMD", env = "PDFSTITCH_OFFICE", default_value = "soffice")]
    pub office_command: String,

    /// Maximum number of undo steps kept
    #[arg(long, value_name = "N")]
    pub history_limit: Option<usize>,
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// Glob patterns in the inputs are expanded here.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Compression level or view mode is invalid
    /// - A glob pattern is malformed
    /// - Configuration validation fails
    pub fn to_config(&self) -> Result<Config> {
        let compression = CompressionLevel::from_str(&self.compression)?;
        let view_mode = ViewMode::from_str(&self.view)?;

        let overwrite_mode = if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };

        let config = Config {
            inputs: collect_paths_for_patterns(&self.inputs)?,
            output: self.output.clone(),
            script: self.script.clone(),
            view_mode,
            verbose: self.verbose,
            overwrite_mode,
            quiet: self.quiet,
            compression,
            info: DocumentInfo::new(self.title.clone(), self.author.clone()),
            jobs: self.jobs,
            temp_dir: self.temp_dir.clone(),
            office_command: self.office_command.clone(),
            editor: EditorSettings {
                history_limit: self.history_limit,
                ..EditorSettings::default()
            },
        };

        config.validate().map_err(|e| {
            StitchError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }
}

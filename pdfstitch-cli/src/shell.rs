//! Line-oriented editing shell.
//!
//! Each line is parsed as one command with a multicall `clap` parser. Item
//! numbers are 1-based and address the current view (pages or files).

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use pdfstitch::config::OverwriteMode;
use pdfstitch::error::StitchError;
use pdfstitch::model::ViewMode;
use pdfstitch::output::{
    OutputFormatter, display_import_report, display_listing, display_merge_statistics,
    listing_json,
};
use pdfstitch::session::{OrientationOutcome, Session};
use pdfstitch::utils::{collect_paths_for_patterns, format_file_size};

#[derive(Parser, Debug)]
#[command(multicall = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
enum ShellCommand {
    /// Import files (glob patterns allowed) at the end of the list
    Add {
        #[arg(required = true, value_name = "FILE")]
        patterns: Vec<String>,
    },
    /// Show the items of the current view
    #[command(alias = "ls")]
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Delete item N (a whole file run in file view)
    #[command(alias = "rm")]
    Delete { number: usize },
    /// Rotate item N by 90 degrees clockwise
    Rotate { number: usize },
    /// Rotate every page by 90 degrees clockwise
    RotateAll,
    /// Switch item N between portrait and landscape
    Orient { number: usize },
    /// Move item FROM to position TO
    #[command(alias = "mv")]
    Move { from: usize, to: usize },
    /// Undo the last change
    Undo,
    /// Redo the last undone change
    Redo,
    /// Show or set the view mode (page or file)
    View {
        #[arg(value_parser = ["page", "pages", "file", "files"])]
        mode: Option<String>,
    },
    /// Build the merged document in memory
    Preview {
        /// Also write the preview to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Merge and save to PATH
    Save { path: PathBuf },
    /// Stop reading commands
    #[command(alias = "exit")]
    Quit,
}

/// Whether the shell should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Command interpreter bound to one session.
pub struct Shell<'a> {
    session: &'a mut Session,
    formatter: &'a OutputFormatter,
    overwrite_mode: OverwriteMode,
    failures: usize,
}

impl<'a> Shell<'a> {
    pub fn new(
        session: &'a mut Session,
        formatter: &'a OutputFormatter,
        overwrite_mode: OverwriteMode,
    ) -> Self {
        Self {
            session,
            formatter,
            overwrite_mode,
            failures: 0,
        }
    }

    /// Number of commands that failed so far.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Run commands from `reader` until it ends or `quit` is read.
    ///
    /// A failing command is reported and does not stop the run.
    pub async fn run<R>(&mut self, reader: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut line_number = 0;
        while let Some(line) = lines.next_line().await.context("failed to read command")? {
            line_number += 1;
            match self.execute(&line).await {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    self.failures += 1;
                    self.formatter.error(&format!("line {line_number}: {e:#}"));
                }
            }
        }
        debug!(lines = line_number, failures = self.failures, "script finished");
        Ok(())
    }

    /// Execute one command line. Blank lines and `#` comments do nothing.
    pub async fn execute(&mut self, line: &str) -> Result<Flow> {
        let words = split_words(line)?;
        if words.is_empty() || words[0].starts_with('#') {
            return Ok(Flow::Continue);
        }

        let parsed = match ShellLine::try_parse_from(&words) {
            Ok(parsed) => parsed,
            Err(e) if matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
            {
                self.formatter.raw(&e.to_string());
                return Ok(Flow::Continue);
            }
            Err(e) => return Err(anyhow!(e.to_string().trim().to_string())),
        };

        debug!(command = ?parsed.command, "executing shell command");
        self.dispatch(parsed.command).await
    }

    async fn dispatch(&mut self, command: ShellCommand) -> Result<Flow> {
        match command {
            ShellCommand::Add { patterns } => {
                let paths = collect_paths_for_patterns(&patterns)?;
                let report = self.session.add_files(&paths).await?;
                display_import_report(self.formatter, &report);
            }
            ShellCommand::List { json } => {
                if json {
                    let value = listing_json(self.session);
                    self.formatter.raw(&serde_json::to_string_pretty(&value)?);
                } else {
                    display_listing(self.formatter, self.session);
                }
            }
            ShellCommand::Delete { number } => {
                let target = self.session.target(to_index(number)?);
                let removed = self.session.delete(target)?;
                self.formatter.info(&format!("Deleted {removed} page(s)"));
            }
            ShellCommand::Rotate { number } => {
                let target = self.session.target(to_index(number)?);
                self.session.rotate(target)?;
            }
            ShellCommand::RotateAll => self.session.rotate_all()?,
            ShellCommand::Orient { number } => {
                let target = self.session.target(to_index(number)?);
                match self.session.toggle_orientation(target)? {
                    OrientationOutcome::Reconverted => {
                        self.formatter.info("Converted again with the other orientation")
                    }
                    OrientationOutcome::Rotated => self.formatter.info("Rotated 90°"),
                }
            }
            ShellCommand::Move { from, to } => {
                self.session.move_item(to_index(from)?, to_index(to)?)?;
            }
            ShellCommand::Undo => {
                if !self.session.undo()? {
                    self.formatter.info("Nothing to undo");
                }
            }
            ShellCommand::Redo => {
                if !self.session.redo()? {
                    self.formatter.info("Nothing to redo");
                }
            }
            ShellCommand::View { mode } => {
                if let Some(mode) = mode {
                    self.session.set_view_mode(mode.parse::<ViewMode>()?)?;
                }
                self.formatter
                    .info(&format!("View: {}", self.session.view_mode()));
            }
            ShellCommand::Preview { output } => {
                let Some(bytes) = self.session.preview() else {
                    self.formatter.warning("Preview unavailable");
                    return Ok(Flow::Continue);
                };
                self.formatter.info(&format!(
                    "Preview: {} pages, {}",
                    self.session.page_count(),
                    format_file_size(bytes.len() as u64)
                ));
                if let Some(output) = output {
                    tokio::fs::write(&output, &bytes)
                        .await
                        .with_context(|| format!("failed to write {}", output.display()))?;
                }
            }
            ShellCommand::Save { path } => {
                confirm_overwrite(&path, self.overwrite_mode, self.formatter)?;
                let stats = self.session.merge_to_path(&path).await?;
                display_merge_statistics(self.formatter, &stats, &path);
            }
            ShellCommand::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }
}

fn to_index(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .ok_or_else(|| anyhow!("item numbers start at 1"))
}

/// Split a command line into words. Single and double quotes group words.
///
/// Outside single quotes a backslash escapes a following quote, backslash
/// or (unquoted) whitespace. Any other backslash is kept, so Windows paths
/// such as `"C:\docs\a.pdf"` survive intact.
fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('\''), c) => current.push(c),
            (_, '\\') => {
                match chars.peek() {
                    Some(&next)
                        if matches!(next, '"' | '\'' | '\\')
                            || (quote.is_none() && next.is_whitespace()) =>
                    {
                        current.push(next);
                        chars.next();
                    }
                    _ => current.push('\\'),
                }
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        bail!("unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Decide whether `path` may be written under `mode`, prompting if needed.
pub fn confirm_overwrite(
    path: &Path,
    mode: OverwriteMode,
    formatter: &OutputFormatter,
) -> Result<(), StitchError> {
    if !path.exists() {
        return Ok(());
    }

    match mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(StitchError::output_exists(path.to_path_buf())),
        OverwriteMode::Prompt => {
            // Nobody to ask in quiet mode.
            if formatter.is_quiet() {
                return Err(StitchError::output_exists(path.to_path_buf()));
            }

            formatter.warning(&format!("Output file already exists: {}", path.display()));

            use std::io::{self, Write};
            print!("Overwrite? [y/N]: ");
            io::stdout().flush().ok();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .map_err(|err| StitchError::other(format!("Failed to read input: {err}")))?;

            match response.trim().to_lowercase().as_str() {
                "y" | "yes" => Ok(()),
                _ => Err(StitchError::Cancelled),
            }
        }
    }
}

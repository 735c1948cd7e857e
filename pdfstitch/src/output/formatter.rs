//! Message formatting and display.
//!
//! Regular messages go to stdout, warnings and errors to stderr. Quiet mode
//! keeps only warnings and errors; verbose mode adds debug lines.
//!
//! # Examples
//!
//! ```
//! use pdfstitch::output::formatter::OutputFormatter;
//!
//! let formatter = OutputFormatter::new(false, false);
//! formatter.info("Importing 3 files...");
//! formatter.success("Saved merged.pdf");
//! formatter.warning("Skipped bundle.zip: unsupported format");
//! ```

use crate::config::Config;
use std::io::{self, IsTerminal, Write};

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
    Debug,
}

impl MessageLevel {
    fn decoration(self) -> (&'static str, &'static str) {
        match self {
            Self::Info => ("", ""),
            Self::Success => ("✓ ", "\x1b[32m"),
            Self::Warning => ("⚠ ", "\x1b[33m"),
            Self::Error => ("✗ ", "\x1b[31m"),
            Self::Debug => ("→ ", "\x1b[36m"),
        }
    }

    fn to_stderr(self) -> bool {
        matches!(self, Self::Warning | Self::Error)
    }
}

/// Output formatter with configurable verbosity.
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    quiet: bool,
    verbose: bool,
    colored: bool,
}

impl OutputFormatter {
    /// Create a new output formatter.
    ///
    /// Colour is used when stdout is a terminal and `NO_COLOR` is unset.
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            colored: io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.quiet, config.verbose)
    }

    /// Create a quiet formatter (only warnings and errors).
    pub fn quiet() -> Self {
        Self::new(true, false)
    }

    pub fn verbose() -> Self {
        Self::new(false, true)
    }

    /// Force colour on or off.
    pub fn with_color(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    pub fn info(&self, message: &str) {
        self.emit(MessageLevel::Info, message);
    }

    pub fn success(&self, message: &str) {
        self.emit(MessageLevel::Success, message);
    }

    /// Shown even in quiet mode.
    pub fn warning(&self, message: &str) {
        self.emit(MessageLevel::Warning, message);
    }

    /// Shown even in quiet mode.
    pub fn error(&self, message: &str) {
        self.emit(MessageLevel::Error, message);
    }

    /// Only shown in verbose mode.
    pub fn debug(&self, message: &str) {
        self.emit(MessageLevel::Debug, message);
    }

    /// Print a numbered list entry (1-based).
    pub fn list_item(&self, number: usize, message: &str) {
        if !self.quiet {
            println!("  {number:>3}. {message}");
        }
    }

    /// Print a line verbatim, regardless of verbosity.
    ///
    /// Used for machine-readable output such as JSON listings.
    pub fn raw(&self, line: &str) {
        println!("{line}");
    }

    /// Whether a message of `level` is shown.
    pub fn is_enabled(&self, level: MessageLevel) -> bool {
        match level {
            MessageLevel::Warning | MessageLevel::Error => true,
            MessageLevel::Debug => self.verbose && !self.quiet,
            MessageLevel::Info | MessageLevel::Success => !self.quiet,
        }
    }

    /// The decorated line for `message`, without a trailing newline.
    pub fn render(&self, level: MessageLevel, message: &str) -> String {
        let (prefix, color_code) = level.decoration();
        if self.colored && !color_code.is_empty() {
            format!("{color_code}{prefix}{message}\x1b[0m")
        } else {
            format!("{prefix}{message}")
        }
    }

    fn emit(&self, level: MessageLevel, message: &str) {
        if !self.is_enabled(level) {
            return;
        }
        let line = self.render(level, message);
        if level.to_stderr() {
            let _ = writeln!(io::stderr(), "{line}");
        } else {
            let _ = writeln!(io::stdout(), "{line}");
        }
    }

    pub fn should_print(&self) -> bool {
        !self.quiet
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

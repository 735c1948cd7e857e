//! Output formatting and display for pdfstitch.
//!
//! This module handles all user-facing output including:
//! - Formatted status messages
//! - Listings of the document in page or file view
//! - Import and merge summaries
//!
//! # Examples
//!
//! ```no_run
//! use pdfstitch::output::{OutputFormatter, display_listing};
//! use pdfstitch::session::Session;
//!
//! # fn example(session: &Session) {
//! let formatter = OutputFormatter::default();
//! display_listing(&formatter, session);
//! # }
//! ```

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use serde_json::{Value, json};
use std::path::Path;

use crate::grouping::Group;
use crate::import::ImportReport;
use crate::merge::MergeStatistics;
use crate::model::{Orientation, PageRef, Rotation, ViewMode};
use crate::session::Session;

fn orientation_label(orientation: Orientation) -> &'static str {
    match orientation {
        Orientation::Portrait => "portrait",
        Orientation::Landscape => "landscape",
    }
}

fn rotation_suffix(rotation: Rotation) -> String {
    match rotation {
        Rotation::None => String::new(),
        other => format!(", rotated {other}"),
    }
}

/// One-line description of a page.
pub fn describe_page(page: &PageRef) -> String {
    let converted = if page.is_generated { ", converted" } else { "" };
    format!(
        "{} p.{} ({}{}{})",
        page.filename,
        page.page_index + 1,
        orientation_label(page.orientation()),
        rotation_suffix(page.rotation),
        converted
    )
}

/// One-line description of a group.
pub fn describe_group(group: &Group<'_>) -> String {
    let count = group.page_count();
    let noun = if count == 1 { "page" } else { "pages" };
    format!(
        "{} ({count} {noun}, {}{})",
        group.filename(),
        orientation_label(group.orientation()),
        rotation_suffix(group.rotation())
    )
}

/// Print the items of the current view, numbered from 1.
pub fn display_listing(formatter: &OutputFormatter, session: &Session) {
    if session.is_empty() {
        formatter.info("(empty)");
        return;
    }

    match session.view_mode() {
        ViewMode::Page => {
            for (i, page) in session.pages().iter().enumerate() {
                formatter.list_item(i + 1, &describe_page(page));
            }
        }
        ViewMode::File => {
            for group in session.groups() {
                formatter.list_item(group.index + 1, &describe_group(&group));
            }
        }
    }
}

/// The current view as JSON.
pub fn listing_json(session: &Session) -> Value {
    let items: Vec<Value> = match session.view_mode() {
        ViewMode::Page => session
            .pages()
            .iter()
            .map(|page| json!(page))
            .collect(),
        ViewMode::File => session
            .groups()
            .iter()
            .map(|group| {
                json!({
                    "index": group.index,
                    "filename": group.filename(),
                    "path": group.path(),
                    "pages": group.page_count(),
                    "rotation": group.rotation(),
                    "orientation": group.orientation(),
                    "ids": group.ids(),
                })
            })
            .collect(),
    };

    json!({
        "view": session.view_mode().to_string(),
        "page_count": session.page_count(),
        "items": items,
    })
}

/// Report what an import added and what it skipped.
pub fn display_import_report(formatter: &OutputFormatter, report: &ImportReport) {
    for skipped in &report.skipped {
        formatter.warning(&format!(
            "Skipped {}: {}",
            skipped.path.display(),
            skipped.reason
        ));
    }

    if report.imported_files > 0 {
        formatter.info(&format!(
            "Added {} page(s) from {} file(s) in {:.2}s",
            report.pages.len(),
            report.imported_files,
            report.elapsed.as_secs_f64()
        ));
    }
}

/// Report a finished merge.
pub fn display_merge_statistics(formatter: &OutputFormatter, stats: &MergeStatistics, path: &Path) {
    let size = stats
        .format_output_size()
        .map(|size| format!(", {size}"))
        .unwrap_or_default();
    formatter.success(&format!(
        "Saved {} ({} pages{size})",
        path.display(),
        stats.total_pages
    ));

    if stats.pages_skipped > 0 {
        formatter.warning(&format!(
            "{} page reference(s) pointed past the end of their file and were left out",
            stats.pages_skipped
        ));
    }
    formatter.debug(&format!(
        "Opened {} source file(s) in {:.2}s",
        stats.files_opened,
        stats.merge_time.as_secs_f64()
    ));
}

//! Conversion of non-PDF sources into PDF.
//!
//! Images, plain text and CSV tables are converted in-process with `image`,
//! `csv` and `lopdf`. Office documents and HTML are handed to an external
//! `soffice` binary. Converted files are written to a scratch directory as
//! `converted_{name}_{tag}{_L|_P}.pdf`, where `tag` is derived from the full
//! source path. Converting the same source in the same orientation again
//! replaces the previous result; same-named sources in different folders
//! never share a file.

use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, StitchError};
use crate::model::display_name;
use crate::utils::{extension_lowercase, safe_file_name};

/// A4 in points.
const A4: (f32, f32) = (595.2756, 841.8898);

/// 20 mm in points.
const TEXT_MARGIN: f32 = 56.692_91;

const TEXT_FONT_SIZE: f32 = 10.5;
const TEXT_LEADING: f32 = 14.0;

/// 1 cm in points.
const TABLE_MARGIN: f32 = 28.346_457;

const TABLE_FONT_SIZE: f32 = 9.0;
const TABLE_LEADING: f32 = 13.0;
/// Distance from a header baseline down to its rule.
const TABLE_RULE_DROP: f32 = 3.0;
/// Courier advance width, in em.
const COURIER_GLYPH_WIDTH: f32 = 0.6;
/// Longest cell shown, in characters.
const TABLE_MAX_CELL: usize = 40;
/// Blank characters between columns.
const TABLE_COLUMN_GAP: usize = 2;

/// Resolution images are embedded at.
const IMAGE_DPI: f32 = 100.0;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif", "webp", "ico",
];
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "log", "md", "py", "json", "xml", "js", "css", "rtf",
];
const OFFICE_EXTENSIONS: &[&str] = &[
    "doc", "docx", "ppt", "pptx", "xls", "xlsx", "odt", "ods", "odp",
];
const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

/// Hex digits of the source path hash kept in converted file names.
const SOURCE_TAG_LEN: usize = 12;

/// What kind of source a file is, judged by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Image,
    Text,
    /// Comma-separated values, laid out as a table.
    Table,
    Office,
    Html,
    Unsupported,
}

impl SourceKind {
    /// Classify a path by its (case-insensitive) extension.
    ///
    /// A bare dot-file such as `.txt` is classified by its whole name.
    pub fn of(path: &Path) -> Self {
        let name = display_name(path).to_lowercase();
        let ext = match name.strip_prefix('.') {
            Some(rest) if !rest.contains('.') => rest.to_string(),
            _ => extension_lowercase(path).unwrap_or_default(),
        };

        match ext.as_str() {
            "pdf" => Self::Pdf,
            e if IMAGE_EXTENSIONS.contains(&e) => Self::Image,
            e if TEXT_EXTENSIONS.contains(&e) => Self::Text,
            "csv" => Self::Table,
            e if OFFICE_EXTENSIONS.contains(&e) => Self::Office,
            e if HTML_EXTENSIONS.contains(&e) => Self::Html,
            _ => Self::Unsupported,
        }
    }
}

/// Turns a non-PDF source into a PDF file.
pub trait Converter: Send + Sync {
    /// Convert `source`, laying pages out in landscape when asked, and
    /// return the path of the produced PDF.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::UnsupportedFormat`] for file types the
    /// converter does not handle, or [`StitchError::ConversionFailed`].
    fn convert(&self, source: &Path, landscape: bool) -> Result<PathBuf>;
}

/// Converter for images, text and CSV, and (via `soffice`) office
/// documents and HTML.
#[derive(Debug, Clone)]
pub struct BuiltinConverter {
    output_dir: PathBuf,
    office_command: String,
}

impl BuiltinConverter {
    /// Create a converter writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            office_command: "soffice".to_string(),
        }
    }

    /// Converter configured from the scratch directory and office command.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.conversion_dir()).with_office_command(config.office_command.clone())
    }

    /// Use a different office converter executable.
    pub fn with_office_command(mut self, command: impl Into<String>) -> Self {
        self.office_command = command.into();
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where the converted form of `source` is written.
    pub fn output_path(&self, source: &Path, landscape: bool) -> PathBuf {
        let suffix = if landscape { "_L" } else { "_P" };
        let safe_name = safe_file_name(&display_name(source));
        let tag = source_tag(source);
        self.output_dir
            .join(format!("converted_{safe_name}_{tag}{suffix}.pdf"))
    }

    /// Run `soffice` into a private staging directory, then move its output
    /// into place.
    fn convert_office(&self, source: &Path, output: &Path) -> Result<()> {
        let staging = tempfile::Builder::new()
            .prefix(".soffice")
            .tempdir_in(&self.output_dir)
            .map_err(|e| {
                StitchError::conversion_failed(
                    source.to_path_buf(),
                    format!("cannot create staging directory: {e}"),
                )
            })?;

        let status = Command::new(&self.office_command)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(staging.path())
            .arg(source)
            .output()
            .map_err(|e| {
                StitchError::conversion_failed(
                    source.to_path_buf(),
                    format!("cannot run {}: {e}", self.office_command),
                )
            })?;

        if !status.status.success() {
            return Err(StitchError::conversion_failed(
                source.to_path_buf(),
                format!(
                    "{} exited with {}: {}",
                    self.office_command,
                    status.status,
                    String::from_utf8_lossy(&status.stderr).trim()
                ),
            ));
        }

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let produced = staging.path().join(format!("{stem}.pdf"));
        std::fs::rename(&produced, output).map_err(|e| {
            StitchError::conversion_failed(
                source.to_path_buf(),
                format!("converter output {} missing: {e}", produced.display()),
            )
        })
    }
}

impl Default for BuiltinConverter {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl Converter for BuiltinConverter {
    fn convert(&self, source: &Path, landscape: bool) -> Result<PathBuf> {
        if !source.exists() {
            return Err(StitchError::file_not_found(source.to_path_buf()));
        }

        let output = self.output_path(source, landscape);
        let kind = SourceKind::of(source);
        debug!(source = %source.display(), ?kind, landscape, "converting");

        match kind {
            SourceKind::Image => {
                let image = image::open(source)
                    .map_err(|e| StitchError::conversion_failed(source.to_path_buf(), e.to_string()))?
                    .to_rgb8();
                save_document(image_to_pdf(&image), source, &output)?;
            }
            SourceKind::Text => {
                let bytes = std::fs::read(source)?;
                let text = String::from_utf8_lossy(&bytes);
                save_document(text_to_pdf(&text, landscape), source, &output)?;
            }
            SourceKind::Table => {
                let bytes = std::fs::read(source)?;
                save_document(csv_to_pdf(&bytes, landscape), source, &output)?;
            }
            SourceKind::Office | SourceKind::Html => self.convert_office(source, &output)?,
            SourceKind::Pdf | SourceKind::Unsupported => {
                return Err(StitchError::unsupported_format(source.to_path_buf()));
            }
        }

        Ok(output)
    }
}

/// Short stable tag for the absolute form of `source`.
fn source_tag(source: &Path) -> String {
    let absolute = std::path::absolute(source).unwrap_or_else(|_| source.to_path_buf());
    let hash = blake3::hash(absolute.as_os_str().as_encoded_bytes());
    hash.to_hex()[..SOURCE_TAG_LEN].to_string()
}

/// Write `doc` next to `output` and rename it into place, so concurrent
/// conversions never observe a half-written file.
fn save_document(mut doc: Document, source: &Path, output: &Path) -> Result<()> {
    let failed = |reason: String| StitchError::conversion_failed(source.to_path_buf(), reason);

    doc.compress();
    let dir = output.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(|e| failed(e.to_string()))?;
    doc.save_to(staged.as_file_mut())
        .map_err(|e| failed(e.to_string()))?;
    staged
        .persist(output)
        .map_err(|e| failed(e.error.to_string()))?;
    Ok(())
}

/// Accumulates pages of a freshly built document.
struct PageSink {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl PageSink {
    fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    fn push_page(&mut self, size: (f32, f32), resources: Object, content: Vec<u8>) {
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), size.0.into(), size.1.into()],
            "Resources" => resources,
            "Contents" => content_id,
        });
        self.kids.push(page_id.into());
    }

    fn finish(mut self) -> Document {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc
    }
}

/// One page holding the image at 100 dpi.
pub fn image_to_pdf(image: &RgbImage) -> Document {
    let (px_w, px_h) = image.dimensions();
    let width = px_w as f32 * 72.0 / IMAGE_DPI;
    let height = px_h as f32 * 72.0 / IMAGE_DPI;

    let mut sink = PageSink::new();
    let image_id = sink.doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => px_w as i64,
            "Height" => px_h as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        image.as_raw().clone(),
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.into(),
                    0.into(),
                    height.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
            Operation::new("Q", vec![]),
        ],
    };

    let resources = dictionary! {
        "XObject" => dictionary! { "Im0" => image_id },
    };
    sink.push_page(
        (width, height),
        resources.into(),
        content.encode().unwrap_or_default(),
    );
    sink.finish()
}

/// Lay text out on A4 pages, one source line per output line.
///
/// Lines are not wrapped. A new page starts when the cursor passes the
/// bottom margin. Characters outside Latin-1 are replaced with `?`.
pub fn text_to_pdf(text: &str, landscape: bool) -> Document {
    let size = if landscape { (A4.1, A4.0) } else { A4 };
    let top = size.1 - TEXT_MARGIN;

    let mut sink = PageSink::new();
    let font_id = sink.doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = sink.doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut pages: Vec<Vec<Operation>> = vec![Vec::new()];
    let mut y = top;
    for line in text.lines() {
        if y < TEXT_MARGIN {
            pages.push(Vec::new());
            y = top;
        }
        let line = line.trim_end();
        if let Some(ops) = pages.last_mut()
            && !line.is_empty()
        {
            ops.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), TEXT_FONT_SIZE.into()]),
                Operation::new("Td", vec![TEXT_MARGIN.into(), y.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(latin1_bytes(line), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ]);
        }
        y -= TEXT_LEADING;
    }

    for operations in pages {
        let content = Content { operations };
        sink.push_page(
            size,
            resources_id.into(),
            content.encode().unwrap_or_default(),
        );
    }
    sink.finish()
}

/// Lay CSV records out as a table on A4 pages.
///
/// The first record is the header. It is set in bold, underlined, and
/// repeated at the top of every following page. Columns are sized to their
/// longest cell (capped) and cut off at the right margin. Rows that fail to
/// parse are skipped.
pub fn csv_to_pdf(data: &[u8], landscape: bool) -> Document {
    let rows = read_csv_rows(data);
    let size = if landscape { (A4.1, A4.0) } else { A4 };
    let glyph = TABLE_FONT_SIZE * COURIER_GLYPH_WIDTH;
    let right = size.0 - TABLE_MARGIN;
    let top = size.1 - TABLE_MARGIN - TABLE_FONT_SIZE;

    let mut widths: Vec<usize> = Vec::new();
    for row in &rows {
        for (column, cell) in row.iter().enumerate() {
            let len = cell.chars().count().min(TABLE_MAX_CELL);
            match widths.get_mut(column) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }

    // (x, visible characters) per column that starts inside the margins
    let mut columns = Vec::with_capacity(widths.len());
    let mut x = TABLE_MARGIN;
    for &width in &widths {
        if x >= right {
            break;
        }
        let room = ((right - x) / glyph) as usize;
        columns.push((x, width.min(room)));
        x += (width + TABLE_COLUMN_GAP) as f32 * glyph;
    }

    let mut sink = PageSink::new();
    let regular = sink.doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = sink.doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = sink.doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => regular, "F2" => bold },
    });

    let header_block = |header: &[String], y: f32| {
        let mut ops = table_row(header, &columns, "F2", y);
        ops.extend(table_rule(TABLE_MARGIN, right, y - TABLE_RULE_DROP));
        ops
    };

    let mut pages: Vec<Vec<Operation>> = Vec::new();
    let mut y = top;
    for (index, row) in rows.iter().enumerate() {
        if pages.is_empty() || y < TABLE_MARGIN {
            let mut ops = Vec::new();
            y = top;
            if index > 0
                && let Some(header) = rows.first()
            {
                ops.extend(header_block(header.as_slice(), y));
                y -= TABLE_LEADING;
            }
            pages.push(ops);
        }
        if let Some(ops) = pages.last_mut() {
            if index == 0 {
                ops.extend(header_block(row.as_slice(), y));
            } else {
                ops.extend(table_row(row, &columns, "F1", y));
            }
        }
        y -= TABLE_LEADING;
    }
    if pages.is_empty() {
        pages.push(Vec::new());
    }

    for operations in pages {
        let content = Content { operations };
        sink.push_page(
            size,
            resources_id.into(),
            content.encode().unwrap_or_default(),
        );
    }
    sink.finish()
}

fn read_csv_rows(data: &[u8]) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    reader
        .byte_records()
        .filter_map(|record| match record {
            Ok(record) => Some(
                record
                    .iter()
                    .map(|field| String::from_utf8_lossy(field).trim().to_string())
                    .collect(),
            ),
            Err(e) => {
                debug!(error = %e, "skipping malformed csv row");
                None
            }
        })
        .collect()
}

fn table_row(row: &[String], columns: &[(f32, usize)], font: &str, y: f32) -> Vec<Operation> {
    let mut ops = Vec::new();
    for (cell, &(x, visible)) in row.iter().zip(columns) {
        let text: String = cell.chars().take(visible).collect();
        if text.is_empty() {
            continue;
        }
        ops.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), TABLE_FONT_SIZE.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(latin1_bytes(&text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }
    ops
}

fn table_rule(from: f32, to: f32, y: f32) -> [Operation; 4] {
    [
        Operation::new("w", vec![0.5_f32.into()]),
        Operation::new("m", vec![from.into(), y.into()]),
        Operation::new("l", vec![to.into(), y.into()]),
        Operation::new("S", vec![]),
    ]
}

fn latin1_bytes(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

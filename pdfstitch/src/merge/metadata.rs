//! Info dictionary for merged documents.
//!
//! Every merged document gets Title and Author entries (empty unless set)
//! plus Producer and creation/modification dates.

use crate::config::DocumentInfo;
use lopdf::{Dictionary, Document, Object, StringFormat};
use std::time::{SystemTime, UNIX_EPOCH};

/// Manager for the document Info dictionary.
#[derive(Debug, Clone)]
pub struct MetadataManager {
    producer: String,
}

impl MetadataManager {
    /// Create a new metadata manager.
    pub fn new() -> Self {
        Self {
            producer: format!("{} {}", crate::NAME, crate::VERSION),
        }
    }

    /// Write the Info dictionary, replacing any existing one.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pdfstitch::merge::metadata::MetadataManager;
    /// # use pdfstitch::config::DocumentInfo;
    /// # use lopdf::Document;
    /// # fn example(mut doc: Document) {
    /// let manager = MetadataManager::new();
    /// let info = DocumentInfo::new(Some("Quarterly report".to_string()), None);
    /// manager.set_info(&mut doc, &info);
    /// # }
    /// ```
    pub fn set_info(&self, doc: &mut Document, info: &DocumentInfo) {
        let date = format_pdf_date(SystemTime::now());

        let mut dict = Dictionary::new();
        dict.set("Title", text(info.title_or_empty()));
        dict.set("Author", text(info.author_or_empty()));
        dict.set("Producer", text(&self.producer));
        dict.set("CreationDate", text(&date));
        dict.set("ModDate", text(&date));

        let info_id = doc.add_object(Object::Dictionary(dict));
        doc.trailer.set("Info", info_id);
    }
}

impl Default for MetadataManager {
    fn default() -> Self {
        Self::new()
    }
}

fn text(value: &str) -> Object {
    Object::String(value.as_bytes().to_vec(), StringFormat::Literal)
}

/// Format a SystemTime as a PDF date string in UTC: `D:YYYYMMDDHHmmSSZ`.
fn format_pdf_date(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let days = (secs / 86_400) as i64;
    let (year, month, day) = civil_from_days(days);
    let time_of_day = secs % 86_400;

    format!(
        "D:{year:04}{month:02}{day:02}{:02}{:02}{:02}Z",
        time_of_day / 3_600,
        (time_of_day % 3_600) / 60,
        time_of_day % 60
    )
}

/// Gregorian date for a day count since 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

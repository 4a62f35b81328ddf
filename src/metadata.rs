//! EXIF-derived capture date and camera identity, used to populate
//! template tokens.
//!
//! Reads EXIF in-process with the pure-Rust `kamadak-exif` crate rather
//! than shelling out to an external tool, so this core stays a
//! dependency-free, embeddable library (see DESIGN.md).

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};

#[derive(Debug, Clone, Default)]
pub struct CaptureInfo {
    pub captured_at: Option<DateTime<Utc>>,
    pub camera_model: Option<String>,
    pub camera_serial: Option<String>,
}

/// Best-effort EXIF read. Any failure (no EXIF segment, corrupt file,
/// unsupported container) degrades to an empty `CaptureInfo` -- template
/// expansion treats missing tokens as empty string, never an error.
pub fn extract_capture_info(path: &Path) -> CaptureInfo {
    let Ok(file) = File::open(path) else {
        return CaptureInfo::default();
    };
    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(_) => return CaptureInfo::default(),
    };

    let captured_at = exif
        .get_field(exif::Tag::DateTimeOriginal, exif::In::PRIMARY)
        .or_else(|| exif.get_field(exif::Tag::DateTime, exif::In::PRIMARY))
        .and_then(|field| parse_exif_datetime(&field.display_value().with_unit(&exif).to_string()));

    let camera_model = exif
        .get_field(exif::Tag::Model, exif::In::PRIMARY)
        .map(|field| field.display_value().to_string().trim_matches('"').to_string());

    let camera_serial = exif
        .get_field(exif::Tag::BodySerialNumber, exif::In::PRIMARY)
        .map(|field| field.display_value().to_string().trim_matches('"').to_string());

    CaptureInfo {
        captured_at,
        camera_model,
        camera_serial,
    }
}

/// EXIF timestamps are `"YYYY:MM:DD HH:MM:SS"`, naive (no timezone).
/// Treated as UTC -- only the calendar date is needed for YYYY/MM/DD
/// tokens, and the run's own `started_at` is already UTC.
fn parse_exif_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    let naive = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(raw, "%Y:%m:%d %H:%M:%S"))
        .ok()?;
    Utc.from_local_datetime(&naive).single()
}

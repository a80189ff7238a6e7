use super::types::CellValue;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashSet;
use std::path::PathBuf;

pub const UNKNOWN_BUCKET: &str = "Unknown";

static ANCHOR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([A-Z]+)(\d+)$").expect("valid anchor pattern"));

/// Canonical comparable form of a cell. Date/time values collapse to their
/// calendar date so equality across sheets ignores the time of day. Every
/// other value passes through untouched, which makes the function a projection.
pub fn normalize(value: &CellValue) -> Cow<'_, CellValue> {
    match value {
        CellValue::DateTime(dt) => Cow::Owned(CellValue::Text(dt.format("%Y-%m-%d").to_string())),
        other => Cow::Borrowed(other),
    }
}

/// Comparison key of a normalized cell, `None` for blank or absent cells.
pub fn normalized_key(value: Option<&CellValue>) -> Option<String> {
    let value = value?;
    let normalized = normalize(value);
    if normalized.is_blank() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// Parses the ISO strings some decoders emit for date cells.
pub fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    let formats = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

    for format in formats.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Header for a column. Blank header cells fall back to the column letter and
/// repeated headers get a numeric suffix so every column stays addressable.
pub fn header_name(raw: &str, column: u32, existing_names: &mut HashSet<String>) -> String {
    let base_name = raw.trim();
    let original_name = if base_name.is_empty() {
        column_letters(column)
    } else {
        base_name.to_string()
    };

    let mut cleaned = original_name.clone();
    let mut counter = 1;
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}_{}", original_name, counter);
        counter += 1;
    }

    cleaned
}

/// Zero-based column index to spreadsheet letters (0 → `A`, 27 → `AB`).
pub fn column_letters(column: u32) -> String {
    let mut n = column as u64 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Zero-based column/row to an anchor coordinate such as `B3`.
pub fn cell_coordinate(column: u32, row: u32) -> String {
    format!("{}{}", column_letters(column), row as u64 + 1)
}

/// Splits an anchor such as `AB12` into `("AB", "12")`. Anything that is not
/// uppercase letters followed by digits lands in the `Unknown` buckets.
pub fn parse_anchor(coordinates: &str) -> (String, String) {
    match ANCHOR_PATTERN.captures(coordinates) {
        Some(caps) => (caps[1].to_string(), caps[2].to_string()),
        None => (UNKNOWN_BUCKET.to_string(), UNKNOWN_BUCKET.to_string()),
    }
}

/// Replaces every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_file_component(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Expands a leading `~` to `$HOME`.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => PathBuf::from(format!("{}{}", home, rest)),
        _ => PathBuf::from(path),
    }
}

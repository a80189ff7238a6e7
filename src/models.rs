use serde::Serialize;
use std::path::PathBuf;

/// 1-based ordinal in file order plus display name. Names may repeat inside a
/// workbook, the index never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetIdentity {
    pub index: usize,
    pub name: String,
}

impl SheetIdentity {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self { index, name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub total: usize,
    pub filled: usize,
    pub percent: f64,
    pub distinct_count: usize,
    /// Sorted by count, descending; ties keep first-seen order.
    pub values: Vec<ValueCount>,
    pub has_more: bool,
    /// Distinct values not listed in `values`.
    pub remaining: usize,
    /// Empty image-like column: pictures are probably floating drawings.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub image_hint: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetReport {
    pub sheet: SheetIdentity,
    pub total_rows: usize,
    pub columns: Vec<ColumnProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub key: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawingDetail {
    pub coordinates: String,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    pub directory: PathBuf,
    pub extracted: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageReport {
    pub total: usize,
    pub by_column: Vec<BucketCount>,
    pub by_row: Vec<BucketCount>,
    /// Distinct rows holding at least one image.
    pub rows_with_images: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<DrawingDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossSheetMatch {
    pub sheet: SheetIdentity,
    /// `None` when every column of the target sheet was searched.
    pub column: Option<String>,
    /// Source values (duplicates included) found in the target.
    pub count: usize,
    /// Matched values, deduplicated, in source order.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSheet {
    pub sheet: SheetIdentity,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossSheetSummary {
    pub source_sheet: SheetIdentity,
    pub source_column: String,
    pub target_column: Option<String>,
    pub total: usize,
    pub found: usize,
    pub percent: f64,
    pub matches: Vec<CrossSheetMatch>,
    pub skipped: Vec<SkippedSheet>,
    /// Set in debug mode, where target sheets are only scanned partially.
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub file: String,
    pub generated_at: String,
    pub sheets: Vec<SheetIdentity>,
    pub selected_sheet: Option<SheetIdentity>,
    pub no_data: bool,
    pub analysis: Option<SheetReport>,
    pub images: Option<ImageReport>,
    pub cross_sheet: Option<CrossSheetSummary>,
}

/// Rounds a ratio to a percentage with two decimals; 0 when `total` is 0.
pub fn percent_of(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_to_two_decimals() {
        assert_eq!(percent_of(7, 10), 70.0);
        assert_eq!(percent_of(1, 3), 33.33);
        assert_eq!(percent_of(2, 3), 66.67);
        assert_eq!(percent_of(0, 0), 0.0);
        assert_eq!(percent_of(5, 0), 0.0);
    }
}

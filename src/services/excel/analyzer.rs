use super::types::{CellValue, SheetData};
use super::utils::normalized_key;
use crate::config::Config;
use crate::models::{percent_of, ColumnProfile, SheetIdentity, SheetReport, ValueCount};
use std::collections::HashMap;

const IMAGE_HEADER_MARKER: &str = "bild";

/// Sheet and column statistics.
pub struct ExcelAnalyzer {
    max_listed_distinct: usize,
    top_values: usize,
}

impl ExcelAnalyzer {
    pub fn new(config: &Config) -> Self {
        Self {
            max_listed_distinct: config.max_listed_distinct,
            top_values: config.top_values,
        }
    }

    /// Statistics for every column, in header order. `None` when the sheet
    /// has no data rows.
    pub fn analyze(&self, sheet: &SheetIdentity, data: &SheetData) -> Option<SheetReport> {
        if data.is_empty() {
            tracing::warn!("No data found in sheet '{}' ({})", sheet.name, sheet.index);
            return None;
        }

        let start = std::time::Instant::now();
        let total_rows = data.len();

        let columns = data
            .headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let mut profile = self.profile_column(name, data.column(idx), total_rows);
                profile.image_hint = profile.filled == 0 && name.to_lowercase().contains(IMAGE_HEADER_MARKER);
                profile
            })
            .collect::<Vec<_>>();

        tracing::info!(
            "Analyzed {} columns over {} rows of sheet '{}' in {:?}",
            columns.len(),
            total_rows,
            sheet.name,
            start.elapsed()
        );

        Some(SheetReport {
            sheet: sheet.clone(),
            total_rows,
            columns,
        })
    }

    /// Fill rate and value distribution of one column. Absent and blank cells
    /// both count as unfilled.
    pub fn profile_column<'a, I>(&self, name: &str, values: I, total: usize) -> ColumnProfile
    where
        I: IntoIterator<Item = Option<&'a CellValue>>,
    {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut distinct: Vec<ValueCount> = Vec::new();
        let mut filled = 0;

        for key in values.into_iter().filter_map(normalized_key) {
            filled += 1;
            match index.get(&key) {
                Some(&pos) => distinct[pos].count += 1,
                None => {
                    index.insert(key.clone(), distinct.len());
                    distinct.push(ValueCount { value: key, count: 1 });
                }
            }
        }

        // stable: equal counts stay in first-seen order
        distinct.sort_by(|a, b| b.count.cmp(&a.count));

        let distinct_count = distinct.len();
        let has_more = distinct_count > self.max_listed_distinct;
        if has_more {
            distinct.truncate(self.top_values);
        }

        ColumnProfile {
            name: name.to_string(),
            total,
            filled,
            percent: percent_of(filled, total),
            distinct_count,
            remaining: distinct_count - distinct.len(),
            values: distinct,
            has_more,
            image_hint: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::excel::types::Row;
    use pretty_assertions::assert_eq;

    fn analyzer() -> ExcelAnalyzer {
        ExcelAnalyzer::new(&Config::default())
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn counts(profile: &ColumnProfile) -> Vec<(&str, usize)> {
        profile.values.iter().map(|v| (v.value.as_str(), v.count)).collect()
    }

    #[test]
    fn profiles_fill_rate_and_ordering() {
        let cells = [
            text("a"),
            text("b"),
            text("a"),
            CellValue::Empty,
            text("c"),
            text("a"),
            text(""),
            text("b"),
            text("c"),
            CellValue::Empty,
        ];
        let profile = analyzer().profile_column("col", cells.iter().map(Some), cells.len());

        assert_eq!(profile.total, 10);
        assert_eq!(profile.filled, 7);
        assert_eq!(profile.percent, 70.0);
        assert_eq!(profile.distinct_count, 3);
        assert_eq!(counts(&profile), vec![("a", 3), ("b", 2), ("c", 2)]);
        assert!(!profile.has_more);
        assert_eq!(profile.remaining, 0);
    }

    #[test]
    fn ties_keep_first_seen_order() {
        let cells = [text("z"), text("y"), text("x"), text("y"), text("z"), text("x")];
        let profile = analyzer().profile_column("col", cells.iter().map(Some), cells.len());
        assert_eq!(counts(&profile), vec![("z", 2), ("y", 2), ("x", 2)]);
    }

    #[test]
    fn wide_columns_keep_top_ten() {
        let cells: Vec<CellValue> = (0..25).map(CellValue::Int).collect();
        let profile = analyzer().profile_column("id", cells.iter().map(Some), cells.len());

        assert_eq!(profile.distinct_count, 25);
        assert_eq!(profile.values.len(), 10);
        assert!(profile.has_more);
        assert_eq!(profile.remaining, 15);
        assert_eq!(profile.values[0].value, "0");
    }

    #[test]
    fn exactly_twenty_distinct_values_are_all_listed() {
        let cells: Vec<CellValue> = (0..20).map(CellValue::Int).collect();
        let profile = analyzer().profile_column("id", cells.iter().map(Some), cells.len());
        assert_eq!(profile.values.len(), 20);
        assert!(!profile.has_more);
    }

    #[test]
    fn zero_total_has_zero_percent() {
        let profile = analyzer().profile_column("empty", std::iter::empty(), 0);
        assert_eq!(profile.filled, 0);
        assert_eq!(profile.percent, 0.0);
        assert!(profile.values.is_empty());
    }

    #[test]
    fn absent_keys_count_as_blank() {
        let data = SheetData::new(
            vec!["A".into(), "B".into()],
            vec![
                Row::new(vec![text("1"), text("x")]),
                Row::new(vec![text("2")]),
            ],
        );
        let report = analyzer()
            .analyze(&SheetIdentity::new(1, "Data"), &data)
            .unwrap();
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.columns[1].filled, 1);
        assert_eq!(report.columns[1].percent, 50.0);
    }

    #[test]
    fn empty_image_columns_get_a_hint() {
        let data = SheetData::new(
            vec!["Artikel".into(), "Produktbild".into(), "Bild URL".into()],
            vec![Row::new(vec![text("A-1"), CellValue::Empty, text("http://x")])],
        );
        let report = analyzer()
            .analyze(&SheetIdentity::new(2, "Katalog"), &data)
            .unwrap();
        let hints: Vec<bool> = report.columns.iter().map(|c| c.image_hint).collect();
        assert_eq!(hints, vec![false, true, false]);
    }

    #[test]
    fn empty_sheet_has_no_report() {
        let data = SheetData::new(vec!["A".into()], vec![]);
        assert!(analyzer().analyze(&SheetIdentity::new(1, "Empty"), &data).is_none());
    }

    #[test]
    fn dates_are_counted_by_day() {
        let day = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let cells = [
            CellValue::DateTime(day.and_hms_opt(8, 0, 0).unwrap()),
            CellValue::DateTime(day.and_hms_opt(17, 30, 0).unwrap()),
            text("2024-05-01"),
        ];
        let profile = analyzer().profile_column("when", cells.iter().map(Some), cells.len());
        assert_eq!(counts(&profile), vec![("2024-05-01", 3)]);
    }
}

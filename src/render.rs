//! Console rendering of a [`Report`]. Markdown for people, JSON for tools.

use crate::error::Result;
use crate::models::{ColumnProfile, CrossSheetSummary, ImageReport, Report, SheetReport};
use std::fmt::Write;

const ELLIPSIS: char = '…';
const MAX_INLINE_MATCHES: usize = 10;

/// Cuts display values longer than `max` characters and appends `…`.
/// Counts and distinct sets are never affected.
pub fn truncate_value(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let mut out: String = value.chars().take(max).collect();
        out.push(ELLIPSIS);
        out
    } else {
        value.to_string()
    }
}

pub fn json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn markdown(report: &Report, truncate: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "## Available sheets\n");
    for sheet in &report.sheets {
        let _ = writeln!(out, "- **[{}]** `{}`", sheet.index, sheet.name);
    }
    out.push('\n');

    let Some(selected) = &report.selected_sheet else {
        return out;
    };

    if report.no_data {
        let _ = writeln!(out, "No data found in sheet '{}' ({})", selected.name, selected.index);
        return out;
    }

    let _ = writeln!(out, "# Sheet `{}` (Index: {})\n", selected.name, selected.index);

    if let Some(analysis) = &report.analysis {
        write_analysis(&mut out, analysis, truncate);
    }
    if let Some(images) = &report.images {
        write_images(&mut out, &selected.name, images);
    }
    if let Some(cross) = &report.cross_sheet {
        write_cross_sheet(&mut out, cross);
    }

    out
}

fn write_analysis(out: &mut String, analysis: &SheetReport, truncate: usize) {
    let _ = writeln!(out, "## Sheet statistics\n");
    let _ = writeln!(out, "- **Rows** (excluding header): `{}`\n", analysis.total_rows);

    for column in &analysis.columns {
        write_column(out, column, truncate);
    }
}

fn write_column(out: &mut String, column: &ColumnProfile, truncate: usize) {
    let _ = writeln!(out, "### `{}`\n", column.name);

    let hint = if column.image_hint {
        " *Images may be embedded as drawings (use --images)*"
    } else {
        ""
    };
    let _ = writeln!(
        out,
        "- **Filled**: `{} / {}` ({}%){}",
        column.filled, column.total, column.percent, hint
    );
    let _ = writeln!(out, "- **Distinct**: `{}`", column.distinct_count);

    if !column.values.is_empty() {
        if column.has_more {
            let _ = writeln!(out, "\n  Top {} (of {}):", column.values.len(), column.distinct_count);
        } else {
            let _ = writeln!(out, "\n  Values:");
        }
        for entry in &column.values {
            let _ = writeln!(out, "  - `{}` ({})", truncate_value(&entry.value, truncate), entry.count);
        }
        if column.has_more {
            let _ = writeln!(out, "  - *{} and {} more*", ELLIPSIS, column.remaining);
        }
    }
    out.push('\n');
}

fn write_images(out: &mut String, sheet_name: &str, images: &ImageReport) {
    let _ = writeln!(out, "## Images in sheet `{}`\n", sheet_name);
    let _ = writeln!(out, "- **Total images found**: `{}`", images.total);

    if images.total == 0 {
        let _ = writeln!(out, "\nNo images found in this sheet.\n");
        return;
    }

    let _ = writeln!(out, "\n### Images by column\n");
    for bucket in &images.by_column {
        let _ = writeln!(out, "- **Column {}**: `{}` image(s)", bucket.key, bucket.count);
    }

    let _ = writeln!(out, "\n### Distribution\n");
    let _ = writeln!(out, "- **Rows with images**: `{}`", images.rows_with_images);

    if let Some(extraction) = &images.extraction {
        let _ = writeln!(
            out,
            "\nExtracted {} image(s) to: {}",
            extraction.extracted,
            extraction.directory.display()
        );
        if extraction.failed > 0 {
            let _ = writeln!(out, "Failed to extract {} image(s)", extraction.failed);
        }
    }

    if !images.details.is_empty() {
        let _ = writeln!(out, "\nSample image details (first {}):", images.details.len());
        for detail in &images.details {
            let _ = writeln!(
                out,
                "   [{}] Name: {}, Description: {}",
                detail.coordinates,
                detail.name.as_deref().unwrap_or("unnamed"),
                detail.description.as_deref().unwrap_or("none")
            );
        }
    }
    out.push('\n');
}

fn write_cross_sheet(out: &mut String, cross: &CrossSheetSummary) {
    let _ = writeln!(
        out,
        "Cross-sheet reference check for column '{}' in sheet {}:",
        cross.source_column, cross.source_sheet.name
    );
    if cross.partial {
        let _ = writeln!(out, "*Debug mode: target sheets were only partially checked, results are incomplete*");
    }
    for skipped in &cross.skipped {
        let _ = writeln!(out, "Skipped sheet {} ({}): {}", skipped.sheet.name, skipped.sheet.index, skipped.reason);
    }

    let _ = writeln!(out, "Values found: {} / {} ({}%)", cross.found, cross.total, cross.percent);

    for found in &cross.matches {
        let column = found.column.as_deref().unwrap_or("any matching");
        let _ = writeln!(
            out,
            " - In sheet {} ({}), column '{}' → {} match(es)",
            found.sheet.name, found.sheet.index, column, found.count
        );
        if found.values.len() <= MAX_INLINE_MATCHES {
            let _ = writeln!(out, "   → {}", found.values.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CrossSheetMatch, SheetIdentity, ValueCount};

    #[test]
    fn short_strings_are_unchanged() {
        assert_eq!(truncate_value("hello", 100), "hello");
        assert_eq!(truncate_value("", 100), "");
    }

    #[test]
    fn long_strings_get_an_ellipsis() {
        let long = "x".repeat(150);
        let cut = truncate_value(&long, 100);
        assert_eq!(cut.chars().count(), 101);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn exact_length_is_kept() {
        let exact = "y".repeat(100);
        assert_eq!(truncate_value(&exact, 100), exact);
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundaries() {
        assert_eq!(truncate_value("äöüß", 2), "äö…");
    }

    fn report() -> Report {
        let sheet = SheetIdentity::new(1, "Items");
        Report {
            file: "book.xlsx".into(),
            generated_at: "2024-01-01 00:00:00".into(),
            sheets: vec![sheet.clone(), SheetIdentity::new(2, "Orders")],
            selected_sheet: Some(sheet.clone()),
            no_data: false,
            analysis: Some(SheetReport {
                sheet: sheet.clone(),
                total_rows: 10,
                columns: vec![
                    ColumnProfile {
                        name: "code".into(),
                        total: 10,
                        filled: 10,
                        percent: 100.0,
                        distinct_count: 25,
                        values: (0..10)
                            .map(|i| ValueCount {
                                value: format!("v{}", i),
                                count: 1,
                            })
                            .collect(),
                        has_more: true,
                        remaining: 15,
                        image_hint: false,
                    },
                    ColumnProfile {
                        name: "Bild".into(),
                        total: 10,
                        filled: 0,
                        percent: 0.0,
                        distinct_count: 0,
                        values: vec![],
                        has_more: false,
                        remaining: 0,
                        image_hint: true,
                    },
                ],
            }),
            images: None,
            cross_sheet: Some(CrossSheetSummary {
                source_sheet: sheet,
                source_column: "code".into(),
                target_column: None,
                total: 4,
                found: 3,
                percent: 75.0,
                matches: vec![CrossSheetMatch {
                    sheet: SheetIdentity::new(2, "Orders"),
                    column: None,
                    count: 3,
                    values: vec!["2".into(), "3".into()],
                }],
                skipped: vec![],
                partial: true,
            }),
        }
    }

    #[test]
    fn markdown_lists_sheets_and_statistics() {
        let text = markdown(&report(), 100);
        assert!(text.contains("- **[2]** `Orders`"));
        assert!(text.contains("# Sheet `Items` (Index: 1)"));
        assert!(text.contains("Top 10 (of 25):"));
        assert!(text.contains("… and 15 more"));
        assert!(text.contains("(0%) *Images may be embedded as drawings (use --images)*"));
        assert!(text.contains("Values found: 3 / 4 (75%)"));
        assert!(text.contains("column 'any matching' → 3 match(es)"));
        assert!(text.contains("   → 2, 3"));
        assert!(text.contains("partially checked"));
    }

    #[test]
    fn json_is_structured() {
        let value: serde_json::Value = serde_json::from_str(&json(&report()).unwrap()).unwrap();
        assert_eq!(value["analysis"]["columns"][0]["distinct_count"], 25);
        assert_eq!(value["analysis"]["columns"][1]["image_hint"], true);
        assert!(value["analysis"]["columns"][0].get("image_hint").is_none());
        assert_eq!(value["cross_sheet"]["matches"][0]["count"], 3);
    }
}

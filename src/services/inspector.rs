use super::excel::images::DETAIL_SAMPLE_SIZE;
use super::excel::matcher::{MatchOutcome, MatchScope, SheetOutcome};
use super::excel::workbook::resolve_sheet;
use super::excel::{CrossSheetMatcher, ExcelAnalyzer, ImageInventory, WorkbookSource};
use super::report::ReportBuilder;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{CrossSheetSummary, ImageReport, Report, SheetIdentity, SkippedSheet};
use std::path::PathBuf;

/// What one invocation should look at.
#[derive(Debug, Clone, Default)]
pub struct InspectOptions {
    pub list_sheets_only: bool,
    pub sheet: Option<String>,
    pub column: Option<String>,
    pub cross_sheet: Option<String>,
    pub target_column: Option<String>,
    pub debug: bool,
    pub images: bool,
    pub extract_images: Option<PathBuf>,
}

/// Runs the analysis stages against a decoded workbook.
pub struct Inspector<'a> {
    config: &'a Config,
}

impl<'a> Inspector<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn run<W: WorkbookSource>(&self, source: &mut W, file: &str, options: &InspectOptions) -> Result<Report> {
        let sheets = source.sheets();
        let builder = ReportBuilder::new(file).sheets(sheets.clone());

        if options.list_sheets_only {
            return Ok(builder.build());
        }

        let selector = options.sheet.as_deref().ok_or_else(|| {
            AppError::InvalidInput("No sheet specified. Use --sheet=1 or --sheet=SheetName".to_string())
        })?;
        let selected = resolve_sheet(&sheets, selector)?;
        let builder = builder.selected_sheet(selected.clone());

        let data = source.rows(selected.index)?;
        if data.is_empty() {
            tracing::warn!("No data found in sheet '{}' ({})", selected.name, selected.index);
            return Ok(builder.no_data().build());
        }

        let mut builder = builder;
        if options.column.is_none() {
            let analyzer = ExcelAnalyzer::new(self.config);
            builder = builder.analysis(analyzer.analyze(&selected, &data));
        }

        if options.images || options.extract_images.is_some() {
            builder = builder.images(self.inspect_images(source, &selected, options)?);
        }

        if let Some(column) = options.column.as_deref() {
            let column_index = data.column_index(column).ok_or_else(|| {
                AppError::ColumnNotFound(format!("Column '{}' not found in sheet '{}'", column, selected.name))
            })?;
            let source_values = CrossSheetMatcher::source_values(&data, column_index);
            drop(data);
            builder = builder.cross_sheet(self.cross_sheet(source, &sheets, &selected, column, &source_values, options)?);
        }

        Ok(builder.build())
    }

    fn inspect_images<W: WorkbookSource>(
        &self,
        source: &mut W,
        sheet: &SheetIdentity,
        options: &InspectOptions,
    ) -> Result<ImageReport> {
        let drawings = source.drawings(sheet.index)?;
        let inventory = ImageInventory;
        let mut report = inventory.inventory(&drawings);
        tracing::info!("Found {} image(s) in sheet '{}'", report.total, sheet.name);

        if report.total == 0 {
            tracing::warn!("No images found in this sheet.");
            return Ok(report);
        }

        if let Some(dir) = options.extract_images.as_deref() {
            report.extraction = Some(inventory.extract(&drawings, &sheet.name, dir)?);
        }
        if options.debug {
            report.details = inventory.details(&drawings, DETAIL_SAMPLE_SIZE);
        }

        Ok(report)
    }

    fn cross_sheet<W: WorkbookSource>(
        &self,
        source: &mut W,
        sheets: &[SheetIdentity],
        selected: &SheetIdentity,
        column: &str,
        source_values: &[String],
        options: &InspectOptions,
    ) -> Result<CrossSheetSummary> {
        tracing::info!("Cross-sheet reference check for column '{}' in sheet {}", column, selected.name);

        let only = match options.cross_sheet.as_deref() {
            Some(selector) => Some(resolve_sheet(sheets, selector)?.index),
            None => None,
        };
        let scope = MatchScope {
            source: selected.index,
            only,
        };

        let matcher = if options.debug {
            CrossSheetMatcher::with_row_limit(self.config.debug_row_limit)
        } else {
            CrossSheetMatcher::new()
        };
        let target_column = options.target_column.as_deref();

        let mut outcome = MatchOutcome::default();
        for sheet in sheets.iter().filter(|s| scope.includes(s)) {
            match source.rows(sheet.index) {
                Ok(data) => outcome.push(matcher.match_sheet(source_values, sheet, &data, target_column)),
                Err(e) => {
                    tracing::warn!("Skipping sheet '{}' ({}): {}", sheet.name, sheet.index, e);
                    outcome.push(SheetOutcome::Skipped(SkippedSheet {
                        sheet: sheet.clone(),
                        reason: e.to_string(),
                    }));
                }
            }
        }

        let summary = matcher.summarize(selected, column, target_column, source_values, outcome);
        tracing::info!("Values found: {} / {} ({}%)", summary.found, summary.total, summary.percent);
        Ok(summary)
    }
}

use super::drawings::DrawingLocator;
use super::types::{CellValue, Drawing, Row, SheetData};
use super::utils::{header_name, parse_iso_datetime};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::SheetIdentity;
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Rough in-memory footprint of one converted cell, used for the memory
/// ceiling. calamine has already decoded the sheet into a `Range` when the
/// ceiling is checked, so it bounds the converted `SheetData` (and every
/// later stage) rather than the decode itself.
pub const APPROX_CELL_BYTES: u64 = 64;

/// Decoded workbook as seen by the analysis code: sheet names in file
/// order, plus rows and drawings per 1-based sheet ordinal.
pub trait WorkbookSource {
    fn sheet_names(&self) -> Vec<String>;

    fn rows(&mut self, ordinal: usize) -> Result<SheetData>;

    fn drawings(&mut self, ordinal: usize) -> Result<Vec<Drawing>>;

    fn sheets(&self) -> Vec<SheetIdentity> {
        self.sheet_names()
            .into_iter()
            .enumerate()
            .map(|(idx, name)| SheetIdentity::new(idx + 1, name))
            .collect()
    }
}

/// Resolves a sheet selector: a number is a 1-based ordinal (fractions are
/// truncated, so `1.5` is sheet 1), anything else an exact sheet name
/// (first match wins).
pub fn resolve_sheet(sheets: &[SheetIdentity], selector: &str) -> Result<SheetIdentity> {
    let selector = selector.trim();
    if let Some(index) = numeric_selector(selector) {
        return sheets
            .iter()
            .find(|s| s.index as i64 == index)
            .cloned()
            .ok_or_else(|| {
                AppError::SheetNotFound(format!(
                    "Sheet index '{}' is out of range. Max index: {}",
                    index,
                    sheets.len()
                ))
            });
    }

    sheets
        .iter()
        .find(|s| s.name == selector)
        .cloned()
        .ok_or_else(|| AppError::SheetNotFound(format!("Sheet '{}' not found in list of sheets.", selector)))
}

fn numeric_selector(selector: &str) -> Option<i64> {
    selector
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(|value| value.trunc() as i64)
}

pub struct ExcelWorkbook {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
    sheet_names: Vec<String>,
    drawings: Option<DrawingLocator>,
    max_cells: u64,
}

impl ExcelWorkbook {
    pub fn open(path: &Path, config: &Config) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::FileNotFound(path.display().to_string()));
        }

        let start = std::time::Instant::now();
        let workbook = open_workbook_auto(path).map_err(|e| {
            tracing::error!("Failed to open workbook: {}", e);
            AppError::FileProcessingError(format!("Failed to open workbook {}: {}", path.display(), e))
        })?;
        let sheet_names = workbook.sheet_names().to_vec();
        tracing::info!("Workbook opened in {:?}, found {} sheets: {:?}", start.elapsed(), sheet_names.len(), sheet_names);

        let drawings = if is_ooxml_package(path) {
            match DrawingLocator::open(path) {
                Ok(locator) => Some(locator),
                Err(e) => {
                    tracing::warn!("Drawings unavailable for {}: {}", path.display(), e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            path: path.to_path_buf(),
            workbook,
            sheet_names,
            drawings,
            max_cells: config.memory_limit_bytes() / APPROX_CELL_BYTES,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sheet_name(&self, ordinal: usize) -> Result<&str> {
        ordinal
            .checked_sub(1)
            .and_then(|idx| self.sheet_names.get(idx))
            .map(String::as_str)
            .ok_or_else(|| AppError::SheetNotFound(format!("Sheet index '{}' is out of range", ordinal)))
    }
}

impl WorkbookSource for ExcelWorkbook {
    fn sheet_names(&self) -> Vec<String> {
        self.sheet_names.clone()
    }

    fn rows(&mut self, ordinal: usize) -> Result<SheetData> {
        let name = self.sheet_name(ordinal)?.to_string();
        let range = self
            .workbook
            .worksheet_range(&name)
            .map_err(|e| AppError::FileProcessingError(format!("Failed to read worksheet '{}': {}", name, e)))?;

        let (height, width) = range.get_size();
        let cells = (height as u64).saturating_mul(width as u64);
        if cells > self.max_cells {
            return Err(AppError::ResourceLimit(format!(
                "Sheet '{}' has {} cells, above the configured memory limit ({} cells)",
                name, cells, self.max_cells
            )));
        }

        let data = sheet_data_from_range(&range);
        tracing::info!("Read {} data rows and {} columns from sheet '{}'", data.len(), data.headers.len(), name);
        Ok(data)
    }

    fn drawings(&mut self, ordinal: usize) -> Result<Vec<Drawing>> {
        self.sheet_name(ordinal)?;
        match &self.drawings {
            Some(locator) => locator.drawings(ordinal),
            None => Ok(Vec::new()),
        }
    }
}

fn is_ooxml_package(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "xlsx" | "xlsm"))
        .unwrap_or(false)
}

/// First row of the used range becomes the headers. Rows with no filled cell
/// are dropped.
pub fn sheet_data_from_range(range: &Range<Data>) -> SheetData {
    let first_column = range.start().map(|(_, col)| col).unwrap_or(0);
    let mut rows = range.rows();

    let Some(header_row) = rows.next() else {
        return SheetData::default();
    };

    let mut existing_names = HashSet::new();
    let headers = header_row
        .iter()
        .enumerate()
        .map(|(idx, cell)| header_name(&convert_cell(cell).to_string(), first_column + idx as u32, &mut existing_names))
        .collect();

    let rows = rows
        .map(|row| Row::new(row.iter().map(convert_cell).collect()))
        .filter(|row| !row.is_blank())
        .collect();

    SheetData::new(headers, rows)
}

pub fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) if dt.is_duration() => CellValue::Float(dt.as_f64()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}

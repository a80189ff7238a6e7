use bytes::Bytes;
use chrono::NaiveDateTime;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_IMAGE_EXTENSION: &str = "png";

/// A decoded cell, before or after normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Error(String),
}

impl CellValue {
    /// Empty cells and empty strings are never counted as filled.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) => {
                if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{}", *v as i64)
                } else {
                    write!(f, "{}", v)
                }
            }
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Error(e) => f.write_str(e),
        }
    }
}

/// One data row. Cells are positional against the sheet headers; a row
/// shorter than the header set leaves the trailing columns absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    cells: Vec<CellValue>,
}

impl Row {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// `None` means the column is absent from this row, which is different
    /// from a present but blank cell. Both count as not filled.
    pub fn get(&self, column: usize) -> Option<&CellValue> {
        self.cells.get(column)
    }

    pub fn cells(&self) -> &[CellValue] {
        &self.cells
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_blank)
    }
}

/// A fully materialized sheet: headers from the first row, data rows after it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetData {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl SheetData {
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn column(&self, index: usize) -> impl Iterator<Item = Option<&CellValue>> + '_ {
        self.rows.iter().map(move |row| row.get(index))
    }

    /// Every non-absent cell of the first `limit` rows, row by row.
    pub fn cells(&self, limit: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().take(limit).flat_map(|row| row.cells().iter())
    }
}

/// Produces the image bytes of an in-memory drawing on demand.
pub type Renderer = Arc<dyn Fn() -> io::Result<Bytes> + Send + Sync>;

#[derive(Clone)]
pub enum DrawingSource {
    /// Image linked from disk.
    File(PathBuf),
    /// Image held by the decoder, rendered into a buffer when read.
    Memory { mime_type: String, render: Renderer },
}

impl DrawingSource {
    pub fn read_bytes(&self) -> io::Result<Bytes> {
        match self {
            DrawingSource::File(path) => std::fs::read(path).map(Bytes::from),
            DrawingSource::Memory { render, .. } => {
                let data = render()?;
                if data.is_empty() {
                    return Err(io::Error::new(io::ErrorKind::InvalidData, "renderer produced no data"));
                }
                Ok(data)
            }
        }
    }

    pub fn extension(&self) -> String {
        match self {
            DrawingSource::File(path) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .filter(|ext| !ext.is_empty())
                .unwrap_or(DEFAULT_IMAGE_EXTENSION)
                .to_string(),
            DrawingSource::Memory { mime_type, .. } => mime_type_extension(mime_type).to_string(),
        }
    }
}

impl fmt::Debug for DrawingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawingSource::File(path) => f.debug_tuple("File").field(path).finish(),
            DrawingSource::Memory { mime_type, .. } => f
                .debug_struct("Memory")
                .field("mime_type", mime_type)
                .finish_non_exhaustive(),
        }
    }
}

pub fn mime_type_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/jpeg" => "jpg",
        _ => DEFAULT_IMAGE_EXTENSION,
    }
}

/// An embedded image anchored to a cell such as `B7`. The anchor is kept as
/// the decoder reported it and may be malformed.
#[derive(Debug, Clone)]
pub struct Drawing {
    pub coordinates: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub source: DrawingSource,
}

impl Drawing {
    pub fn new(coordinates: impl Into<String>, source: DrawingSource) -> Self {
        Self {
            coordinates: coordinates.into(),
            name: None,
            description: None,
            source,
        }
    }
}

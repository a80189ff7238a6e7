pub mod analyzer;
pub mod drawings;
pub mod images;
pub mod matcher;
pub mod types;
pub mod utils;
pub mod workbook;

pub use analyzer::ExcelAnalyzer;
pub use images::ImageInventory;
pub use matcher::CrossSheetMatcher;
pub use workbook::{ExcelWorkbook, WorkbookSource};

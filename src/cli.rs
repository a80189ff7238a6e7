//! Command line arguments for `sheet-inspect`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};

use sheet_inspect::InspectOptions;

#[derive(Parser, Debug)]
#[command(
    name = "sheet-inspect",
    version,
    about = "Inspect spreadsheet workbooks: column statistics, images and cross-sheet references",
    long_about = "Inspect a spreadsheet workbook.\n\n\
                  Lists sheets, profiles the columns of one sheet, inventories embedded\n\
                  images and checks whether the values of a column appear in other sheets."
)]
pub struct Cli {
    /// Workbook to inspect (xlsx, xlsm, xls, xlsb or ods). `~` expands to the home directory.
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Only list the sheets of the workbook.
    #[arg(long = "sheets")]
    pub sheets: bool,

    /// Sheet to inspect, by 1-based index or exact name.
    #[arg(long = "sheet", value_name = "SHEET")]
    pub sheet: Option<String>,

    /// Source column for the cross-sheet reference check.
    #[arg(long = "column", value_name = "COLUMN")]
    pub column: Option<String>,

    /// Restrict the cross-sheet check to a single sheet.
    #[arg(long = "cross-sheet", value_name = "SHEET", requires = "column")]
    pub cross_sheet: Option<String>,

    /// Only look at this column in target sheets.
    #[arg(long = "target-column", value_name = "COLUMN", requires = "column")]
    pub target_column: Option<String>,

    /// Show image details and only scan the first rows of each target sheet.
    #[arg(long = "debug")]
    pub debug: bool,

    /// Report embedded images of the selected sheet.
    #[arg(long = "images")]
    pub images: bool,

    /// Write embedded images of the selected sheet into DIR.
    #[arg(long = "extract-images", value_name = "DIR")]
    pub extract_images: Option<String>,

    /// Report format written to stdout.
    #[arg(long = "format", value_enum, default_value = "markdown")]
    pub format: OutputFormatArg,

    /// Memory ceiling for decoded sheet data, in MiB.
    #[arg(long = "memory", value_name = "MB")]
    pub memory: Option<String>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Markdown,
    Json,
}

impl Cli {
    pub fn inspect_options(&self, extract_images: Option<PathBuf>) -> InspectOptions {
        InspectOptions {
            list_sheets_only: self.sheets,
            sheet: self.sheet.clone(),
            column: self.column.clone(),
            cross_sheet: self.cross_sheet.clone(),
            target_column: self.target_column.clone(),
            debug: self.debug,
            images: self.images,
            extract_images,
        }
    }
}

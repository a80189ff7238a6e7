//! Statistical inspection of spreadsheet workbooks: sheet inventories,
//! per-column fill rates and value distributions, embedded image inventories
//! and cross-sheet value matching.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod render;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
pub use services::{InspectOptions, Inspector};

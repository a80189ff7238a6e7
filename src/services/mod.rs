pub mod excel;
pub mod inspector;
pub mod report;

pub use inspector::{InspectOptions, Inspector};

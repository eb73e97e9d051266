pub mod json_export;
pub mod text_export;

use anyhow::Result;
use std::path::PathBuf;

use crate::core::model::ExtractionReport;

pub use json_export::JsonExporter;
pub use text_export::TextExporter;

pub trait Exporter {
    /// Writes the report and returns the path of the written file.
    fn export(&self, report: &ExtractionReport) -> Result<PathBuf>;
}

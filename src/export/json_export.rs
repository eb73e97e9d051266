use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::model::ExtractionReport;
use crate::export::Exporter;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl Exporter for JsonExporter {
    fn export(&self, report: &ExtractionReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self
            .out_dir
            .join(format!("{}.json", report.source.report_stem()));
        let data = serde_json::to_string_pretty(report)?;
        fs::write(&path, data)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{PageOutcome, RecognizedSegment, Source};

    #[test]
    fn writes_report_that_reads_back() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let segments = RecognizedSegment::new("Hello", 0.5).into_iter().collect();
        let report = ExtractionReport::new(
            Source::Image("scan.jpg".into()),
            vec![PageOutcome::Recognized(segments).into_result(1)],
            0.25,
        );

        let path = JsonExporter::new(dir.path().to_path_buf()).export(&report)?;

        assert_eq!(path, dir.path().join("image_extraction_results.json"));
        let parsed: ExtractionReport = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(parsed, report);
        Ok(())
    }
}

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::model::{ExtractionReport, Source};
use crate::export::Exporter;

const RULE_WIDTH: usize = 50;

#[derive(Debug, Clone)]
pub struct TextExporter {
    out_dir: PathBuf,
}

impl TextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn render(report: &ExtractionReport) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let title = match report.source {
            Source::Document(_) => "PDF",
            Source::Image(_) => "IMAGE",
        };
        let stats = &report.stats;

        let mut out = String::new();
        out.push_str(&format!("=== PADDLEOCR {title} EXTRACTION RESULTS ===\n"));
        out.push_str(&format!(
            "{}: {}\n",
            report.source.label(),
            report.source.path().display()
        ));
        out.push_str(&format!("Total pages: {}\n", stats.pages));
        out.push_str(&format!("Total segments: {}\n", stats.segments));
        out.push_str(&format!("Total characters: {}\n", stats.characters));
        out.push_str(&format!(
            "Average confidence: {:.3}\n",
            stats.mean_confidence
        ));
        out.push_str(&format!(
            "Processing time: {:.2} seconds\n",
            report.processing_secs
        ));
        out.push_str(&format!("{rule}\n\n"));

        for page in &report.pages {
            out.push_str(&format!("\n--- PAGE {} ---\n", page.page));
            for segment in &page.segments {
                out.push_str(&format!(
                    "{} (confidence: {:.3})\n",
                    segment.text, segment.confidence
                ));
            }
            if let Some(reason) = &page.failure {
                out.push_str(&format!("[no text: {reason}]\n"));
            }
        }

        out.push_str(&format!("\n{rule}\n"));
        out.push_str("CLEAN TEXT (ALL PAGES COMBINED):\n");
        out.push_str(&format!("{rule}\n"));
        for text in report.transcript() {
            out.push_str(text);
            out.push('\n');
        }
        out
    }
}

impl Exporter for TextExporter {
    fn export(&self, report: &ExtractionReport) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self
            .out_dir
            .join(format!("{}.txt", report.source.report_stem()));
        fs::write(&path, Self::render(report))
            .with_context(|| format!("failed to write report {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{PageOutcome, RecognizedSegment};
    use pretty_assertions::assert_eq;

    fn sample_report() -> ExtractionReport {
        let seg = |text: &str, confidence: f32| {
            RecognizedSegment::new(text, confidence).expect("non-empty segment")
        };
        let pages = vec![
            PageOutcome::Recognized(vec![seg("Hello", 0.9), seg("World", 0.8)]).into_result(1),
            PageOutcome::Failed("engine crashed".to_string()).into_result(2),
        ];
        ExtractionReport::new(Source::Document("pdfs/A.pdf".into()), pages, 2.0)
    }

    #[test]
    fn renders_header_pages_and_transcript() {
        let text = TextExporter::render(&sample_report());
        let expected = "\
=== PADDLEOCR PDF EXTRACTION RESULTS ===
PDF: pdfs/A.pdf
Total pages: 2
Total segments: 2
Total characters: 10
Average confidence: 0.850
Processing time: 2.00 seconds
==================================================


--- PAGE 1 ---
Hello (confidence: 0.900)
World (confidence: 0.800)

--- PAGE 2 ---
[no text: engine crashed]

==================================================
CLEAN TEXT (ALL PAGES COMBINED):
==================================================
Hello
World
";
        assert_eq!(text, expected);
    }

    #[test]
    fn writes_report_named_after_source() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = TextExporter::new(dir.path().to_path_buf()).export(&sample_report())?;
        assert_eq!(path, dir.path().join("pdf_extraction_results.txt"));
        assert!(fs::read_to_string(&path)?.contains("--- PAGE 2 ---"));
        Ok(())
    }
}

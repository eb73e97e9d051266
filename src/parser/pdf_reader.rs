use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::model::Document;

#[derive(Debug, Clone)]
pub struct PdfReader {
    path: PathBuf,
}

impl PdfReader {
    pub fn new(path: PathBuf) -> Result<Self> {
        if !path.is_file() {
            anyhow::bail!("PDF does not exist: {}", path.display());
        }
        Ok(Self { path })
    }

    pub fn page_count(&self) -> Result<usize> {
        get_page_count(&self.path)
    }

    pub fn open(&self) -> Result<Document> {
        Ok(Document {
            path: self.path.clone(),
            page_count: self.page_count()?,
        })
    }
}

fn get_page_count(pdf_path: &Path) -> Result<usize> {
    let output = Command::new("pdfinfo")
        .arg(pdf_path)
        .output()
        .with_context(|| format!("failed to invoke pdfinfo on {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("pdfinfo failed with status {}: {}", output.status, stderr.trim());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_page_count(&stdout)
        .with_context(|| format!("unreadable pdfinfo output for {}", pdf_path.display()))
}

fn parse_page_count(info: &str) -> Result<usize> {
    for line in info.lines() {
        if let Some(rest) = line.strip_prefix("Pages:") {
            let num_str = rest.trim();
            let pages: usize = num_str.parse().with_context(|| {
                format!("failed to parse page count from 'Pages:' line: {num_str}")
            })?;
            return Ok(pages);
        }
    }

    anyhow::bail!("pdfinfo output did not contain a 'Pages:' line");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_pages_line() -> Result<()> {
        let info = "Title:          scan\nProducer:       scanner\nPages:          3\nEncrypted:      no\n";
        assert_eq!(parse_page_count(info)?, 3);
        Ok(())
    }

    #[test]
    fn rejects_missing_pages_line() {
        assert!(parse_page_count("Title: scan\n").is_err());
        assert!(parse_page_count("Pages: many\n").is_err());
    }

    #[test]
    fn rejects_missing_file() {
        assert!(PdfReader::new(PathBuf::from("does/not/exist.pdf")).is_err());
    }
}

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::core::model::{Document, PageImage};
use crate::ocr::Rasterizer;
use crate::parser::PdfReader;

pub const DEFAULT_DPI: u32 = 300;

/// Renders PDF pages to PNG files with poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct PageRenderer {
    out_dir: PathBuf,
    dpi: u32,
}

impl PageRenderer {
    pub fn new(out_dir: PathBuf, dpi: u32) -> Self {
        Self { out_dir, dpi }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    fn prefix(&self, page: usize) -> PathBuf {
        self.out_dir.join(format!("temp_page_{page}"))
    }
}

impl Rasterizer for PageRenderer {
    fn open(&self, path: &Path) -> Result<Document> {
        PdfReader::new(path.to_path_buf())?.open()
    }

    fn page_path(&self, page: usize) -> PathBuf {
        self.prefix(page).with_extension("png")
    }

    fn render_page(&self, document: &Document, page: usize) -> Result<PageImage> {
        if page == 0 || page > document.page_count {
            anyhow::bail!(
                "page {page} is out of range (document has {} pages)",
                document.page_count
            );
        }
        fs::create_dir_all(&self.out_dir)?;

        let prefix = self.prefix(page);
        let prefix_str = prefix
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("non-UTF8 output path not supported"))?;

        // -singlefile writes `<prefix>.png` without a page-number suffix
        let status = Command::new("pdftoppm")
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg("-singlefile")
            .arg(&document.path)
            .arg(prefix_str)
            .status()
            .with_context(|| "failed to invoke pdftoppm; is poppler-utils installed?")?;

        if !status.success() {
            anyhow::bail!("pdftoppm failed with status: {status}");
        }

        let image_path = self.page_path(page);
        if !image_path.exists() {
            anyhow::bail!(
                "expected rendered image not found: {}",
                image_path.display()
            );
        }

        let (width, height) = image::image_dimensions(&image_path)
            .with_context(|| format!("cannot read rendered image {}", image_path.display()))?;

        Ok(PageImage {
            page,
            path: image_path,
            width,
            height,
        })
    }
}

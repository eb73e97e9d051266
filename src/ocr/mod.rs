pub mod bridge;
pub mod normalize;
pub mod renderer;

pub use bridge::{BridgeConfig, OcrBridge};
pub use normalize::{classify, normalize, ResultShape};
pub use renderer::PageRenderer;

use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::core::model::{Document, PageImage};

/// Turns a source document into one raster image per page.
pub trait Rasterizer {
    fn open(&self, path: &Path) -> Result<Document>;

    /// Scratch location `render_page` writes page `page` (1-based) to.
    fn page_path(&self, page: usize) -> PathBuf;

    fn render_page(&self, document: &Document, page: usize) -> Result<PageImage>;
}

/// An OCR engine handle, created once and reused for every page.
pub trait OcrEngine {
    /// Runs detection and recognition on one image and returns the
    /// engine's raw result, to be flattened by [`normalize`].
    fn recognize(&mut self, image: &Path) -> Result<Value>;
}

impl<E: OcrEngine + ?Sized> OcrEngine for &mut E {
    fn recognize(&mut self, image: &Path) -> Result<Value> {
        (**self).recognize(image)
    }
}

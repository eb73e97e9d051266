use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use log::debug;

use crate::core::model::PageImage;

pub const DEFAULT_MAX_DIMENSION: u32 = 1200;

/// Dimensions after scaling the longer side down to `max_dimension`.
///
/// Returns `None` when the image already fits. Both sides use the same
/// scale factor and are rounded to the nearest pixel.
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    let longest = width.max(height);
    if longest <= max_dimension {
        return None;
    }
    let scale = f64::from(max_dimension) / f64::from(longest);
    let scaled = |side: u32| ((f64::from(side) * scale).round() as u32).max(1);
    Some((scaled(width), scaled(height)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prepared {
    Original(PathBuf),
    Resized {
        path: PathBuf,
        width: u32,
        height: u32,
    },
}

impl Prepared {
    pub fn path(&self) -> &Path {
        match self {
            Prepared::Original(path) | Prepared::Resized { path, .. } => path,
        }
    }

    pub fn is_resized(&self) -> bool {
        matches!(self, Prepared::Resized { .. })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Preprocessor {
    max_dimension: u32,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIMENSION)
    }
}

impl Preprocessor {
    pub fn new(max_dimension: u32) -> Self {
        Self { max_dimension }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Downsizes `image` into `target` when it exceeds the threshold.
    ///
    /// The source file is never modified. `target` must differ from it.
    pub fn prepare(&self, image: &PageImage, target: &Path) -> Result<Prepared> {
        let Some((width, height)) = fit_within(image.width, image.height, self.max_dimension)
        else {
            debug!(
                "page {}: using original size {}x{}",
                image.page, image.width, image.height
            );
            return Ok(Prepared::Original(image.path.clone()));
        };

        if target == image.path {
            anyhow::bail!(
                "refusing to overwrite source image {}",
                image.path.display()
            );
        }

        let decoded = image::open(&image.path)
            .with_context(|| format!("cannot load image {}", image.path.display()))?;
        let resized = decoded.resize_exact(width, height, FilterType::Triangle);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create scratch directory {}", parent.display())
            })?;
        }
        DynamicImage::ImageRgb8(resized.to_rgb8())
            .save(target)
            .with_context(|| format!("failed to write resized image {}", target.display()))?;

        debug!(
            "page {}: resized from {}x{} to {}x{}",
            image.page, image.width, image.height, width, height
        );
        Ok(Prepared::Resized {
            path: target.to_path_buf(),
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use pretty_assertions::assert_eq;

    fn write_png(path: &Path, width: u32, height: u32) -> Result<PageImage> {
        RgbImage::from_pixel(width, height, Rgb([255, 255, 255])).save(path)?;
        Ok(PageImage {
            page: 1,
            path: path.to_path_buf(),
            width,
            height,
        })
    }

    #[test]
    fn scales_longest_side_to_threshold() {
        assert_eq!(fit_within(2000, 1000, 1200), Some((1200, 600)));
        assert_eq!(fit_within(1000, 2000, 1200), Some((600, 1200)));
        assert_eq!(fit_within(1650, 1275, 1200), Some((1200, 927)));
    }

    #[test]
    fn leaves_small_images_alone() {
        assert_eq!(fit_within(800, 600, 1200), None);
        assert_eq!(fit_within(1200, 1200, 1200), None);
    }

    #[test]
    fn never_scales_a_side_to_zero() {
        assert_eq!(fit_within(5000, 1, 1000), Some((1000, 1)));
    }

    #[test]
    fn resizes_large_image_to_scratch_copy() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let page = write_png(&dir.path().join("temp_page_1.png"), 2000, 1000)?;
        let target = dir.path().join("resized_page_1.jpg");

        let prepared = Preprocessor::new(1200).prepare(&page, &target)?;

        assert_eq!(
            prepared,
            Prepared::Resized {
                path: target.clone(),
                width: 1200,
                height: 600,
            }
        );
        assert_eq!(image::image_dimensions(&target)?, (1200, 600));
        assert_eq!(image::image_dimensions(&page.path)?, (2000, 1000));
        Ok(())
    }

    #[test]
    fn creates_missing_scratch_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let page = write_png(&dir.path().join("scan.png"), 1650, 1275)?;
        let target = dir.path().join("results").join("resized_image_for_ocr.jpg");

        let prepared = Preprocessor::default().prepare(&page, &target)?;

        assert!(prepared.is_resized());
        assert_eq!(image::image_dimensions(&target)?, (1200, 927));
        Ok(())
    }

    #[test]
    fn small_image_passes_through_without_copy() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let page = write_png(&dir.path().join("scan.png"), 800, 600)?;
        let target = dir.path().join("resized_image_for_ocr.jpg");

        let prepared = Preprocessor::default().prepare(&page, &target)?;

        assert_eq!(prepared, Prepared::Original(page.path.clone()));
        assert!(!prepared.is_resized());
        assert!(!target.exists());
        Ok(())
    }
}

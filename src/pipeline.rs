use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::core::model::{
    ExtractionReport, PageImage, PageOutcome, PageResult, RecognizedSegment, RunOutcome, Source,
};
use crate::export::{Exporter, JsonExporter, TextExporter};
use crate::ocr::renderer::DEFAULT_DPI;
use crate::ocr::{normalize, OcrEngine, Rasterizer};
use crate::preprocess::{Preprocessor, DEFAULT_MAX_DIMENSION};
use crate::scratch::ScratchFiles;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub scratch_dir: PathBuf,
    pub dpi: u32,
    pub max_dimension: u32,
    pub write_json: bool,
}

impl PipelineConfig {
    pub fn new(input: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            input,
            scratch_dir: output_dir.clone(),
            output_dir,
            dpi: DEFAULT_DPI,
            max_dimension: DEFAULT_MAX_DIMENSION,
            write_json: false,
        }
    }

    pub fn with_scratch_dir(mut self, scratch_dir: PathBuf) -> Self {
        self.scratch_dir = scratch_dir;
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn with_json(mut self, write_json: bool) -> Self {
        self.write_json = write_json;
        self
    }
}

/// Rasterizes every page of a document, runs OCR on each and writes the
/// report. `connect` is called once, after rasterization succeeded.
///
/// Scratch images are removed on every exit path, including errors.
pub fn run_document<R, E, F>(
    config: &PipelineConfig,
    rasterizer: &R,
    connect: F,
) -> Result<RunOutcome>
where
    R: Rasterizer,
    E: OcrEngine,
    F: FnOnce() -> Result<E>,
{
    if !config.input.exists() {
        warn!("file not found: {}", config.input.display());
        return Ok(RunOutcome::NotFound(config.input.clone()));
    }
    info!("processing PDF: {}", config.input.display());

    let mut scratch = ScratchFiles::new();
    let images = match rasterize(rasterizer, &config.input, &mut scratch) {
        Ok(images) if !images.is_empty() => images,
        Ok(_) => {
            let reason = "document has no pages".to_string();
            return Ok(conversion_failed(config, &mut scratch, reason));
        }
        Err(err) => {
            return Ok(conversion_failed(config, &mut scratch, format!("{err:#}")));
        }
    };
    info!("PDF conversion complete: {} images created", images.len());

    let mut engine = connect().context("failed to initialize OCR engine")?;
    let preprocessor = Preprocessor::new(config.max_dimension);

    let mut ocr_time = Duration::ZERO;
    let mut pages = Vec::with_capacity(images.len());
    for image in &images {
        let target = config
            .scratch_dir
            .join(format!("resized_page_{}.jpg", image.page));
        let outcome = process_page(
            image,
            &target,
            &preprocessor,
            &mut engine,
            &mut scratch,
            &mut ocr_time,
        );
        pages.push(outcome.into_result(image.page));
    }

    let source = Source::Document(config.input.clone());
    let outcome = finalize(config, source, pages, ocr_time);
    finish(&mut scratch);
    outcome
}

/// Runs OCR on a single image, treated as page 1.
///
/// The input image itself is never deleted; only a downsized copy is.
pub fn run_image<E, F>(config: &PipelineConfig, connect: F) -> Result<RunOutcome>
where
    E: OcrEngine,
    F: FnOnce() -> Result<E>,
{
    if !config.input.exists() {
        warn!("file not found: {}", config.input.display());
        return Ok(RunOutcome::NotFound(config.input.clone()));
    }
    info!("processing image: {}", config.input.display());

    let source = Source::Image(config.input.clone());
    let image = match image::image_dimensions(&config.input) {
        Ok((width, height)) => PageImage {
            page: 1,
            path: config.input.clone(),
            width,
            height,
        },
        Err(err) => {
            warn!("cannot load image {}: {err}", config.input.display());
            let page = PageOutcome::Failed(format!("cannot load image: {err}")).into_result(1);
            return finalize(config, source, vec![page], Duration::ZERO);
        }
    };
    debug!("image loaded: {}x{}", image.width, image.height);

    let mut scratch = ScratchFiles::new();
    let mut engine = connect().context("failed to initialize OCR engine")?;
    let preprocessor = Preprocessor::new(config.max_dimension);
    let target = config.scratch_dir.join("resized_image_for_ocr.jpg");

    let mut ocr_time = Duration::ZERO;
    let outcome = process_page(
        &image,
        &target,
        &preprocessor,
        &mut engine,
        &mut scratch,
        &mut ocr_time,
    );
    let pages = vec![outcome.into_result(image.page)];

    let outcome = finalize(config, source, pages, ocr_time);
    finish(&mut scratch);
    outcome
}

fn rasterize<R: Rasterizer>(
    rasterizer: &R,
    path: &Path,
    scratch: &mut ScratchFiles,
) -> Result<Vec<PageImage>> {
    let document = rasterizer.open(path)?;
    info!("PDF opened: {} pages", document.page_count);

    let mut images = Vec::with_capacity(document.page_count);
    for page in 1..=document.page_count {
        scratch.track(rasterizer.page_path(page));
        let image = rasterizer
            .render_page(&document, page)
            .with_context(|| format!("failed to convert page {page}"))?;
        scratch.track(&image.path);
        debug!("page {page} saved as {}", image.path.display());
        images.push(image);
    }
    Ok(images)
}

fn conversion_failed(
    config: &PipelineConfig,
    scratch: &mut ScratchFiles,
    reason: String,
) -> RunOutcome {
    warn!("failed to convert PDF to images: {reason}");
    finish(scratch);
    RunOutcome::ConversionFailed {
        path: config.input.clone(),
        reason,
    }
}

/// Runs one page through pre-processing, OCR and normalization. Failures are
/// contained here and reported as [`PageOutcome::Failed`].
fn process_page<E: OcrEngine>(
    image: &PageImage,
    target: &Path,
    preprocessor: &Preprocessor,
    engine: &mut E,
    scratch: &mut ScratchFiles,
    ocr_time: &mut Duration,
) -> PageOutcome {
    info!("processing page {}", image.page);
    match recognize_page(image, target, preprocessor, engine, scratch, ocr_time) {
        Ok(segments) => {
            if segments.is_empty() {
                warn!("page {}: no text extracted", image.page);
            } else {
                info!("page {}: {} text segments", image.page, segments.len());
            }
            PageOutcome::Recognized(segments)
        }
        Err(err) => {
            warn!("error processing page {}: {err:#}", image.page);
            PageOutcome::Failed(format!("{err:#}"))
        }
    }
}

fn recognize_page<E: OcrEngine>(
    image: &PageImage,
    target: &Path,
    preprocessor: &Preprocessor,
    engine: &mut E,
    scratch: &mut ScratchFiles,
    ocr_time: &mut Duration,
) -> Result<Vec<RecognizedSegment>> {
    if target != image.path {
        scratch.track(target);
    }
    let prepared = preprocessor.prepare(image, target)?;

    let started = Instant::now();
    let raw = engine.recognize(prepared.path());
    let elapsed = started.elapsed();
    *ocr_time += elapsed;
    let raw = raw.with_context(|| format!("OCR failed on {}", prepared.path().display()))?;
    debug!(
        "page {} processed in {:.2} seconds",
        image.page,
        elapsed.as_secs_f64()
    );

    let segments = normalize(&raw);
    if segments.is_empty() {
        debug!("page {}: raw OCR result: {raw}", image.page);
    }
    Ok(segments)
}

fn finalize(
    config: &PipelineConfig,
    source: Source,
    pages: Vec<PageResult>,
    ocr_time: Duration,
) -> Result<RunOutcome> {
    if pages.iter().all(PageResult::is_empty) {
        warn!("no text extracted from any page");
        return Ok(RunOutcome::NoText { pages });
    }

    let report = ExtractionReport::new(source, pages, ocr_time.as_secs_f64());
    let mut written = Vec::new();
    written.push(TextExporter::new(config.output_dir.clone()).export(&report)?);
    if config.write_json {
        written.push(JsonExporter::new(config.output_dir.clone()).export(&report)?);
    }
    for path in &written {
        info!("results saved to: {}", path.display());
    }

    Ok(RunOutcome::Completed { report, written })
}

fn finish(scratch: &mut ScratchFiles) {
    let removed = scratch.cleanup();
    if removed > 0 {
        info!("cleaned up {removed} temporary files");
    }
}

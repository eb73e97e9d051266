use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A source document opened for rasterization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub page_count: usize,
}

/// A raster image of one page. `page` is 1-based.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageImage {
    pub page: usize,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecognizedSegment {
    pub text: String,
    pub confidence: f32,
}

impl RecognizedSegment {
    /// Builds a segment from raw engine output.
    ///
    /// The text is trimmed and rejected when nothing is left. Confidence is
    /// clamped to `[0, 1]`; non-finite scores fall back to `1.0`.
    pub fn new(text: &str, confidence: f32) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Some(Self {
            text: text.to_string(),
            confidence,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageResult {
    pub page: usize,
    pub segments: Vec<RecognizedSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl PageResult {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Result of processing a single page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Recognized(Vec<RecognizedSegment>),
    Failed(String),
}

impl PageOutcome {
    pub fn into_result(self, page: usize) -> PageResult {
        match self {
            PageOutcome::Recognized(segments) => PageResult {
                page,
                segments,
                failure: None,
            },
            PageOutcome::Failed(reason) => PageResult {
                page,
                segments: Vec::new(),
                failure: Some(reason),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum Source {
    Document(PathBuf),
    Image(PathBuf),
}

impl Source {
    pub fn path(&self) -> &Path {
        match self {
            Source::Document(path) | Source::Image(path) => path,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Source::Document(_) => "PDF",
            Source::Image(_) => "Image",
        }
    }

    /// Base name of the report files written for this source.
    pub fn report_stem(&self) -> &'static str {
        match self {
            Source::Document(_) => "pdf_extraction_results",
            Source::Image(_) => "image_extraction_results",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReportStats {
    pub pages: usize,
    pub segments: usize,
    pub characters: usize,
    pub mean_confidence: f32,
}

impl ReportStats {
    pub fn from_pages(pages: &[PageResult]) -> Self {
        let segments = pages.iter().flat_map(|page| page.segments.iter());
        let mut count = 0usize;
        let mut characters = 0usize;
        let mut confidence_sum = 0.0f64;
        for segment in segments {
            count += 1;
            characters += segment.text.chars().count();
            confidence_sum += f64::from(segment.confidence);
        }
        let mean_confidence = if count == 0 {
            0.0
        } else {
            (confidence_sum / count as f64) as f32
        };
        Self {
            pages: pages.len(),
            segments: count,
            characters,
            mean_confidence,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionReport {
    pub source: Source,
    pub pages: Vec<PageResult>,
    pub stats: ReportStats,
    pub processing_secs: f64,
}

impl ExtractionReport {
    pub fn new(source: Source, mut pages: Vec<PageResult>, processing_secs: f64) -> Self {
        pages.sort_by_key(|page| page.page);
        let stats = ReportStats::from_pages(&pages);
        Self {
            source,
            pages,
            stats,
            processing_secs,
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &RecognizedSegment> {
        self.pages.iter().flat_map(|page| page.segments.iter())
    }

    /// All recognized texts in page order, confidence stripped.
    pub fn transcript(&self) -> Vec<&str> {
        self.segments().map(|segment| segment.text.as_str()).collect()
    }
}

/// Terminal state of a pipeline run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    NotFound(PathBuf),
    ConversionFailed { path: PathBuf, reason: String },
    NoText { pages: Vec<PageResult> },
    Completed {
        report: ExtractionReport,
        written: Vec<PathBuf>,
    },
}

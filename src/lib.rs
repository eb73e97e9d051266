pub mod core;
pub mod export;
pub mod ocr;
pub mod parser;
pub mod pipeline;
pub mod preprocess;
pub mod scratch;

pub use crate::core::model::{ExtractionReport, PageResult, RecognizedSegment, RunOutcome};
pub use pipeline::{run_document, run_image, PipelineConfig};

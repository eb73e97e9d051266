//! Normalization of raw OCR engine output.
//!
//! PaddleOCR has returned two result layouts over its releases:
//!
//! * batch results: a list of objects carrying parallel `rec_texts` and
//!   `rec_scores` arrays;
//! * legacy results: a list of pages, each a list of
//!   `[box, [text, confidence]]` detections.
//!
//! Each top-level element is classified on its own, so mixed batches are
//! handled too. Nothing here fails: unknown layouts contribute no segments.

use log::debug;
use serde_json::{Map, Value};

use crate::core::model::RecognizedSegment;

const TEXTS_KEY: &str = "rec_texts";
const SCORES_KEY: &str = "rec_scores";
const DEFAULT_CONFIDENCE: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultShape<'a> {
    BatchDict(&'a Map<String, Value>),
    LegacyList(&'a [Value]),
    Unrecognized,
}

pub fn classify(element: &Value) -> ResultShape<'_> {
    match element {
        Value::Object(map) if map.get(TEXTS_KEY).is_some_and(Value::is_array) => {
            ResultShape::BatchDict(map)
        }
        Value::Array(detections) => ResultShape::LegacyList(detections),
        _ => ResultShape::Unrecognized,
    }
}

/// Flattens an engine result into ordered segments.
pub fn normalize(result: &Value) -> Vec<RecognizedSegment> {
    let Some(elements) = result.as_array() else {
        debug!("OCR result is not a list; treating as empty");
        return Vec::new();
    };

    let mut segments = Vec::new();
    for element in elements {
        match classify(element) {
            ResultShape::BatchDict(map) => segments.extend(from_batch_dict(map)),
            ResultShape::LegacyList(detections) => segments.extend(from_legacy_list(detections)),
            ResultShape::Unrecognized => {
                debug!("skipping unrecognized OCR result element");
            }
        }
    }
    segments
}

fn from_batch_dict(map: &Map<String, Value>) -> Vec<RecognizedSegment> {
    let texts = map
        .get(TEXTS_KEY)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    // Scores are only trusted when they line up 1:1 with the texts.
    let scores = map
        .get(SCORES_KEY)
        .and_then(Value::as_array)
        .filter(|scores| scores.len() == texts.len());
    if scores.is_none() {
        debug!(
            "{} texts without matching scores; defaulting confidence to {DEFAULT_CONFIDENCE}",
            texts.len()
        );
    }

    texts
        .iter()
        .enumerate()
        .filter_map(|(idx, text)| {
            let confidence = scores
                .and_then(|scores| scores[idx].as_f64())
                .map_or(DEFAULT_CONFIDENCE, |score| score as f32);
            RecognizedSegment::new(text.as_str()?, confidence)
        })
        .collect()
}

fn from_legacy_list(detections: &[Value]) -> Vec<RecognizedSegment> {
    detections.iter().filter_map(from_detection).collect()
}

fn from_detection(detection: &Value) -> Option<RecognizedSegment> {
    let fields = detection.as_array().filter(|fields| fields.len() >= 2)?;
    let text_info = fields[1].as_array()?;
    let text = text_info.first()?.as_str()?;
    let confidence = text_info
        .get(1)
        .and_then(Value::as_f64)
        .map_or(DEFAULT_CONFIDENCE, |score| score as f32);
    RecognizedSegment::new(text, confidence)
}

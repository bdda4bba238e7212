//! Transcript assembly
//!
//! Runs a gloss model over fixed-size sliding windows of a signing segment
//! and collapses the window predictions into an ordered list of glosses.
//! The model itself is external and plugged in through `GlossPredictor`.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::landmarks::HolisticFrame;

/// Error reported by a gloss model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct PredictorError(pub String);

/// Errors raised while assembling a transcript
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranscriptError {
    #[error("Invalid window: size {size}, stride {stride} (both must be non-zero)")]
    InvalidWindow { size: usize, stride: usize },
    #[error("Prediction failed for frames {start}..{end}: {source}")]
    Predictor {
        start: usize,
        end: usize,
        #[source]
        source: PredictorError,
    },
}

/// One model prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub gloss: String,
    /// Model score; the scale is whatever the model reports
    pub confidence: f32,
}

impl Prediction {
    pub fn new(gloss: impl Into<String>, confidence: f32) -> Self {
        Self {
            gloss: gloss.into(),
            confidence,
        }
    }
}

/// Gloss classification model over a run of frames
pub trait GlossPredictor {
    fn predict(&mut self, frames: &[HolisticFrame]) -> Result<Prediction, PredictorError>;
}

impl<F> GlossPredictor for F
where
    F: FnMut(&[HolisticFrame]) -> Result<Prediction, PredictorError>,
{
    fn predict(&mut self, frames: &[HolisticFrame]) -> Result<Prediction, PredictorError> {
        self(frames)
    }
}

/// Windowing and filtering parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Frames per prediction window
    pub window_size: usize,
    /// Frames between window starts
    pub stride: usize,
    /// Window predictions at or below this confidence are ignored
    pub min_confidence: f32,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            stride: 5,
            min_confidence: 7.0,
        }
    }
}

/// Ordered glosses recognised in a segment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub glosses: Vec<String>,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.glosses.is_empty()
    }

    /// Glosses joined by single spaces
    pub fn text(&self) -> String {
        self.glosses.join(" ")
    }
}

/// Window ranges for `len` frames
///
/// Windows start at 0 and advance by `stride` while a full window fits.
pub fn windows(len: usize, window_size: usize, stride: usize) -> impl Iterator<Item = Range<usize>> {
    let count = if window_size == 0 || stride == 0 || len < window_size {
        0
    } else {
        (len - window_size) / stride + 1
    };
    (0..count).map(move |i| {
        let start = i * stride;
        start..start + window_size
    })
}

/// Assemble a transcript for a run of frames
///
/// Inputs shorter than one window get a single prediction over all frames,
/// kept regardless of confidence. Otherwise a window's gloss is kept when
/// it clears `min_confidence` and differs from the last kept gloss.
pub fn transcribe<P>(
    frames: &[HolisticFrame],
    predictor: &mut P,
    config: &TranscriptConfig,
) -> Result<Transcript, TranscriptError>
where
    P: GlossPredictor + ?Sized,
{
    if config.window_size == 0 || config.stride == 0 {
        return Err(TranscriptError::InvalidWindow {
            size: config.window_size,
            stride: config.stride,
        });
    }

    if frames.is_empty() {
        return Ok(Transcript::default());
    }

    let predict = |predictor: &mut P, range: Range<usize>| {
        predictor
            .predict(&frames[range.clone()])
            .map_err(|source| TranscriptError::Predictor {
                start: range.start,
                end: range.end,
                source,
            })
    };

    if frames.len() < config.window_size {
        let prediction = predict(&mut *predictor, 0..frames.len())?;
        log::debug!(
            "All {} frames: {} ({:.2})",
            frames.len(),
            prediction.gloss,
            prediction.confidence
        );
        return Ok(Transcript {
            glosses: vec![prediction.gloss],
        });
    }

    let mut glosses: Vec<String> = Vec::new();
    for range in windows(frames.len(), config.window_size, config.stride) {
        let (start, end) = (range.start, range.end);
        let prediction = predict(&mut *predictor, range)?;
        log::debug!(
            "Window {}..{}: {} ({:.2})",
            start,
            end,
            prediction.gloss,
            prediction.confidence
        );

        let repeated = glosses.last().is_some_and(|last| *last == prediction.gloss);
        if prediction.confidence > config.min_confidence && !repeated {
            glosses.push(prediction.gloss);
        }
    }

    Ok(Transcript { glosses })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays scripted predictions and records the window lengths it saw
    struct Scripted {
        predictions: Vec<Prediction>,
        calls: Vec<usize>,
    }

    impl Scripted {
        fn new(predictions: &[(&str, f32)]) -> Self {
            Self {
                predictions: predictions
                    .iter()
                    .map(|&(g, c)| Prediction::new(g, c))
                    .collect(),
                calls: Vec::new(),
            }
        }
    }

    impl GlossPredictor for Scripted {
        fn predict(&mut self, frames: &[HolisticFrame]) -> Result<Prediction, PredictorError> {
            let i = self.calls.len();
            self.calls.push(frames.len());
            self.predictions
                .get(i)
                .cloned()
                .ok_or_else(|| PredictorError("script exhausted".to_string()))
        }
    }

    fn frames(n: usize) -> Vec<HolisticFrame> {
        vec![HolisticFrame::default(); n]
    }

    #[test]
    fn test_window_ranges() {
        let ranges: Vec<Range<usize>> = windows(22, 10, 5).collect();
        assert_eq!(ranges, vec![0..10, 5..15, 10..20]);
        assert_eq!(windows(10, 10, 5).count(), 1);
        assert_eq!(windows(9, 10, 5).count(), 0);
        assert_eq!(windows(20, 10, 0).count(), 0);
    }

    #[test]
    fn test_empty_input_skips_model() {
        let mut model = Scripted::new(&[]);
        let transcript = transcribe(&[], &mut model, &TranscriptConfig::default()).unwrap();
        assert!(transcript.is_empty());
        assert!(model.calls.is_empty());
    }

    #[test]
    fn test_short_input_keeps_low_confidence_prediction() {
        let mut model = Scripted::new(&[("hello", 1.0)]);
        let transcript = transcribe(&frames(4), &mut model, &TranscriptConfig::default()).unwrap();
        assert_eq!(transcript.glosses, vec!["hello"]);
        assert_eq!(model.calls, vec![4]);
    }

    #[test]
    fn test_windows_filtered_and_collapsed() {
        // 30 frames -> windows at 0, 5, 10, 15, 20
        let mut model = Scripted::new(&[
            ("hello", 9.0),
            ("hello", 9.5),
            ("noise", 3.0),
            ("world", 8.0),
            ("hello", 7.5),
        ]);
        let transcript = transcribe(&frames(30), &mut model, &TranscriptConfig::default()).unwrap();

        assert_eq!(model.calls, vec![10; 5]);
        assert_eq!(transcript.glosses, vec!["hello", "world", "hello"]);
        assert_eq!(transcript.text(), "hello world hello");
    }

    #[test]
    fn test_repeat_compares_against_last_kept_gloss() {
        // The low-confidence "thanks" in between is not kept, so the second
        // "hello" still repeats the last kept gloss
        let mut model = Scripted::new(&[("hello", 9.0), ("thanks", 2.0), ("hello", 9.0)]);
        let transcript = transcribe(&frames(20), &mut model, &TranscriptConfig::default()).unwrap();
        assert_eq!(transcript.glosses, vec!["hello"]);
    }

    #[test]
    fn test_confidence_threshold_is_strict() {
        let mut model = Scripted::new(&[("hello", 7.0)]);
        let transcript = transcribe(&frames(10), &mut model, &TranscriptConfig::default()).unwrap();
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_predictor_error_propagates() {
        let mut model = Scripted::new(&[("hello", 9.0)]);
        let err = transcribe(&frames(15), &mut model, &TranscriptConfig::default()).unwrap_err();
        assert!(matches!(err, TranscriptError::Predictor { start: 5, end: 15, .. }));
    }

    #[test]
    fn test_invalid_window_rejected() {
        let mut model = Scripted::new(&[]);
        let config = TranscriptConfig {
            stride: 0,
            ..Default::default()
        };
        assert_eq!(
            transcribe(&frames(3), &mut model, &config),
            Err(TranscriptError::InvalidWindow { size: 10, stride: 0 })
        );
    }

    #[test]
    fn test_closure_predictor() {
        let mut model = |frames: &[HolisticFrame]| -> Result<Prediction, PredictorError> {
            Ok(Prediction::new(format!("len{}", frames.len()), 10.0))
        };
        let transcript = transcribe(&frames(10), &mut model, &TranscriptConfig::default()).unwrap();
        assert_eq!(transcript.glosses, vec!["len10"]);
    }
}

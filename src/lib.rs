//! Signing Detector - motion-based sign language activity detection
//!
//! Consumes per-frame holistic landmarks (pose, face, left and right hand)
//! produced by an external landmark model, measures frame-to-frame hand
//! motion, and flags whether the user is currently signing. Signing spans are
//! cut into segments which can be handed to a gloss model for transcription.

pub mod app;
pub mod classifier;
pub mod config;
pub mod detector;
pub mod landmarks;
pub mod logging;
pub mod motion;
pub mod replay;
pub mod segment;
pub mod transcript;

pub use app::{App, AppError, RunSummary};
pub use classifier::{classify, classify_motion, Classification, ClassifierConfig, ClassifierState, Transition};
pub use config::{ConfigError, DetectorConfig};
pub use detector::{DetectorStatus, FrameReport, SigningDetector, SigningEvent};
pub use landmarks::{HandFrame, Handedness, HolisticFrame, Landmark};
pub use motion::{HandPair, MotionSample};
pub use segment::{SegmentRecorder, SignSegment};
pub use transcript::{GlossPredictor, Prediction, Transcript, TranscriptConfig};

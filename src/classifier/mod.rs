//! Signing state classifier
//!
//! A two-state hysteresis machine over the per-frame average hand motion.
//! Entering the signing state needs a spike above `enter_threshold`; leaving
//! it needs more than `idle_frames` frames since motion last exceeded the
//! lower `activity_threshold`.

use serde::{Deserialize, Serialize};

use crate::motion::{HandPair, MotionError, MotionSample};

/// Average motion above which signing starts
pub const DEFAULT_ENTER_THRESHOLD: f32 = 0.7;

/// Average motion above which the frame counts as active
pub const DEFAULT_ACTIVITY_THRESHOLD: f32 = 0.11;

/// Frames without activity after which signing stops
pub const DEFAULT_IDLE_FRAMES: u64 = 20;

/// Classifier thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Average difference that switches signing on (strictly greater)
    pub enter_threshold: f32,
    /// Average difference that records activity (strictly greater)
    pub activity_threshold: f32,
    /// Frames since last activity after which signing switches off (strictly greater)
    pub idle_frames: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enter_threshold: DEFAULT_ENTER_THRESHOLD,
            activity_threshold: DEFAULT_ACTIVITY_THRESHOLD,
            idle_frames: DEFAULT_IDLE_FRAMES,
        }
    }
}

/// Per-instance classifier state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierState {
    /// Frame index of the last frame above the activity threshold
    pub last_change_frame: u64,
    /// Index of the next frame to classify
    pub current_frame: u64,
    pub is_signing: bool,
}

/// Change of the signing flag on a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Started,
    Stopped,
}

/// Result of classifying one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub is_signing: bool,
    /// State to carry into the next frame
    pub state: ClassifierState,
    pub transition: Option<Transition>,
}

/// Apply the threshold rules for one frame
///
/// `average_difference` is `None` when no hand could be compared; the rules
/// are skipped and only the frame counter advances.
pub fn classify_motion(
    state: ClassifierState,
    average_difference: Option<f32>,
    config: &ClassifierConfig,
) -> Classification {
    let mut next = state;

    if let Some(avg) = average_difference {
        if avg > config.enter_threshold {
            next.is_signing = true;
        }
        if avg > config.activity_threshold {
            next.last_change_frame = next.current_frame;
        }
        if next.current_frame.saturating_sub(next.last_change_frame) > config.idle_frames {
            next.is_signing = false;
        }
    }

    next.current_frame += 1;

    let transition = match (state.is_signing, next.is_signing) {
        (false, true) => Some(Transition::Started),
        (true, false) => Some(Transition::Stopped),
        _ => None,
    };

    Classification {
        is_signing: next.is_signing,
        state: next,
        transition,
    }
}

/// Measure both hands and classify the frame
pub fn classify(
    state: ClassifierState,
    hands: &HandPair<'_>,
    config: &ClassifierConfig,
) -> Result<Classification, MotionError> {
    let sample = MotionSample::measure(hands)?;
    Ok(classify_motion(state, sample.average(), config))
}

//! Signing detector
//!
//! Owns the previous hand frames and classifier state, classifies one
//! holistic frame per call, and publishes the result: a `FrameReport` to the
//! caller, `SigningEvent`s to subscribers when the flag changes, and the
//! latest `DetectorStatus` to anyone holding the shared status handle.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::classifier::{classify_motion, ClassifierConfig, ClassifierState, Transition};
use crate::landmarks::{HandFrame, Handedness, HolisticFrame};
use crate::motion::{HandPair, MotionSample};

/// Emitted when the signing flag changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SigningEvent {
    Started { frame_index: u64 },
    Stopped { frame_index: u64 },
}

impl SigningEvent {
    pub fn frame_index(&self) -> u64 {
        match self {
            SigningEvent::Started { frame_index } | SigningEvent::Stopped { frame_index } => *frame_index,
        }
    }
}

/// Outcome of processing one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameReport {
    /// Index of the processed frame
    pub frame_index: u64,
    /// Average motion per compared hand
    pub average_difference: Option<f32>,
    pub hands_compared: u32,
    pub is_signing: bool,
    pub transition: Option<Transition>,
}

/// Latest detector output, shared across threads
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DetectorStatus {
    /// Index of the last processed frame, `None` before the first
    pub frame_index: Option<u64>,
    pub is_signing: bool,
    pub average_difference: Option<f32>,
}

/// Read-only handle on the detector's latest status
#[derive(Clone)]
pub struct SharedStatus(Arc<Mutex<DetectorStatus>>);

impl SharedStatus {
    pub fn get(&self) -> DetectorStatus {
        *self.0.lock()
    }
}

/// Per-stream signing detector
pub struct SigningDetector {
    /// Classifier thresholds
    config: ClassifierConfig,
    /// Classifier state carried between frames
    state: ClassifierState,
    /// Last seen left hand
    previous_left: Option<HandFrame>,
    /// Last seen right hand
    previous_right: Option<HandFrame>,
    /// Latest status for other threads
    status: Arc<Mutex<DetectorStatus>>,
    /// Event subscribers
    subscribers: Vec<Sender<SigningEvent>>,
}

impl SigningDetector {
    /// Create a detector with the given thresholds
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            state: ClassifierState::default(),
            previous_left: None,
            previous_right: None,
            status: Arc::new(Mutex::new(DetectorStatus::default())),
            subscribers: Vec::new(),
        }
    }

    /// Process one frame of model output
    pub fn process(&mut self, frame: &HolisticFrame) -> FrameReport {
        let frame_index = self.state.current_frame;
        let mut sample = MotionSample::default();

        let hands = HandPair {
            previous_left: self.previous_left.as_ref(),
            left: frame.left_hand_landmarks.as_ref(),
            previous_right: self.previous_right.as_ref(),
            right: frame.right_hand_landmarks.as_ref(),
        };
        for handedness in Handedness::ALL {
            if let Err(e) = sample.accumulate_hand(&hands, handedness) {
                log::warn!(
                    "Frame {}: skipping {} hand motion: {}",
                    frame_index,
                    handedness.as_str(),
                    e
                );
            }
        }

        // An absent hand keeps its older frame as the comparison base
        if let Some(left) = &frame.left_hand_landmarks {
            self.previous_left = Some(left.clone());
        }
        if let Some(right) = &frame.right_hand_landmarks {
            self.previous_right = Some(right.clone());
        }

        let average_difference = sample.average();
        let classification = classify_motion(self.state, average_difference, &self.config);
        self.state = classification.state;

        log::trace!(
            "Frame {}: hands={} avg={:?} signing={}",
            frame_index,
            sample.hands_compared,
            average_difference,
            classification.is_signing
        );

        if let Some(transition) = classification.transition {
            let event = match transition {
                Transition::Started => SigningEvent::Started { frame_index },
                Transition::Stopped => SigningEvent::Stopped { frame_index },
            };
            log::info!("Signing {} at frame {}", transition_name(transition), frame_index);
            self.publish(event);
        }

        *self.status.lock() = DetectorStatus {
            frame_index: Some(frame_index),
            is_signing: classification.is_signing,
            average_difference,
        };

        FrameReport {
            frame_index,
            average_difference,
            hands_compared: sample.hands_compared,
            is_signing: classification.is_signing,
            transition: classification.transition,
        }
    }

    /// Receive an event each time signing starts or stops
    pub fn subscribe(&mut self) -> Receiver<SigningEvent> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    fn publish(&mut self, event: SigningEvent) {
        // Drop subscribers whose receiver is gone
        self.subscribers.retain(|s| s.send(event).is_ok());
    }

    /// Latest status
    pub fn status(&self) -> DetectorStatus {
        *self.status.lock()
    }

    /// Handle for reading the status from another thread
    pub fn shared_status(&self) -> SharedStatus {
        SharedStatus(self.status.clone())
    }

    /// Current classifier state
    pub fn state(&self) -> ClassifierState {
        self.state
    }

    pub fn is_signing(&self) -> bool {
        self.state.is_signing
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}

impl Default for SigningDetector {
    fn default() -> Self {
        Self::new(ClassifierConfig::default())
    }
}

fn transition_name(transition: Transition) -> &'static str {
    match transition {
        Transition::Started => "started",
        Transition::Stopped => "stopped",
    }
}

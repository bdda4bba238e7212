//! Landmark data model
//!
//! Mirrors the per-frame output of the holistic landmark model: optional pose,
//! face, left hand and right hand landmark lists in normalized coordinates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Landmarks per hand emitted by the hand model
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Errors raised while building or validating landmark data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LandmarkError {
    #[error("Invalid landmark data length: {0} (expected a multiple of 3)")]
    FlatLength(usize),
    #[error("Non-finite coordinate in {part} landmark {index}")]
    NonFinite { part: &'static str, index: usize },
}

/// A single 3D landmark point (normalized coordinates)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32, // 0-1 normalized
    pub y: f32, // 0-1 normalized
    #[serde(default)]
    pub z: f32, // Relative depth
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Sum of absolute per-axis differences (L1 distance)
    pub fn manhattan_distance(&self, other: &Landmark) -> f32 {
        (self.x - other.x).abs() + (self.y - other.y).abs() + (self.z - other.z).abs()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Ordered landmarks for one hand. Index order is anatomical.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandFrame {
    landmarks: Vec<Landmark>,
}

impl HandFrame {
    pub fn new(landmarks: Vec<Landmark>) -> Self {
        Self { landmarks }
    }

    /// Build a hand from packed x, y, z triples
    pub fn from_flat(data: &[f32]) -> Result<Self, LandmarkError> {
        if data.len() % 3 != 0 {
            return Err(LandmarkError::FlatLength(data.len()));
        }

        let landmarks = data
            .chunks_exact(3)
            .map(|c| Landmark::new(c[0], c[1], c[2]))
            .collect();

        Ok(Self { landmarks })
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    /// Whether the hand carries the full hand-model landmark set
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() == HAND_LANDMARK_COUNT
    }
}

/// Which hand a frame belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    /// Both hands, in the order they are measured
    pub const ALL: [Handedness; 2] = [Handedness::Right, Handedness::Left];

    pub fn as_str(&self) -> &'static str {
        match self {
            Handedness::Left => "left",
            Handedness::Right => "right",
        }
    }
}

/// Model output for one processed video frame
///
/// Keys follow the model's results object (`leftHandLandmarks`, ...). A
/// missing or null entry means the part was not detected in this frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolisticFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pose_landmarks: Option<Vec<Landmark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_landmarks: Option<Vec<Landmark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_hand_landmarks: Option<HandFrame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_hand_landmarks: Option<HandFrame>,
}

impl HolisticFrame {
    /// Frame with only hand data
    pub fn with_hands(left: Option<HandFrame>, right: Option<HandFrame>) -> Self {
        Self {
            left_hand_landmarks: left,
            right_hand_landmarks: right,
            ..Default::default()
        }
    }

    pub fn hand(&self, handedness: Handedness) -> Option<&HandFrame> {
        match handedness {
            Handedness::Left => self.left_hand_landmarks.as_ref(),
            Handedness::Right => self.right_hand_landmarks.as_ref(),
        }
    }

    /// Number of hands detected in this frame (0-2)
    pub fn hand_count(&self) -> usize {
        self.left_hand_landmarks.is_some() as usize + self.right_hand_landmarks.is_some() as usize
    }

    /// Reject frames carrying NaN or infinite coordinates
    pub fn validate(&self) -> Result<(), LandmarkError> {
        let parts: [(&'static str, Option<&[Landmark]>); 4] = [
            ("pose", self.pose_landmarks.as_deref()),
            ("face", self.face_landmarks.as_deref()),
            ("left hand", self.left_hand_landmarks.as_ref().map(HandFrame::landmarks)),
            ("right hand", self.right_hand_landmarks.as_ref().map(HandFrame::landmarks)),
        ];

        for (part, landmarks) in parts {
            let Some(landmarks) = landmarks else {
                continue;
            };
            if let Some(index) = landmarks.iter().position(|l| !l.is_finite()) {
                return Err(LandmarkError::NonFinite { part, index });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manhattan_distance() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(0.5, -0.25, 0.25);
        assert_eq!(a.manhattan_distance(&b), 1.0);
        assert_eq!(b.manhattan_distance(&a), 1.0);
    }

    #[test]
    fn test_hand_from_flat() {
        let hand = HandFrame::from_flat(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
        assert_eq!(hand.len(), 2);
        assert_eq!(hand.landmarks()[1], Landmark::new(0.4, 0.5, 0.6));
        assert!(!hand.is_complete());

        let full = HandFrame::from_flat(&[0.0; HAND_LANDMARK_COUNT * 3]).unwrap();
        assert!(full.is_complete());
    }

    #[test]
    fn test_hand_from_flat_rejects_partial_triples() {
        assert_eq!(
            HandFrame::from_flat(&[0.0; 4]),
            Err(LandmarkError::FlatLength(4))
        );
    }

    #[test]
    fn test_deserialize_model_results() {
        let json = r#"{
            "poseLandmarks": [{"x": 0.5, "y": 0.5, "z": -0.1, "visibility": 0.99}],
            "rightHandLandmarks": [{"x": 0.1, "y": 0.2, "z": 0.0}],
            "leftHandLandmarks": null
        }"#;

        let frame: HolisticFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.hand_count(), 1);
        assert!(frame.hand(Handedness::Left).is_none());
        assert_eq!(
            frame.hand(Handedness::Right).unwrap().landmarks(),
            &[Landmark::new(0.1, 0.2, 0.0)]
        );
        assert!(frame.face_landmarks.is_none());
    }

    #[test]
    fn test_missing_z_defaults_to_zero() {
        let landmark: Landmark = serde_json::from_str(r#"{"x": 0.25, "y": 0.75}"#).unwrap();
        assert_eq!(landmark.z, 0.0);
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let frame = HolisticFrame::with_hands(
            None,
            Some(HandFrame::new(vec![
                Landmark::new(0.0, 0.0, 0.0),
                Landmark::new(f32::NAN, 0.0, 0.0),
            ])),
        );

        assert_eq!(
            frame.validate(),
            Err(LandmarkError::NonFinite { part: "right hand", index: 1 })
        );
        assert!(HolisticFrame::default().validate().is_ok());
    }
}

//! Landmark differ
//!
//! Measures how far a hand moved between two consecutive frames as the sum of
//! per-landmark L1 distances, and averages that over the hands that could be
//! compared.

use thiserror::Error;

use crate::landmarks::{HandFrame, Handedness};

/// Errors raised while comparing hand frames
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MotionError {
    #[error("Hand landmark count changed between frames ({previous} -> {current})")]
    LandmarkCountMismatch { previous: usize, current: usize },
}

/// Total motion of one hand between two frames
///
/// Both frames must hold the same number of landmarks.
pub fn hand_difference(previous: &HandFrame, current: &HandFrame) -> Result<f32, MotionError> {
    if previous.len() != current.len() {
        return Err(MotionError::LandmarkCountMismatch {
            previous: previous.len(),
            current: current.len(),
        });
    }

    Ok(previous
        .landmarks()
        .iter()
        .zip(current.landmarks())
        .map(|(prev, cur)| prev.manhattan_distance(cur))
        .sum())
}

/// Previous and current frames for both hands
#[derive(Clone, Copy, Debug, Default)]
pub struct HandPair<'a> {
    pub previous_left: Option<&'a HandFrame>,
    pub left: Option<&'a HandFrame>,
    pub previous_right: Option<&'a HandFrame>,
    pub right: Option<&'a HandFrame>,
}

impl<'a> HandPair<'a> {
    fn frames(&self, handedness: Handedness) -> (Option<&'a HandFrame>, Option<&'a HandFrame>) {
        match handedness {
            Handedness::Left => (self.previous_left, self.left),
            Handedness::Right => (self.previous_right, self.right),
        }
    }
}

/// Accumulated motion for one frame
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotionSample {
    /// Sum of hand differences
    pub total_difference: f32,
    /// Hands that had both a previous and a current frame
    pub hands_compared: u32,
}

impl MotionSample {
    /// Measure both hands of a pair, failing on the first mismatched hand
    pub fn measure(pair: &HandPair<'_>) -> Result<Self, MotionError> {
        let mut sample = Self::default();
        for handedness in Handedness::ALL {
            sample.accumulate_hand(pair, handedness)?;
        }
        Ok(sample)
    }

    /// Add the motion of one hand of a pair
    pub fn accumulate_hand(&mut self, pair: &HandPair<'_>, handedness: Handedness) -> Result<(), MotionError> {
        let (previous, current) = pair.frames(handedness);
        self.accumulate(previous, current)
    }

    /// Add one hand's motion
    ///
    /// A hand without a previous or current frame contributes nothing and is
    /// not counted. On error the sample is left untouched.
    pub fn accumulate(
        &mut self,
        previous: Option<&HandFrame>,
        current: Option<&HandFrame>,
    ) -> Result<(), MotionError> {
        let (Some(previous), Some(current)) = (previous, current) else {
            return Ok(());
        };

        self.total_difference += hand_difference(previous, current)?;
        self.hands_compared += 1;
        Ok(())
    }

    /// Average difference per compared hand, `None` when no hand was compared
    pub fn average(&self) -> Option<f32> {
        if self.hands_compared == 0 {
            None
        } else {
            Some(self.total_difference / self.hands_compared as f32)
        }
    }
}

//! Signing segment recorder
//!
//! Buffers the frames of one signing span so the whole span can be passed to
//! a gloss model once signing stops.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::detector::FrameReport;
use crate::landmarks::HolisticFrame;

/// Segment recording limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Frames kept per segment; older frames are dropped beyond this
    pub max_frames: usize,
    /// Segments with fewer frames are discarded
    pub min_frames: usize,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_frames: 300,
            min_frames: 1,
        }
    }
}

/// A closed signing span
#[derive(Debug, Clone, PartialEq)]
pub struct SignSegment {
    /// Index of the first retained frame
    pub start_frame: u64,
    /// Index of the frame where signing stopped (exclusive)
    pub end_frame: u64,
    pub frames: Vec<HolisticFrame>,
    /// Whether frames were dropped to respect `max_frames`
    pub truncated: bool,
}

impl SignSegment {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Collects frames between signing start and stop
pub struct SegmentRecorder {
    config: SegmentConfig,
    /// Frames of the open segment, oldest first
    frames: VecDeque<HolisticFrame>,
    /// Index of the oldest buffered frame while a segment is open
    start_frame: Option<u64>,
    truncated: bool,
}

impl SegmentRecorder {
    pub fn new(config: SegmentConfig) -> Self {
        Self {
            frames: VecDeque::with_capacity(config.max_frames.min(1024)),
            config,
            start_frame: None,
            truncated: false,
        }
    }

    /// Feed one processed frame; returns a segment when signing just ended
    pub fn observe(&mut self, frame: &HolisticFrame, report: &FrameReport) -> Option<SignSegment> {
        if !report.is_signing {
            return self.finish(report.frame_index);
        }

        let start = self.start_frame.get_or_insert(report.frame_index);
        self.frames.push_back(frame.clone());

        if self.frames.len() > self.config.max_frames {
            self.frames.pop_front();
            *start += 1;
            self.truncated = true;
        }

        None
    }

    /// Close any open segment at end of stream
    pub fn flush(&mut self, end_frame: u64) -> Option<SignSegment> {
        self.finish(end_frame)
    }

    /// Whether a segment is currently open
    pub fn is_recording(&self) -> bool {
        self.start_frame.is_some()
    }

    /// Frames buffered for the open segment
    pub fn buffered(&self) -> usize {
        self.frames.len()
    }

    fn finish(&mut self, end_frame: u64) -> Option<SignSegment> {
        let start_frame = self.start_frame.take()?;
        let frames: Vec<HolisticFrame> = self.frames.drain(..).collect();
        let truncated = std::mem::take(&mut self.truncated);

        if frames.len() < self.config.min_frames {
            log::debug!(
                "Discarding {}-frame segment at {} (minimum {})",
                frames.len(),
                start_frame,
                self.config.min_frames
            );
            return None;
        }

        log::debug!(
            "Segment closed: frames {}..{} ({} frames{})",
            start_frame,
            end_frame,
            frames.len(),
            if truncated { ", truncated" } else { "" }
        );

        Some(SignSegment {
            start_frame,
            end_frame,
            frames,
            truncated,
        })
    }
}

impl Default for SegmentRecorder {
    fn default() -> Self {
        Self::new(SegmentConfig::default())
    }
}

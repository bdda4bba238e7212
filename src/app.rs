//! Replay driver
//!
//! Wires the detector, segment recorder and optional gloss model together and
//! writes results as JSON Lines records.

use std::io::{BufRead, Write};

use crossbeam_channel::Receiver;
use serde::Serialize;
use thiserror::Error;

use crate::config::DetectorConfig;
use crate::detector::{FrameReport, SigningDetector, SigningEvent};
use crate::landmarks::HolisticFrame;
use crate::replay::{FrameReader, ReplayError};
use crate::segment::{SegmentRecorder, SignSegment};
use crate::transcript::{transcribe, GlossPredictor};

/// Errors that stop a run
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Failed to read frames: {0}")]
    Replay(#[from] ReplayError),
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
    #[error("Failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One line of output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputRecord {
    Started {
        frame_index: u64,
    },
    Stopped {
        frame_index: u64,
    },
    Frame {
        frame_index: u64,
        average_difference: Option<f32>,
        hands_compared: u32,
        is_signing: bool,
    },
    Segment {
        start_frame: u64,
        end_frame: u64,
        frame_count: usize,
        truncated: bool,
    },
    Transcript {
        start_frame: u64,
        end_frame: u64,
        glosses: Vec<String>,
        text: String,
    },
}

impl From<SigningEvent> for OutputRecord {
    fn from(event: SigningEvent) -> Self {
        match event {
            SigningEvent::Started { frame_index } => OutputRecord::Started { frame_index },
            SigningEvent::Stopped { frame_index } => OutputRecord::Stopped { frame_index },
        }
    }
}

impl From<&FrameReport> for OutputRecord {
    fn from(report: &FrameReport) -> Self {
        OutputRecord::Frame {
            frame_index: report.frame_index,
            average_difference: report.average_difference,
            hands_compared: report.hands_compared,
            is_signing: report.is_signing,
        }
    }
}

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames: u64,
    /// Input lines rejected as malformed
    pub skipped_lines: usize,
    pub segments: usize,
    pub transcripts: usize,
    pub signing_at_end: bool,
}

/// Detection pipeline state
pub struct App {
    config: DetectorConfig,
    detector: SigningDetector,
    /// Signing changes from the detector
    events: Receiver<SigningEvent>,
    recorder: SegmentRecorder,
    /// Gloss model for closed segments
    predictor: Option<Box<dyn GlossPredictor>>,
    summary: RunSummary,
}

impl App {
    pub fn new(config: DetectorConfig) -> Self {
        let mut detector = SigningDetector::new(config.classifier);
        let events = detector.subscribe();

        Self {
            recorder: SegmentRecorder::new(config.segment),
            config,
            detector,
            events,
            predictor: None,
            summary: RunSummary::default(),
        }
    }

    /// Transcribe every closed segment with `predictor`
    pub fn with_predictor(mut self, predictor: Box<dyn GlossPredictor>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    /// Process every frame from `input`, writing records to `out`
    ///
    /// Malformed lines are logged and skipped; read failures stop the run.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<RunSummary, AppError> {
        for result in FrameReader::new(input) {
            let frame = match result {
                Ok(frame) => frame,
                Err(e @ ReplayError::Io { .. }) => return Err(e.into()),
                Err(e) => {
                    log::warn!("{}", e);
                    self.summary.skipped_lines += 1;
                    continue;
                }
            };
            self.process_frame(&frame, out)?;
        }

        self.finish(out)?;
        out.flush()?;

        log::info!(
            "Processed {} frames: {} segments, {} transcripts, {} skipped lines",
            self.summary.frames,
            self.summary.segments,
            self.summary.transcripts,
            self.summary.skipped_lines
        );
        Ok(self.summary)
    }

    /// Process one frame
    pub fn process_frame<W: Write>(&mut self, frame: &HolisticFrame, out: &mut W) -> Result<(), AppError> {
        let report = self.detector.process(frame);
        self.summary.frames += 1;
        self.summary.signing_at_end = report.is_signing;

        if self.config.output.emit_frames {
            write_record(out, &OutputRecord::from(&report))?;
        }

        for event in self.events.try_iter() {
            write_record(out, &OutputRecord::from(event))?;
        }

        if let Some(segment) = self.recorder.observe(frame, &report) {
            self.emit_segment(segment, out)?;
        }

        Ok(())
    }

    /// Close the open segment, if any, at end of input
    pub fn finish<W: Write>(&mut self, out: &mut W) -> Result<(), AppError> {
        let end_frame = self.detector.state().current_frame;
        if let Some(segment) = self.recorder.flush(end_frame) {
            self.emit_segment(segment, out)?;
        }
        Ok(())
    }

    fn emit_segment<W: Write>(&mut self, segment: SignSegment, out: &mut W) -> Result<(), AppError> {
        self.summary.segments += 1;
        write_record(
            out,
            &OutputRecord::Segment {
                start_frame: segment.start_frame,
                end_frame: segment.end_frame,
                frame_count: segment.len(),
                truncated: segment.truncated,
            },
        )?;

        let Some(predictor) = self.predictor.as_mut() else {
            return Ok(());
        };

        match transcribe(&segment.frames, &mut **predictor, &self.config.transcript) {
            Ok(transcript) => {
                self.summary.transcripts += 1;
                log::info!(
                    "Transcript for frames {}..{}: {:?}",
                    segment.start_frame,
                    segment.end_frame,
                    transcript.text()
                );
                write_record(
                    out,
                    &OutputRecord::Transcript {
                        start_frame: segment.start_frame,
                        end_frame: segment.end_frame,
                        text: transcript.text(),
                        glosses: transcript.glosses,
                    },
                )?;
            }
            Err(e) => {
                log::warn!(
                    "Transcription failed for frames {}..{}: {}",
                    segment.start_frame,
                    segment.end_frame,
                    e
                );
            }
        }

        Ok(())
    }

    pub fn detector(&self) -> &SigningDetector {
        &self.detector
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }
}

fn write_record<W: Write>(out: &mut W, record: &OutputRecord) -> Result<(), AppError> {
    serde_json::to_writer(&mut *out, record)?;
    out.write_all(b"\n")?;
    Ok(())
}

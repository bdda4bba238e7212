//! Frame replay
//!
//! Reads recorded model output as JSON Lines, one `HolisticFrame` object per
//! line, so a capture can be fed through the detector offline.

use std::io::BufRead;

use thiserror::Error;

use crate::landmarks::{HolisticFrame, LandmarkError};

/// Errors raised while reading recorded frames
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Failed to read line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid frame JSON on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid frame on line {line}: {source}")]
    InvalidFrame {
        line: usize,
        #[source]
        source: LandmarkError,
    },
}

/// Iterator over frames in a JSON Lines stream
pub struct FrameReader<R> {
    reader: R,
    /// 1-based number of the last line read
    line: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: Vec::new(),
        }
    }

    /// Number of lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line
    }

    /// Parse one line; bytes that are not UTF-8 are reported as a parse error
    fn parse_line(&self, bytes: &[u8]) -> Result<HolisticFrame, ReplayError> {
        let frame: HolisticFrame = serde_json::from_slice(bytes).map_err(|source| ReplayError::Parse {
            line: self.line,
            source,
        })?;

        frame.validate().map_err(|source| ReplayError::InvalidFrame {
            line: self.line,
            source,
        })?;

        Ok(frame)
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = Result<HolisticFrame, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            self.line += 1;

            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.line -= 1;
                    return None;
                }
                Ok(_) => {}
                Err(source) => {
                    return Some(Err(ReplayError::Io {
                        line: self.line,
                        source,
                    }))
                }
            }

            let line = trim_ascii(&self.buf);
            if line.is_empty() {
                continue;
            }

            return Some(self.parse_line(line));
        }
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !b.is_ascii_whitespace()).map_or(start, |i| i + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_frames_and_skips_blank_lines() {
        let input = concat!(
            r#"{"rightHandLandmarks": [{"x": 0.0, "y": 0.0, "z": 0.0}]}"#,
            "\n\n   \n",
            r#"{}"#,
            "\n",
            r#"{"leftHandLandmarks": [{"x": 1.0, "y": 0.5, "z": 0.0}], "rightHandLandmarks": null}"#,
        );

        let mut reader = FrameReader::new(Cursor::new(input));
        let frames: Vec<HolisticFrame> = reader.by_ref().collect::<Result<_, _>>().unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].hand_count(), 1);
        assert_eq!(frames[1], HolisticFrame::default());
        assert!(frames[2].left_hand_landmarks.is_some());
        assert!(frames[2].right_hand_landmarks.is_none());
        assert_eq!(reader.lines_read(), 5);
    }

    #[test]
    fn test_parse_error_carries_line_number() {
        let input = "{}\n{\"rightHandLandmarks\": 5}\n{}\n";
        let results: Vec<_> = FrameReader::new(Cursor::new(input)).collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ReplayError::Parse { line: 2, .. })));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_out_of_range_coordinate_rejected() {
        // Overflows f32 to infinity
        let input = r#"{"leftHandLandmarks": [{"x": 1e39, "y": 0.0, "z": 0.0}]}"#;
        let results: Vec<_> = FrameReader::new(Cursor::new(input)).collect();
        assert!(matches!(
            results[0],
            Err(ReplayError::InvalidFrame {
                line: 1,
                source: LandmarkError::NonFinite { part: "left hand", index: 0 },
            })
        ));
    }

    #[test]
    fn test_invalid_utf8_is_a_parse_error() {
        let mut input = b"{}\n".to_vec();
        input.extend_from_slice(b"\xff\xfe\n");
        input.extend_from_slice(b"{}\r\n");
        let results: Vec<_> = FrameReader::new(Cursor::new(input)).collect();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ReplayError::Parse { line: 2, .. })));
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_read_failure_is_io_error() {
        struct Failing;

        impl std::io::Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "device gone"))
            }
        }

        let mut reader = FrameReader::new(std::io::BufReader::new(Failing));
        assert!(matches!(reader.next(), Some(Err(ReplayError::Io { line: 1, .. }))));
    }

    #[test]
    fn test_empty_input() {
        let mut reader = FrameReader::new(Cursor::new(""));
        assert!(reader.next().is_none());
        assert_eq!(reader.lines_read(), 0);
    }
}

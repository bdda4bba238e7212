//! Configuration management
//!
//! Loads and saves the detector configuration as JSON. Every section falls
//! back to its defaults when missing, so partial files are valid.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::ClassifierConfig;
use crate::segment::SegmentConfig;
use crate::transcript::TranscriptConfig;

/// Errors raised while loading or saving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("No config directory available on this platform")]
    NoConfigDir,
}

/// Output options for the replay driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write a record for every processed frame, not just changes
    pub emit_frames: bool,
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub classifier: ClassifierConfig,
    pub segment: SegmentConfig,
    pub transcript: TranscriptConfig,
    pub output: OutputConfig,
}

impl DetectorConfig {
    /// Load and validate a config file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON, creating parent directories
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Default config location in the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("signing-detector");
            p.push("config.json");
            p
        })
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from_file(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to_file(&path)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.classifier;
        for (name, value) in [
            ("classifier.enter_threshold", c.enter_threshold),
            ("classifier.activity_threshold", c.activity_threshold),
            ("transcript.min_confidence", self.transcript.min_confidence),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{} must be finite", name)));
            }
        }
        if c.enter_threshold < 0.0 || c.activity_threshold < 0.0 {
            return Err(ConfigError::Invalid(
                "classifier thresholds must not be negative".to_string(),
            ));
        }
        if c.enter_threshold < c.activity_threshold {
            log::warn!(
                "enter_threshold {} is below activity_threshold {}",
                c.enter_threshold,
                c.activity_threshold
            );
        }

        let s = &self.segment;
        if s.max_frames == 0 {
            return Err(ConfigError::Invalid("segment.max_frames must be at least 1".to_string()));
        }
        if s.min_frames > s.max_frames {
            return Err(ConfigError::Invalid(format!(
                "segment.min_frames ({}) exceeds segment.max_frames ({})",
                s.min_frames, s.max_frames
            )));
        }

        let t = &self.transcript;
        if t.window_size == 0 || t.stride == 0 {
            return Err(ConfigError::Invalid(
                "transcript.window_size and transcript.stride must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DetectorConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.output.emit_frames);
        assert_eq!(config.transcript.window_size, 10);
        assert_eq!(config.segment.max_frames, 300);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{"classifier": {"idle_frames": 30}}"#).unwrap();
        assert_eq!(config.classifier.idle_frames, 30);
        assert_eq!(config.classifier.enter_threshold, 0.7);
        assert_eq!(config.transcript, TranscriptConfig::default());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = DetectorConfig::default();
        config.classifier.idle_frames = 12;
        config.output.emit_frames = true;
        config.save_to_file(&path).unwrap();

        let loaded = DetectorConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"segment": {"max_frames": 0}}"#).unwrap();

        assert!(matches!(
            DetectorConfig::load_from_file(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            DetectorConfig::load_from_file(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DetectorConfig::load_from_file(&dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = DetectorConfig::default();
        config.classifier.activity_threshold = -0.1;
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.classifier.enter_threshold = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.segment.min_frames = 500;
        assert!(config.validate().is_err());

        let mut config = DetectorConfig::default();
        config.transcript.stride = 0;
        assert!(config.validate().is_err());
    }
}

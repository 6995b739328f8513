//! Persisted detector settings.
//!
//! Exactly three tunables survive a restart: sensitivity, settle time,
//! and erosion level. A load is all-or-nothing; a record that is
//! missing a field or carries an out-of-range value is rejected before
//! anything is applied.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Lowest accepted sensitivity (per-channel difference threshold).
pub const MIN_SENSITIVITY: u8 = 1;
/// Highest accepted sensitivity.
pub const MAX_SENSITIVITY: u8 = 127;
/// Shortest accepted settle time, in seconds.
pub const MIN_SETTLE_TIME: f64 = 1.0;
/// Longest accepted settle time, in seconds.
pub const MAX_SETTLE_TIME: f64 = 60.0;
/// Highest accepted erosion level (count of 8-neighbors).
pub const MAX_EROSION: u8 = 8;

/// Errors from settings validation and persistence.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Sensitivity outside `[MIN_SENSITIVITY, MAX_SENSITIVITY]`.
    #[error("sensitivity must be between 1 and 127, got {0}")]
    SensitivityOutOfRange(u8),
    /// Settle time outside `[MIN_SETTLE_TIME, MAX_SETTLE_TIME]` seconds.
    #[error("settle time must be between 1 and 60 seconds, got {0}")]
    SettleTimeOutOfRange(f64),
    /// Erosion level above `MAX_EROSION`.
    #[error("erosion level must be at most 8, got {0}")]
    ErosionOutOfRange(u8),
    /// The settings file could not be read or written.
    #[error("failed to access settings file: {0}")]
    FileAccess(String),
    /// The settings file is not a valid record of all three fields.
    #[error("failed to parse settings file: {0}")]
    Parse(String),
}

/// Checks a sensitivity value against its accepted range.
pub(crate) fn check_sensitivity(value: u8) -> Result<(), ConfigError> {
    if !(MIN_SENSITIVITY..=MAX_SENSITIVITY).contains(&value) {
        return Err(ConfigError::SensitivityOutOfRange(value));
    }
    Ok(())
}

/// Checks a settle time against its accepted range.
pub(crate) fn check_settle_time(seconds: f64) -> Result<(), ConfigError> {
    if !(MIN_SETTLE_TIME..=MAX_SETTLE_TIME).contains(&seconds) {
        return Err(ConfigError::SettleTimeOutOfRange(seconds));
    }
    Ok(())
}

/// Checks an erosion level against its accepted range.
pub(crate) fn check_erosion(level: u8) -> Result<(), ConfigError> {
    if level > MAX_EROSION {
        return Err(ConfigError::ErosionOutOfRange(level));
    }
    Ok(())
}

/// The detector tunables, as persisted.
///
/// All three fields are required on load; there are no serde defaults,
/// so a partial record fails to parse rather than half-applying.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorSettings {
    /// Per-channel absolute difference above which two pixels differ.
    pub sensitivity: u8,
    /// Seconds a pixel must hold still before it may displace the
    /// background reference.
    pub settle_time: f64,
    /// Minimum count of moving 8-neighbors required to keep a moving
    /// pixel through the erode pass. Zero disables morphology.
    pub erosion_level: u8,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            sensitivity: 26,
            settle_time: 1.0,
            erosion_level: 5,
        }
    }
}

impl DetectorSettings {
    /// Validates every field against its accepted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_sensitivity(self.sensitivity)?;
        check_settle_time(self.settle_time)?;
        check_erosion(self.erosion_level)?;
        Ok(())
    }

    /// Loads and validates settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileAccess(e.to_string()))?;
        let settings: DetectorSettings =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Writes the settings to a TOML file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content =
            toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| ConfigError::FileAccess(e.to_string()))
    }
}

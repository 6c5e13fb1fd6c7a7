//! Station configuration.

use crate::error::{Result, SchedulerError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Seconds in one broadcast day. The playlist budget can never exceed it.
pub const DAY_SECS: u32 = 86_400;

/// Duration assumed for tracks submitted without one.
pub const DEFAULT_TRACK_SECS: u32 = 180;

/// Station-wide scheduling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Duration (seconds) given to tracks submitted without one.
    pub default_track_secs: u32,
    /// Total playlist duration (seconds) above which the oldest tracks are evicted.
    pub max_playlist_secs: u32,
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            default_track_secs: DEFAULT_TRACK_SECS,
            max_playlist_secs: DAY_SECS,
        }
    }
}

impl StationConfig {
    /// Load and validate a JSON config file. Missing fields take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            SchedulerError::Config(format!("Could not read '{}': {}", path.display(), e))
        })?;
        let config: StationConfig = serde_json::from_str(&data).map_err(|e| {
            SchedulerError::Config(format!("Invalid config '{}': {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_playlist_secs == 0 || self.max_playlist_secs > DAY_SECS {
            return Err(SchedulerError::Config(format!(
                "max_playlist_secs must be between 1 and {}",
                DAY_SECS
            )));
        }
        if self.default_track_secs == 0 {
            return Err(SchedulerError::Config(
                "default_track_secs must be >= 1".to_string(),
            ));
        }
        if self.default_track_secs > self.max_playlist_secs {
            return Err(SchedulerError::Config(
                "default_track_secs cannot exceed max_playlist_secs".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = StationConfig::default();
        assert_eq!(config.default_track_secs, 180);
        assert_eq!(config.max_playlist_secs, 86_400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: StationConfig = serde_json::from_str(r#"{"default_track_secs":240}"#).unwrap();
        assert_eq!(config.default_track_secs, 240);
        assert_eq!(config.max_playlist_secs, DAY_SECS);
    }

    #[test]
    fn budget_cannot_exceed_a_day() {
        let config = StationConfig {
            max_playlist_secs: DAY_SECS + 1,
            ..StationConfig::default()
        };
        assert!(matches!(config.validate(), Err(SchedulerError::Config(_))));
    }

    #[test]
    fn zero_default_duration_rejected() {
        let config = StationConfig {
            default_track_secs: 0,
            ..StationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"default_track_secs":200,"max_playlist_secs":3600}}"#).unwrap();
        let config = StationConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_track_secs, 200);
        assert_eq!(config.max_playlist_secs, 3600);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            StationConfig::load_from(file.path()),
            Err(SchedulerError::Config(_))
        ));
    }

    #[test]
    fn load_from_missing_file() {
        let result = StationConfig::load_from(Path::new("does/not/exist.json"));
        assert!(matches!(result, Err(SchedulerError::Config(_))));
    }
}

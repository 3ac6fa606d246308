//! Pipeline configuration, loaded from JSON.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use stereo_core::{Real, UndistortOptions};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration shared by the rig, the leveling gate and telemetry.
///
/// Every field has a default, so `{}` is a valid config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Distance between the two optical centres, in millimetres.
    ///
    /// A fixed estimate for the device model, not calibrated per unit.
    pub baseline_mm: Real,
    /// Sensors whose focal length is at least this value (mm) are main
    /// camera candidates; shorter ones are ultrawide candidates.
    pub main_focal_threshold_mm: Real,
    /// Maximum |pitch| and |roll| (degrees, exclusive) for the device to count
    /// as level.
    pub level_threshold_deg: Real,
    /// Also persist telemetry while the device is not level.
    pub persist_non_level: bool,
    /// Capacity of the telemetry hand-off queue.
    pub telemetry_queue_capacity: usize,
    /// Undistortion applied to matched points.
    pub undistort: UndistortOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            baseline_mm: 12.0,
            main_focal_threshold_mm: 3.0,
            level_threshold_deg: 5.0,
            persist_non_level: false,
            telemetry_queue_capacity: 256,
            undistort: UndistortOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baseline_mm.is_nan() || self.baseline_mm <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "baseline_mm must be positive, got {}",
                self.baseline_mm
            )));
        }
        if self.level_threshold_deg.is_nan() || self.level_threshold_deg <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "level_threshold_deg must be positive, got {}",
                self.level_threshold_deg
            )));
        }
        if self.telemetry_queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "telemetry_queue_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

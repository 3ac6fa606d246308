use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stereo_core::Real;
use uuid::Uuid;

use crate::orientation::LevelingUpdate;

/// One accepted orientation sample, as persisted by the telemetry store.
///
/// Append-only; `session_id` groups the records of one capture attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub timestamp: DateTime<Utc>,
    pub session_id: Uuid,
    pub pitch: Real,
    pub roll: Real,
    pub azimuth: Real,
    /// Latest ambient light reading in lux, if any arrived.
    pub luminosity: Option<Real>,
    pub is_level: bool,
}

impl TelemetryRecord {
    pub fn from_update(
        session_id: Uuid,
        update: &LevelingUpdate,
        luminosity: Option<Real>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            session_id,
            pitch: update.sample.pitch_deg,
            roll: update.sample.roll_deg,
            azimuth: update.sample.azimuth_deg,
            luminosity,
            is_level: update.is_level,
        }
    }
}

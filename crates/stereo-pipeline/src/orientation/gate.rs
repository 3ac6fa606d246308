//! Leveling gate: latches the two vector inputs and derives a leveling
//! verdict on every reading once both have been seen.

use log::debug;
use serde::{Deserialize, Serialize};
use stereo_core::{Real, Vec3};

use super::OrientationSample;

/// Default leveling tolerance for pitch and roll, in degrees.
pub const DEFAULT_LEVEL_THRESHOLD_DEG: Real = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// At most one of the two inputs has been observed.
    Unresolved,
    /// Both inputs observed at least once. Never left afterwards.
    Resolved,
}

/// Attitude plus leveling verdict, produced once per reading while resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelingUpdate {
    #[serde(flatten)]
    pub sample: OrientationSample,
    pub is_level: bool,
}

/// Latched `(gravity, magnetic)` pair scoped to one sensing session.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Latched {
    gravity: Option<Vec3>,
    magnetic: Option<Vec3>,
}

/// Orientation leveling gate.
///
/// Owned by a single sensing session and fed from one serialized event
/// stream; see [`super::SharedOrientationGate`] for multi-threaded feeds.
#[derive(Debug, Clone)]
pub struct OrientationGate {
    latched: Latched,
    level_threshold_deg: Real,
}

impl Default for OrientationGate {
    fn default() -> Self {
        Self::new(DEFAULT_LEVEL_THRESHOLD_DEG)
    }
}

impl OrientationGate {
    pub fn new(level_threshold_deg: Real) -> Self {
        Self {
            latched: Latched::default(),
            level_threshold_deg,
        }
    }

    pub fn level_threshold_deg(&self) -> Real {
        self.level_threshold_deg
    }

    pub fn state(&self) -> GateState {
        match self.latched {
            Latched {
                gravity: Some(_),
                magnetic: Some(_),
            } => GateState::Resolved,
            _ => GateState::Unresolved,
        }
    }

    /// Latch a gravity-like reading and re-evaluate.
    pub fn update_gravity(&mut self, gravity: Vec3) -> Option<LevelingUpdate> {
        self.latched.gravity = Some(gravity);
        self.evaluate()
    }

    /// Latch a magnetic-field-like reading and re-evaluate.
    pub fn update_magnetic(&mut self, magnetic: Vec3) -> Option<LevelingUpdate> {
        self.latched.magnetic = Some(magnetic);
        self.evaluate()
    }

    /// Latest leveling verdict without latching anything new.
    ///
    /// `None` while unresolved or when the latched vectors are degenerate.
    pub fn evaluate(&self) -> Option<LevelingUpdate> {
        let (Some(gravity), Some(magnetic)) = (self.latched.gravity, self.latched.magnetic) else {
            return None;
        };
        let Some(sample) = OrientationSample::from_vectors(&gravity, &magnetic) else {
            debug!("degenerate gravity/magnetic pair, skipping orientation update");
            return None;
        };
        Some(LevelingUpdate {
            sample,
            is_level: sample.is_level(self.level_threshold_deg),
        })
    }

    /// Forget both latched vectors, e.g. when a sensing session ends.
    pub fn reset(&mut self) {
        self.latched = Latched::default();
    }
}

//! Leveling session: one capture attempt's orientation stream, gate and
//! telemetry.

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use stereo_core::{Real, Vec3};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::orientation::{GateState, LevelingUpdate, OrientationGate};
use crate::telemetry::{TelemetryRecord, TelemetrySink};

/// One reading from the motion / light sensing collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorReading {
    Gravity([Real; 3]),
    Magnetic([Real; 3]),
    /// Ambient light in lux.
    Light(Real),
}

/// Feeds sensor readings through an [`OrientationGate`] and emits telemetry.
///
/// While the gate is resolved every gravity or magnetic reading yields one
/// [`LevelingUpdate`]. A [`TelemetryRecord`] is submitted for level updates,
/// and for non-level ones only when `persist_non_level` is enabled.
pub struct LevelingSession<S: TelemetrySink> {
    id: Uuid,
    gate: OrientationGate,
    luminosity: Option<Real>,
    persist_non_level: bool,
    sink: S,
    submitted: u64,
}

impl<S: TelemetrySink> LevelingSession<S> {
    /// Start a session with a fresh random identifier.
    pub fn new(config: &PipelineConfig, sink: S) -> Self {
        Self::with_id(Uuid::new_v4(), config, sink)
    }

    pub fn with_id(id: Uuid, config: &PipelineConfig, sink: S) -> Self {
        info!("leveling session {id} started");
        Self {
            id,
            gate: OrientationGate::new(config.level_threshold_deg),
            luminosity: None,
            persist_non_level: config.persist_non_level,
            sink,
            submitted: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> GateState {
        self.gate.state()
    }

    pub fn luminosity(&self) -> Option<Real> {
        self.luminosity
    }

    /// Records handed to the sink and accepted by it.
    pub fn records_submitted(&self) -> u64 {
        self.submitted
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn on_gravity(&mut self, gravity: Vec3) -> Option<LevelingUpdate> {
        let update = self.gate.update_gravity(gravity)?;
        self.emit(&update);
        Some(update)
    }

    pub fn on_magnetic(&mut self, magnetic: Vec3) -> Option<LevelingUpdate> {
        let update = self.gate.update_magnetic(magnetic)?;
        self.emit(&update);
        Some(update)
    }

    /// Remember the latest ambient light level; produces no update.
    pub fn on_light(&mut self, lux: Real) {
        self.luminosity = Some(lux);
    }

    pub fn on_reading(&mut self, reading: SensorReading) -> Option<LevelingUpdate> {
        match reading {
            SensorReading::Gravity(v) => self.on_gravity(Vec3::from(v)),
            SensorReading::Magnetic(v) => self.on_magnetic(Vec3::from(v)),
            SensorReading::Light(lux) => {
                self.on_light(lux);
                None
            }
        }
    }

    fn emit(&mut self, update: &LevelingUpdate) {
        if !update.is_level && !self.persist_non_level {
            return;
        }
        let record = TelemetryRecord::from_update(self.id, update, self.luminosity, Utc::now());
        if self.sink.submit(record) {
            self.submitted += 1;
        } else {
            debug!("session {}: telemetry record not accepted", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct CollectingSink(Mutex<Vec<TelemetryRecord>>);

    impl TelemetrySink for CollectingSink {
        fn submit(&self, record: TelemetryRecord) -> bool {
            self.0.lock().push(record);
            true
        }
    }

    fn tilted(deg: Real) -> Vec3 {
        Vec3::new(0.0, -9.81 * deg.to_radians().sin(), 9.81 * deg.to_radians().cos())
    }

    const FIELD: [Real; 3] = [0.0, 22.0, -40.0];

    #[test]
    fn only_level_samples_are_recorded_by_default() {
        let sink = CollectingSink::default();
        let mut session = LevelingSession::new(&PipelineConfig::default(), &sink);

        assert!(session.on_gravity(tilted(0.0)).is_none());
        assert!(session.on_magnetic(Vec3::from(FIELD)).unwrap().is_level);
        assert!(!session.on_gravity(tilted(20.0)).unwrap().is_level);
        assert!(session.on_gravity(tilted(3.0)).unwrap().is_level);

        let records = sink.0.lock();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.is_level && r.session_id == session.id()));
        assert_eq!(session.records_submitted(), 2);
    }

    #[test]
    fn non_level_persistence_is_configurable() {
        let config = PipelineConfig {
            persist_non_level: true,
            ..Default::default()
        };
        let sink = CollectingSink::default();
        let mut session = LevelingSession::new(&config, &sink);

        session.on_magnetic(Vec3::from(FIELD));
        session.on_gravity(tilted(20.0));
        session.on_gravity(tilted(1.0));

        let levels: Vec<_> = sink.0.lock().iter().map(|r| r.is_level).collect();
        assert_eq!(levels, vec![false, true]);
    }

    #[test]
    fn records_carry_latest_luminosity() {
        let sink = CollectingSink::default();
        let mut session = LevelingSession::new(&PipelineConfig::default(), &sink);

        let readings = [
            SensorReading::Light(120.0),
            SensorReading::Gravity([0.0, 0.0, 9.81]),
            SensorReading::Magnetic(FIELD),
            SensorReading::Light(450.0),
            SensorReading::Gravity([0.0, 0.0, 9.81]),
        ];
        let updates = readings
            .into_iter()
            .filter_map(|r| session.on_reading(r))
            .count();
        assert_eq!(updates, 2);

        let lux: Vec<_> = sink.0.lock().iter().map(|r| r.luminosity).collect();
        assert_eq!(lux, vec![Some(120.0), Some(450.0)]);
    }

    #[test]
    fn reading_json_shape() {
        let readings: Vec<SensorReading> = serde_json::from_str(
            r#"[{ "gravity": [0.0, 0.0, 9.81] }, { "magnetic": [0.0, 22.0, -40.0] }, { "light": 300.0 }]"#,
        )
        .unwrap();
        assert_eq!(readings[2], SensorReading::Light(300.0));
    }
}

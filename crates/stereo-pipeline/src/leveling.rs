//! Replay a recorded sensor stream through a [`LevelingSession`] with a
//! file-backed telemetry writer.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::orientation::LevelingUpdate;
use crate::session::{LevelingSession, SensorReading};
use crate::telemetry::{JsonLinesTelemetryStore, TelemetrySink, TelemetryWriter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelingReport {
    pub session_id: Uuid,
    pub readings: usize,
    pub updates: Vec<LevelingUpdate>,
    pub level_updates: usize,
    pub records_submitted: u64,
    pub records_dropped: u64,
}

/// Feed `readings` through a session and collect the updates it produces.
pub fn replay_readings<S: TelemetrySink>(
    readings: &[SensorReading],
    session: &mut LevelingSession<S>,
) -> Vec<LevelingUpdate> {
    readings
        .iter()
        .filter_map(|r| session.on_reading(*r))
        .collect()
}

/// Replay into a JSON-lines telemetry file.
///
/// The writer is shut down before returning, so every accepted record is on
/// disk once this succeeds.
pub fn run_leveling_replay(
    readings: &[SensorReading],
    telemetry_path: &Path,
    config: &PipelineConfig,
) -> Result<LevelingReport> {
    config.validate().context("invalid pipeline config")?;
    let store = JsonLinesTelemetryStore::open(telemetry_path)
        .with_context(|| format!("failed to open {}", telemetry_path.display()))?;
    let writer = TelemetryWriter::spawn(store, config.telemetry_queue_capacity)
        .context("failed to start telemetry writer")?;

    let mut session = LevelingSession::new(config, writer);
    let updates = replay_readings(readings, &mut session);
    let session_id = session.id();
    let records_submitted = session.records_submitted();

    let mut writer = session.into_sink();
    writer.shutdown();
    let records_dropped = writer.dropped();

    let level_updates = updates.iter().filter(|u| u.is_level).count();
    info!(
        "session {session_id}: {} readings, {} updates ({level_updates} level)",
        readings.len(),
        updates.len()
    );

    Ok(LevelingReport {
        session_id,
        readings: readings.len(),
        updates,
        level_updates,
        records_submitted,
        records_dropped,
    })
}

//! Stereo measurement pipeline on top of `stereo-core` and `stereo-linear`.
//!
//! - [`rig`]: main / ultrawide sensor assignment and point measurement,
//! - [`orientation`]: the leveling gate over gravity and magnetic readings,
//! - [`telemetry`]: records and their bounded, non-blocking hand-off,
//! - [`session`]: one capture attempt wiring the gate to telemetry,
//! - [`measure`] and [`leveling`]: JSON-in / report-out entry points used by
//!   the CLI.

pub mod config;
pub mod leveling;
pub mod measure;
pub mod orientation;
pub mod rig;
pub mod session;
pub mod telemetry;

pub use config::{ConfigError, PipelineConfig};
pub use leveling::{replay_readings, run_leveling_replay, LevelingReport};
pub use measure::{
    run_measurement, MaskInput, MaskMeasurement, MeasurementInput, MeasurementReport, PointInput,
};
pub use orientation::{
    GateState, LevelingUpdate, OrientationGate, OrientationSample, SharedOrientationGate,
};
pub use rig::{classify_sensors, PointMeasurement, RigError, SensorDescriptor, SensorRole, StereoRig};
pub use session::{LevelingSession, SensorReading};
pub use telemetry::{
    JsonLinesTelemetryStore, MemoryTelemetryStore, TelemetryError, TelemetryRecord, TelemetrySink,
    TelemetryStore, TelemetryWriter,
};

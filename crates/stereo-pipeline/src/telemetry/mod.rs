//! Telemetry records and their non-blocking hand-off to storage.
//!
//! The storage collaborator is modeled by [`TelemetryStore`]. Records reach it
//! through [`TelemetryWriter`], a bounded queue drained by a worker thread, so
//! a slow store never stalls the orientation path.

mod record;
mod store;
mod writer;

pub use record::*;
pub use store::*;
pub use writer::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize telemetry record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("telemetry worker could not be started: {0}")]
    Spawn(std::io::Error),
}

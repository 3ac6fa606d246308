use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{info, warn};

use super::{TelemetryError, TelemetryRecord, TelemetryStore};

/// Destination for telemetry records on the orientation path.
///
/// Implementations must not block the caller.
pub trait TelemetrySink {
    /// Hand a record off; returns `false` if it was dropped.
    fn submit(&self, record: TelemetryRecord) -> bool;
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for &T {
    fn submit(&self, record: TelemetryRecord) -> bool {
        (**self).submit(record)
    }
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for Arc<T> {
    fn submit(&self, record: TelemetryRecord) -> bool {
        (**self).submit(record)
    }
}

/// Bounded, non-blocking hand-off of telemetry records to a store.
///
/// Records are queued with `try_send`; when the queue is full (the store is
/// slower than the sensor stream) the record is dropped and counted. A single
/// worker thread owns the store and appends records in submission order.
pub struct TelemetryWriter {
    sender: Option<Sender<TelemetryRecord>>,
    worker: Option<JoinHandle<()>>,
    dropped: Arc<AtomicU64>,
}

impl TelemetryWriter {
    /// Start the worker thread draining into `store`.
    pub fn spawn<S: TelemetryStore>(store: S, capacity: usize) -> Result<Self, TelemetryError> {
        let (sender, receiver) = bounded::<TelemetryRecord>(capacity.max(1));
        let worker = thread::Builder::new()
            .name("telemetry-writer".to_string())
            .spawn(move || Self::drain(store, receiver))
            .map_err(TelemetryError::Spawn)?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
            dropped: Arc::new(AtomicU64::new(0)),
        })
    }

    fn drain<S: TelemetryStore>(mut store: S, receiver: Receiver<TelemetryRecord>) {
        let mut written = 0u64;
        for record in receiver.iter() {
            match store.append(&record) {
                Ok(()) => written += 1,
                Err(err) => warn!("telemetry store rejected record: {err}"),
            }
        }
        if let Err(err) = store.flush() {
            warn!("telemetry store flush failed: {err}");
        }
        info!("telemetry writer stopped after {written} records");
    }

    /// Number of records dropped so far because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Close the queue and wait for the worker to persist what was accepted.
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("telemetry worker panicked");
            }
        }
    }
}

impl TelemetrySink for TelemetryWriter {
    fn submit(&self, record: TelemetryRecord) -> bool {
        let Some(sender) = &self.sender else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        };
        match sender.try_send(record) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let n = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!("telemetry queue full, dropped record ({n} dropped so far)");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("telemetry worker gone, dropped record");
                false
            }
        }
    }
}

impl Drop for TelemetryWriter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
    sync::Arc,
};

use parking_lot::Mutex;
use uuid::Uuid;

use super::{TelemetryError, TelemetryRecord};

/// Append-only storage for telemetry records.
pub trait TelemetryStore: Send + 'static {
    fn append(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError>;

    fn flush(&mut self) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// In-memory store; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemoryTelemetryStore {
    records: Arc<Mutex<Vec<TelemetryRecord>>>,
}

impl MemoryTelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record appended so far.
    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records.lock().clone()
    }

    /// Snapshot of the records of one session.
    pub fn session_records(&self, session_id: Uuid) -> Vec<TelemetryRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetryStore for MemoryTelemetryStore {
    fn append(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// JSON-lines file store, one record per line, opened in append mode.
///
/// Each record is flushed to the file as soon as it is appended.
#[derive(Debug)]
pub struct JsonLinesTelemetryStore {
    writer: BufWriter<File>,
}

impl JsonLinesTelemetryStore {
    pub fn open(path: &Path) -> Result<Self, TelemetryError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl TelemetryStore for JsonLinesTelemetryStore {
    fn append(&mut self, record: &TelemetryRecord) -> Result<(), TelemetryError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TelemetryError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Read back a JSON-lines telemetry file, skipping blank lines.
pub fn read_json_lines(path: &Path) -> Result<Vec<TelemetryRecord>, TelemetryError> {
    let reader = BufReader::new(File::open(path)?);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(serde_json::from_str(&line)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(session_id: Uuid, pitch: f64) -> TelemetryRecord {
        TelemetryRecord {
            timestamp: Utc::now(),
            session_id,
            pitch,
            roll: 0.5,
            azimuth: 180.0,
            luminosity: Some(320.0),
            is_level: true,
        }
    }

    #[test]
    fn memory_store_groups_by_session() {
        let mut store = MemoryTelemetryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        store.append(&record(a, 1.0)).unwrap();
        store.append(&record(b, 2.0)).unwrap();
        store.append(&record(a, 3.0)).unwrap();

        assert_eq!(store.len(), 3);
        let pitches: Vec<_> = store.session_records(a).iter().map(|r| r.pitch).collect();
        assert_eq!(pitches, vec![1.0, 3.0]);
    }

    #[test]
    fn json_lines_store_appends_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.jsonl");
        let id = Uuid::new_v4();

        for pitch in [1.0, 2.0] {
            let mut store = JsonLinesTelemetryStore::open(&path).unwrap();
            store.append(&record(id, pitch)).unwrap();
            store.flush().unwrap();
        }

        let back = read_json_lines(&path).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].session_id, id);
        assert_eq!(back[1].pitch, 2.0);
        assert_eq!(back[1].luminosity, Some(320.0));
    }

    #[test]
    fn json_lines_store_persists_each_append() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.jsonl");
        let id = Uuid::new_v4();

        let mut store = JsonLinesTelemetryStore::open(&path).unwrap();
        for pitch in [1.0, 2.0, 3.0] {
            store.append(&record(id, pitch)).unwrap();
            let on_disk = read_json_lines(&path).unwrap();
            assert_eq!(on_disk.last().map(|r| r.pitch), Some(pitch));
        }
        assert_eq!(read_json_lines(&path).unwrap().len(), 3);
        drop(store);
    }
}

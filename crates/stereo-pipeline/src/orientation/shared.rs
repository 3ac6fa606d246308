use std::sync::Arc;

use parking_lot::Mutex;
use stereo_core::Vec3;

use super::{GateState, LevelingUpdate, OrientationGate};

/// [`OrientationGate`] shareable across threads.
///
/// The latched `(gravity, magnetic)` pair is written and read under one lock,
/// so an update never combines a stale vector with a fresh one mid-write.
#[derive(Debug, Clone, Default)]
pub struct SharedOrientationGate {
    inner: Arc<Mutex<OrientationGate>>,
}

impl SharedOrientationGate {
    pub fn new(gate: OrientationGate) -> Self {
        Self {
            inner: Arc::new(Mutex::new(gate)),
        }
    }

    pub fn update_gravity(&self, gravity: Vec3) -> Option<LevelingUpdate> {
        self.inner.lock().update_gravity(gravity)
    }

    pub fn update_magnetic(&self, magnetic: Vec3) -> Option<LevelingUpdate> {
        self.inner.lock().update_magnetic(magnetic)
    }

    pub fn evaluate(&self) -> Option<LevelingUpdate> {
        self.inner.lock().evaluate()
    }

    pub fn state(&self) -> GateState {
        self.inner.lock().state()
    }

    pub fn reset(&self) {
        self.inner.lock().reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn concurrent_feeds_resolve_once_both_seen() {
        let gate = SharedOrientationGate::default();

        let g = gate.clone();
        let gravity = thread::spawn(move || {
            (0..200)
                .filter_map(|_| g.update_gravity(Vec3::new(0.0, 0.0, 9.81)))
                .count()
        });
        let m = gate.clone();
        let magnetic = thread::spawn(move || {
            (0..200)
                .filter_map(|_| m.update_magnetic(Vec3::new(0.0, 22.0, -40.0)))
                .count()
        });

        let produced = gravity.join().unwrap() + magnetic.join().unwrap();
        // Only the readings that arrived before the other input was first
        // seen are silent.
        assert!(produced >= 200 && produced < 400, "produced={produced}");
        assert_eq!(gate.state(), GateState::Resolved);
        assert!(gate.evaluate().unwrap().is_level);
    }
}

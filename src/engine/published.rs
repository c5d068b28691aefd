// Published state - Read-only projection of the running engine
// Written only from the worker thread, read from anywhere (UI, tests)

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::instrument::InstanceId;

/// Observable engine state shared with presentation code
///
/// The running flag is an atomic; the active-step map hands out snapshot
/// clones so readers never hold the worker's lock across their own work.
#[derive(Debug, Default)]
pub struct Published {
    running: AtomicBool,
    steps: Mutex<HashMap<InstanceId, BTreeSet<usize>>>,
}

impl Published {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the transport is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Snapshot of the currently active step indices per instance
    pub fn active_steps(&self) -> HashMap<InstanceId, BTreeSet<usize>> {
        self.steps.lock().expect("published state poisoned").clone()
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    /// Replace an instance's active step set with the single current step
    pub(crate) fn publish_step(&self, id: InstanceId, step: usize) {
        let mut steps = self.steps.lock().expect("published state poisoned");
        let set = steps.entry(id).or_default();
        set.clear();
        set.insert(step);
    }

    /// Drop an instance's publication (silenced or removed)
    pub(crate) fn clear_instance(&self, id: InstanceId) {
        self.steps
            .lock()
            .expect("published state poisoned")
            .remove(&id);
    }

    /// Drop all publications (transport stop)
    pub(crate) fn clear_all(&self) {
        self.steps.lock().expect("published state poisoned").clear();
    }
}

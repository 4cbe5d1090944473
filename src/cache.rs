use std::collections::HashMap;

use crate::error::{FlowError, Result};
use crate::screen::ScreenHandle;
use crate::step::{FlowStep, StepId};

/// Per-coordinator mapping from step id to the screen instance created for
/// that step. Holds at most one instance per id; cloning the cache is a
/// shallow snapshot that preserves instance identity, which is what the
/// attach/merge rollback relies on.
#[derive(Clone, Default)]
pub struct ScreenCache {
    entries: HashMap<StepId, ScreenHandle>,
}

impl ScreenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<ScreenHandle> {
        self.entries.get(id).cloned()
    }

    /// Return the cached instance for `step`, creating it through the step's
    /// factory on first visit.
    pub fn get_or_create(&mut self, step: &FlowStep) -> Result<ScreenHandle> {
        if let Some(handle) = self.entries.get(&step.id) {
            return Ok(handle.clone());
        }
        let screen =
            (step.factory)().ok_or_else(|| FlowError::ScreenInstantiation(step.id.clone()))?;
        let handle = ScreenHandle::new(step.id.clone(), screen);
        self.entries.insert(step.id.clone(), handle.clone());
        Ok(handle)
    }

    pub fn insert(&mut self, handle: ScreenHandle) {
        self.entries.insert(handle.step_id(), handle);
    }

    pub fn remove(&mut self, id: &str) -> Option<ScreenHandle> {
        self.entries.remove(id)
    }

    /// Drop every entry, severing each instance's coordinator binding so
    /// stale handles cannot mutate flow state afterwards.
    pub fn clear_all(&mut self) {
        for handle in self.entries.values() {
            handle.sever();
        }
        self.entries.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sever entries present here but absent from `snapshot`. Used when a
    /// merge rolls back and the overlay's screens are discarded.
    pub(crate) fn sever_missing_from(&self, snapshot: &ScreenCache) {
        for (id, handle) in &self.entries {
            if !snapshot.entries.contains_key(id) {
                handle.sever();
            }
        }
    }
}

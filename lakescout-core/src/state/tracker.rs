//! Stale-entity diffing between consecutive runs.

use super::{RunState, StateEntityKind};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Collects this run's entity URNs and diffs them against the previous run.
#[derive(Debug, Clone)]
pub struct StaleEntityTracker {
    previous: Option<RunState>,
    current: RunState,
}

impl StaleEntityTracker {
    /// Tracker for run `run_id`. `previous` is `None` on a first run.
    pub fn new(run_id: Uuid, previous: Option<RunState>) -> Self {
        Self {
            previous,
            current: RunState::new(run_id),
        }
    }

    /// Registers an entity reached by this run.
    pub fn add(&mut self, kind: StateEntityKind, urn: impl Into<String>) {
        self.current.insert(kind, urn);
    }

    /// Whether this run has reached the URN.
    pub fn contains(&self, urn: &str) -> bool {
        self.current.contains(urn)
    }

    /// URNs recorded by the previous run and not reached by this one.
    ///
    /// An URN is stale only if absent under every kind, so an entity that
    /// changed kind between runs (a table replaced by a view of the same
    /// name) is not retracted.
    pub fn stale_urns(&self) -> Vec<String> {
        let Some(previous) = &self.previous else {
            return Vec::new();
        };
        let stale: BTreeSet<&str> = previous
            .iter()
            .map(|(_, urn)| urn)
            .filter(|urn| !self.current.contains(urn))
            .collect();
        stale.into_iter().map(str::to_string).collect()
    }

    /// State to persist: exactly this run's entities.
    pub fn into_state(self) -> RunState {
        let mut state = self.current;
        state.completed_at = chrono::Utc::now();
        state
    }

    /// Entities registered so far.
    pub fn current(&self) -> &RunState {
        &self.current
    }
}

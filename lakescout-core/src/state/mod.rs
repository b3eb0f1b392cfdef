//! Persisted run state and stale-entity tracking.
//!
//! A [`RunState`] records every container, table and view URN observed by
//! the last completed run. The [`StaleEntityTracker`] compares it with the
//! current run to produce retractions, then hands back the replacement
//! state, which a [`StateStore`] persists under a [`StateKey`].

mod store;
mod tracker;

pub use store::{FileStateStore, MemoryStateStore, StateStore};
pub use tracker::StaleEntityTracker;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Kind of entity recorded in run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateEntityKind {
    /// Database or schema container
    Container,
    Table,
    View,
}

impl StateEntityKind {
    /// Label the kind is grouped under in persisted state.
    pub fn as_str(self) -> &'static str {
        match self {
            StateEntityKind::Container => "container",
            StateEntityKind::Table => "table",
            StateEntityKind::View => "view",
        }
    }
}

/// Checkpoint key: one state per (platform, instance, source).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    pub platform: String,
    pub platform_instance: Option<String>,
    /// Connector's stable source identity
    pub source_id: String,
}

impl StateKey {
    /// Key for a source of `platform`.
    pub fn new(
        platform: impl Into<String>,
        platform_instance: Option<String>,
        source_id: impl Into<String>,
    ) -> Self {
        Self {
            platform: platform.into(),
            platform_instance,
            source_id: source_id.into(),
        }
    }

    /// Filesystem-safe name, unique per key.
    pub fn file_name(&self) -> String {
        let raw = format!(
            "{}|{}|{}",
            self.platform,
            self.platform_instance.as_deref().unwrap_or(""),
            self.source_id
        );
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        let digest = format!("{:x}", hasher.finalize());

        let readable: String = format!(
            "{}-{}",
            self.platform,
            self.platform_instance.as_deref().unwrap_or("default")
        )
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();

        format!("{}-{}.json", readable, &digest[..12])
    }
}

/// Entity URNs observed by one completed run, grouped by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// Run that produced this state
    pub run_id: Uuid,
    /// When the run finished
    pub completed_at: DateTime<Utc>,
    /// URNs grouped by kind label
    pub entities: BTreeMap<String, BTreeSet<String>>,
}

impl RunState {
    /// Empty state for `run_id`.
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            completed_at: Utc::now(),
            entities: BTreeMap::new(),
        }
    }

    /// Records a URN; `false` if it was already present under `kind`.
    pub fn insert(&mut self, kind: StateEntityKind, urn: impl Into<String>) -> bool {
        self.entities
            .entry(kind.as_str().to_string())
            .or_default()
            .insert(urn.into())
    }

    /// Whether the URN is recorded under any kind.
    pub fn contains(&self, urn: &str) -> bool {
        self.entities.values().any(|urns| urns.contains(urn))
    }

    /// Every recorded URN regardless of kind, with its kind label.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entities
            .iter()
            .flat_map(|(kind, urns)| urns.iter().map(move |urn| (kind.as_str(), urn.as_str())))
    }

    /// Number of recorded URNs.
    pub fn len(&self) -> usize {
        self.entities.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

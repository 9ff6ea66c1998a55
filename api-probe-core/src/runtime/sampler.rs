// api-probe-core/src/runtime/sampler.rs
// ============================================================================
// Module: State Sampler
// Description: Snapshot capture and differencing over the backing store.
// Purpose: Detect observable state changes attributable to probed requests.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The sampler captures per-kind counts and optional content checksums from
//! a [`StateSource`] and computes diffs between two captures. Checksums hash
//! the canonical JSON encoding of all materialized rows; equal checksums for
//! a kind imply equal contents. Per-kind sampling is retried once; a kind
//! that keeps failing is omitted from the snapshot but stays recorded so
//! properties can tell "no change" apart from "could not sample".

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::core::cancel::CancelToken;
use crate::core::checksum::DEFAULT_HASH_ALGORITHM;
use crate::core::checksum::HashDigest;
use crate::core::checksum::hash_canonical_json;
use crate::core::config::StateTrackingConfig;
use crate::core::identifiers::EntityKind;
use crate::core::time::Timestamp;
use crate::interfaces::StateSource;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Sampler errors.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// Entity kind enumeration failed.
    #[error("entity kind enumeration failed: {0}")]
    Enumeration(String),
    /// The capture observed cancellation.
    #[error("cancelled")]
    Cancelled,
}

// ============================================================================
// SECTION: Snapshots
// ============================================================================

/// Per-kind sample within a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySample {
    /// Row count at capture time.
    pub count: u64,
    /// Content checksum, when checksum tracking is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<HashDigest>,
}

/// Point-in-time summary of the backing store.
///
/// # Invariants
/// - If both snapshots in a diff carry checksums for a kind, equal checksums
///   imply equal contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Capture timestamp.
    pub captured_at: Timestamp,
    /// Samples by kind; kinds that failed to sample are absent here.
    pub entries: BTreeMap<EntityKind, EntitySample>,
    /// All kinds the capture tracked, including failed ones.
    pub tracked_kinds: BTreeSet<EntityKind>,
    /// Kinds whose sampling failed persistently.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub failed_kinds: BTreeSet<EntityKind>,
    /// Total capture wall-clock time.
    pub capture_time: Duration,
}

impl StateSnapshot {
    /// Returns the sampled count for a kind, when present.
    #[must_use]
    pub fn count(&self, kind: &EntityKind) -> Option<u64> {
        self.entries.get(kind).map(|sample| sample.count)
    }

    /// Computes the diff from this snapshot to a later one.
    #[must_use]
    pub fn diff(&self, after: &Self) -> StateDiff {
        let kinds: BTreeSet<&EntityKind> =
            self.entries.keys().chain(after.entries.keys()).collect();
        let mut changes = Vec::new();
        for kind in kinds {
            let before = self.entries.get(kind);
            let after_sample = after.entries.get(kind);
            let count_before = before.map_or(0, |sample| sample.count);
            let count_after = after_sample.map_or(0, |sample| sample.count);
            let checksum_before = before.and_then(|sample| sample.checksum.clone());
            let checksum_after = after_sample.and_then(|sample| sample.checksum.clone());
            let checksums_differ = matches!(
                (&checksum_before, &checksum_after),
                (Some(before), Some(after)) if before != after
            );
            if count_before != count_after || checksums_differ {
                changes.push(EntityChange {
                    kind: kind.clone(),
                    count_before,
                    count_after,
                    checksum_before,
                    checksum_after,
                });
            }
        }
        StateDiff {
            changes,
        }
    }
}

// ============================================================================
// SECTION: Diffs
// ============================================================================

/// One changed kind between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityChange {
    /// Changed kind.
    pub kind: EntityKind,
    /// Count in the earlier snapshot.
    pub count_before: u64,
    /// Count in the later snapshot.
    pub count_after: u64,
    /// Checksum in the earlier snapshot, when sampled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_before: Option<HashDigest>,
    /// Checksum in the later snapshot, when sampled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum_after: Option<HashDigest>,
}

impl EntityChange {
    /// Renders a one-line human-readable summary.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.count_before == self.count_after {
            format!("{}: contents changed ({} rows)", self.kind, self.count_after)
        } else {
            format!("{}: {} -> {}", self.kind, self.count_before, self.count_after)
        }
    }
}

/// Ordered set of changes between two snapshots.
///
/// # Invariants
/// - A change is emitted iff the count differs or both checksums are present
///   and differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StateDiff {
    /// Changes ordered by kind.
    pub changes: Vec<EntityChange>,
}

impl StateDiff {
    /// Returns true when at least one kind changed.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Returns the change for a kind, when present.
    #[must_use]
    pub fn change_for(&self, kind: &EntityKind) -> Option<&EntityChange> {
        self.changes.iter().find(|change| &change.kind == kind)
    }

    /// Renders all change summaries joined with `"; "`.
    #[must_use]
    pub fn summary(&self) -> String {
        self.changes.iter().map(EntityChange::summary).collect::<Vec<_>>().join("; ")
    }
}

// ============================================================================
// SECTION: Sampler
// ============================================================================

/// Captures state snapshots with bounded per-kind fan-out.
#[derive(Debug, Clone)]
pub struct StateSampler {
    /// Tracking configuration.
    config: StateTrackingConfig,
}

impl StateSampler {
    /// Creates a sampler with the given tracking configuration.
    #[must_use]
    pub const fn new(config: StateTrackingConfig) -> Self {
        Self {
            config,
        }
    }

    /// Returns the tracking configuration.
    #[must_use]
    pub const fn config(&self) -> &StateTrackingConfig {
        &self.config
    }

    /// Captures a snapshot from the source.
    ///
    /// Kinds are processed by up to `max_parallelism` workers draining a
    /// shared queue. Each kind is retried once on error; persistent failures
    /// are logged and recorded in `failed_kinds`.
    ///
    /// # Errors
    ///
    /// Returns [`SamplerError::Enumeration`] when kind enumeration fails and
    /// [`SamplerError::Cancelled`] when cancellation preempts the capture.
    pub fn capture(
        &self,
        source: &dyn StateSource,
        cancel: &CancelToken,
    ) -> Result<StateSnapshot, SamplerError> {
        if cancel.is_cancelled() {
            return Err(SamplerError::Cancelled);
        }
        let started = Instant::now();
        let captured_at = Timestamp::now();

        let descriptors = source
            .entity_kinds()
            .map_err(|err| SamplerError::Enumeration(err.to_string()))?;
        let kinds: Vec<EntityKind> = descriptors
            .into_iter()
            .map(|descriptor| descriptor.name)
            .filter(|kind| self.config.tracks(kind.as_str()))
            .collect();
        let tracked_kinds: BTreeSet<EntityKind> = kinds.iter().cloned().collect();

        let queue: Mutex<VecDeque<EntityKind>> = Mutex::new(kinds.iter().cloned().collect());
        let samples: Mutex<BTreeMap<EntityKind, EntitySample>> = Mutex::new(BTreeMap::new());
        let failed: Mutex<BTreeSet<EntityKind>> = Mutex::new(BTreeSet::new());

        let workers = self.config.max_parallelism.min(kinds.len()).max(1);
        thread::scope(|scope| {
            for _ in 0 .. workers {
                scope.spawn(|| {
                    loop {
                        if cancel.is_cancelled() {
                            return;
                        }
                        let Some(kind) = pop_kind(&queue) else {
                            return;
                        };
                        match self.sample_kind_with_retry(source, &kind) {
                            Ok(sample) => {
                                if let Ok(mut guard) = samples.lock() {
                                    guard.insert(kind, sample);
                                }
                            }
                            Err(err) => {
                                warn!(kind = %kind, error = %err, "entity sampling failed");
                                if let Ok(mut guard) = failed.lock() {
                                    guard.insert(kind);
                                }
                            }
                        }
                    }
                });
            }
        });

        if cancel.is_cancelled() {
            return Err(SamplerError::Cancelled);
        }

        let entries = samples.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner);
        let failed_kinds = failed.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(StateSnapshot {
            captured_at,
            entries,
            tracked_kinds,
            failed_kinds,
            capture_time: started.elapsed(),
        })
    }

    /// Samples one kind, retrying once on a transient error.
    fn sample_kind_with_retry(
        &self,
        source: &dyn StateSource,
        kind: &EntityKind,
    ) -> Result<EntitySample, String> {
        match self.sample_kind(source, kind) {
            Ok(sample) => Ok(sample),
            Err(first) => {
                warn!(kind = %kind, error = %first, "entity sampling failed, retrying once");
                self.sample_kind(source, kind).map_err(|second| format!("{first}; retry: {second}"))
            }
        }
    }

    /// Samples count and optional checksum for one kind.
    fn sample_kind(
        &self,
        source: &dyn StateSource,
        kind: &EntityKind,
    ) -> Result<EntitySample, String> {
        let deadline = Instant::now() + self.config.sample_timeout;
        let count = if self.config.track_entity_counts {
            source.count(kind).map_err(|err| err.to_string())?
        } else {
            0
        };
        if Instant::now() > deadline {
            return Err(format!("count query exceeded {:?}", self.config.sample_timeout));
        }
        let checksum = if self.config.track_entity_checksums {
            let rows = source.list_all(kind).map_err(|err| err.to_string())?;
            if Instant::now() > deadline {
                return Err(format!("row query exceeded {:?}", self.config.sample_timeout));
            }
            Some(
                hash_canonical_json(DEFAULT_HASH_ALGORITHM, &rows)
                    .map_err(|err| err.to_string())?,
            )
        } else {
            None
        };
        Ok(EntitySample {
            count,
            checksum,
        })
    }
}

/// Pops the next kind off the shared queue.
fn pop_kind(queue: &Mutex<VecDeque<EntityKind>>) -> Option<EntityKind> {
    queue.lock().ok().and_then(|mut guard| guard.pop_front())
}

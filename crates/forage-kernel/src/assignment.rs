//! Assignment table: the durable participant -> slot mapping for one generation.
//!
//! Each rater participant is seated in exactly one of `N` fixed slots for the
//! lifetime of a generation. Repeated lookups for the same participant (page
//! reloads, resumed sessions) return the recorded slot unchanged; a full table
//! refuses new identities loudly.
//!
//! The table itself is a plain value. Callers mutate it inside the chain
//! layer's per-node critical section so that concurrent allocations for one
//! node observe each other's entries.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

/// Canonical identity key for a participant within a generation.
///
/// The participant id is the identity; trial ids are reused across page
/// reloads and would alias. Numeric ids are coerced to their decimal string
/// form, which is also the storage form inside node vars.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantKey(String);

impl ParticipantKey {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        Self(raw.trim().to_string())
    }

    pub fn from_id(id: u64) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for ParticipantKey {
    fn from(id: u64) -> Self {
        ParticipantKey::from_id(id)
    }
}

/// Errors raised while seating a participant.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    /// All slots are taken and the identity is new. A capacity violation,
    /// not a transient condition: the participant cannot be seated in this
    /// generation and the failure must surface rather than retry.
    #[error(
        "slot pool exhausted: participant {identity} cannot be seated, all {pool_size} slots are taken"
    )]
    PoolExhausted {
        identity: ParticipantKey,
        pool_size: usize,
    },
}

/// Mapping from canonical participant key to a slot index in `[0, N)`.
///
/// Born empty with each chain node and reconstructed from node vars on every
/// request; superseded, never carried over, when a generation ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentTable {
    slots: BTreeMap<ParticipantKey, usize>,
}

impl AssignmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The recorded slot for an identity, if any.
    pub fn lookup(&self, identity: &ParticipantKey) -> Option<usize> {
        self.slots.get(identity).copied()
    }

    /// Slots currently held by any identity.
    pub fn taken_slots(&self) -> BTreeSet<usize> {
        self.slots.values().copied().collect()
    }

    /// Record `identity -> slot` unless the identity already has an entry.
    ///
    /// Returns the slot that ends up recorded, which is the existing one on
    /// a repeat call.
    pub fn insert_if_absent(&mut self, identity: ParticipantKey, slot: usize) -> usize {
        *self.slots.entry(identity).or_insert(slot)
    }

    /// Seat an identity in a slot of `[0, pool_size)`.
    ///
    /// Idempotent: a known identity gets its recorded slot back without any
    /// mutation. A new identity gets the lowest free slot (a stable
    /// tie-break that does not depend on map iteration order), and the entry
    /// is recorded before returning, so concurrent callers inside the same
    /// critical section observe it.
    pub fn allocate(
        &mut self,
        identity: &ParticipantKey,
        pool_size: usize,
    ) -> Result<usize, AssignmentError> {
        if let Some(slot) = self.lookup(identity) {
            debug!(%identity, slot, "assignment already recorded, reusing");
            return Ok(slot);
        }

        let taken = self.taken_slots();
        let slot = (0..pool_size)
            .find(|candidate| !taken.contains(candidate))
            .ok_or_else(|| AssignmentError::PoolExhausted {
                identity: identity.clone(),
                pool_size,
            })?;

        let recorded = self.insert_if_absent(identity.clone(), slot);
        info!(%identity, slot = recorded, pool_size, "seated participant in free slot");
        Ok(recorded)
    }
}

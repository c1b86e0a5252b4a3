//! Durable slot allocation and position lookup for rater participants.
//!
//! One canonical lock-scoped mutation path that:
//! - reuses the recorded slot when the participant was seen before
//! - otherwise seats the participant in the lowest free slot
//! - persists the updated table before the lock is released
//!
//! `assigned_position_json` composes allocation with the creator's
//! definition: the participant's slot indexes into the decoded positions.

use crate::atomic::{AtomicNodeError, mutate_node_json};
use crate::node::NodeStateError;
use crate::store::{NodeFileError, read_node_from_path};
use forage_kernel::assignment::{AssignmentError, ParticipantKey};
use forage_kernel::positions::{PositionsError, position_for_slot, positions_from_definition};
use std::path::Path;
use tracing::{debug, info};

/// A participant asking for their seat in the current generation.
#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub participant_id: u64,
    /// Fixed pool size for the experiment (the number of forager slots).
    pub pool_size: usize,
}

impl SlotRequest {
    pub fn new(participant_id: u64, pool_size: usize) -> Self {
        Self {
            participant_id,
            pool_size,
        }
    }
}

/// The seat a request resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotOutcome {
    pub slot: usize,
    /// False when the participant already held a slot and it was reused.
    pub newly_assigned: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AllocateError {
    #[error("pool size must be positive")]
    InvalidPoolSize,

    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    #[error(transparent)]
    Node(#[from] NodeStateError),

    #[error(transparent)]
    Positions(#[from] PositionsError),

    #[error(transparent)]
    File(#[from] NodeFileError),

    #[error("node lock busy: {lock_path}")]
    LockBusy { lock_path: String },

    #[error("failed to acquire node lock {lock_path}: {message}")]
    LockIo { lock_path: String, message: String },
}

impl AllocateError {
    fn from_atomic(err: AtomicNodeError<AllocateError>) -> Self {
        match err {
            AtomicNodeError::LockBusy { lock_path } => AllocateError::LockBusy { lock_path },
            AtomicNodeError::LockIo { lock_path, message } => {
                AllocateError::LockIo { lock_path, message }
            }
            AtomicNodeError::File(err) => AllocateError::File(err),
            AtomicNodeError::Mutation(err) => err,
        }
    }
}

/// Seat a participant in the node at `path`, durably.
///
/// Idempotent across reloads and resumed sessions; a full pool surfaces
/// [`AssignmentError::PoolExhausted`] instead of retrying.
pub fn allocate_slot_json(
    path: impl AsRef<Path>,
    request: &SlotRequest,
) -> Result<SlotOutcome, AllocateError> {
    if request.pool_size == 0 {
        return Err(AllocateError::InvalidPoolSize);
    }
    let identity = ParticipantKey::from_id(request.participant_id);

    let outcome = mutate_node_json(path.as_ref(), |node| {
        let mut table = node.assignments()?;
        let before = table.len();
        debug!(node = node.id, entries = before, "assignment table before request");

        let slot = table.allocate(&identity, request.pool_size)?;
        let newly_assigned = table.len() > before;
        if newly_assigned {
            node.set_assignments(&table)?;
        }

        Ok::<_, AllocateError>((
            SlotOutcome {
                slot,
                newly_assigned,
            },
            newly_assigned,
        ))
    })
    .map_err(AllocateError::from_atomic)?;

    info!(
        participant = request.participant_id,
        slot = outcome.slot,
        newly_assigned = outcome.newly_assigned,
        "resolved slot for participant"
    );
    Ok(outcome)
}

/// The position label a participant's slot resolves to.
///
/// Allocates (or reuses) the slot first, then decodes the creator
/// definition's positions and indexes into them. The read after allocation
/// needs no lock: node writes are atomic replacements, and a recorded slot
/// never changes within a generation.
pub fn assigned_position_json(
    path: impl AsRef<Path>,
    request: &SlotRequest,
) -> Result<String, AllocateError> {
    let path = path.as_ref();
    let outcome = allocate_slot_json(path, request)?;

    let node = read_node_from_path(path)?;
    let definition = node.creator_definition()?;
    let positions = positions_from_definition(definition)?;
    let label = position_for_slot(&positions, outcome.slot)?;

    info!(
        participant = request.participant_id,
        slot = outcome.slot,
        position = label,
        "resolved position for participant"
    );
    Ok(label.to_string())
}

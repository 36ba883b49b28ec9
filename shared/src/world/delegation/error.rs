use thiserror::Error as ThisError;

use crate::{Actor, ObjectId, ParticipantKey};

/// Errors that can occur during ownership arbitration
#[derive(Debug, Clone, ThisError, PartialEq, Eq)]
pub enum OwnershipError {
    /// Object has no live entry in the arbiter
    #[error("Object {object} is not registered for ownership arbitration")]
    NotFound { object: ObjectId },

    /// Mutation attempted by someone who is not the current owner
    #[error("{actor:?} is not the owner of {object} (current owner: {owner:?})")]
    NotOwner {
        object: ObjectId,
        actor: Actor,
        owner: Option<ParticipantKey>,
    },

    /// Object was already owned by another participant when the request resolved
    #[error("{object} is already owned by {owner:?}")]
    AlreadyOwned {
        object: ObjectId,
        owner: ParticipantKey,
    },

    /// Request lost against an earlier request for the same object
    #[error("Ownership request by {requester:?} for {object} conflicts with an earlier request")]
    RequestConflict {
        object: ObjectId,
        requester: ParticipantKey,
    },

    /// Participant is not (or no longer) connected
    #[error("Participant {participant:?} is not connected")]
    Disconnected { participant: ParticipantKey },

    /// Owner lock is poisoned (internal consistency error)
    #[error("Owner lock is poisoned - this indicates a panic occurred while holding the lock")]
    LockPoisoned,
}

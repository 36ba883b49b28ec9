use thiserror::Error;

use crate::ObjectId;

/// Errors that can occur during ObjectRegistry operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Operation referenced an object with no live entry
    #[error("{object} is not registered")]
    NotFound { object: ObjectId },

    /// Re-parenting would make an object its own ancestor
    #[error("Cannot parent {object} under {parent}: {parent} is {object} or one of its descendants")]
    ParentCycle { object: ObjectId, parent: ObjectId },

    /// Registry lock is poisoned (internal consistency error)
    #[error("Registry lock is poisoned - this indicates a panic occurred while holding the lock")]
    LockPoisoned,
}

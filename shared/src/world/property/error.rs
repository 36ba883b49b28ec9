use thiserror::Error;

use crate::ObjectId;

/// Errors that can occur during PropertyChangeLog operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PropertyLogError {
    /// Object is not tracked by the change log
    #[error("{object} is not tracked by the property change log")]
    NotFound { object: ObjectId },

    /// Object was tracked twice
    #[error("{object} is already tracked by the property change log")]
    AlreadyTracked { object: ObjectId },

    /// The change log owning the command queue has been dropped
    #[error("Property change log has been dropped, command was not delivered")]
    LogDropped,
}

use thiserror::Error;

use tether_shared::{ObjectId, OwnershipStatus};

/// Errors that can occur on the Client
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// No status or frame has been received for this object
    #[error("{object} is unknown to this client")]
    UnknownObject { object: ObjectId },

    /// The action is not allowed from the object's current ownership status
    #[error("Cannot {action} {object} while its ownership status is {status:?}")]
    InvalidTransition {
        object: ObjectId,
        action: &'static str,
        status: OwnershipStatus,
    },

    /// Received a message that only participants send
    #[error("Received a {message} message, which only participants send")]
    UnexpectedMessage { message: &'static str },

    /// The authority only ever reports Available, Granted or Denied
    #[error("Received transient status {status:?} for {object}")]
    UnexpectedStatus {
        object: ObjectId,
        status: OwnershipStatus,
    },
}

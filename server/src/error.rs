use thiserror::Error;

use tether_shared::{OwnershipError, ParticipantKey, PropertyLogError, RegistryError};

/// Errors surfaced by the Server
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServerError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Ownership(#[from] OwnershipError),

    #[error(transparent)]
    PropertyLog(#[from] PropertyLogError),

    /// The participant was never connected, or has already disconnected
    #[error("Participant {participant:?} is not connected")]
    UnknownParticipant { participant: ParticipantKey },

    /// A participant sent a message only the authority may send
    #[error("Participant {participant:?} sent a {message} message, which only the authority may send")]
    UnexpectedMessage {
        participant: ParticipantKey,
        message: &'static str,
    },
}

impl ServerError {
    /// The ownership error underneath, if there is one
    pub fn as_ownership(&self) -> Option<&OwnershipError> {
        match self {
            ServerError::Ownership(error) => Some(error),
            _ => None,
        }
    }
}

use crate::{ObjectId, OwnershipStatus, ParticipantKey};

/// Ownership traffic between participants and the authority.
///
/// Status updates are absolute rather than deltas, so a redelivered or
/// reordered `SetStatus` converges to the authority's latest answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnershipMessage {
    // participant -> authority
    Request(ObjectId),
    Release(ObjectId),
    Transfer(ObjectId, ParticipantKey),

    // authority -> participant
    SetStatus(ObjectId, OwnershipStatus),
    Despawned(ObjectId),
}

impl OwnershipMessage {
    pub fn object(&self) -> ObjectId {
        match self {
            OwnershipMessage::Request(object)
            | OwnershipMessage::Release(object)
            | OwnershipMessage::Transfer(object, _)
            | OwnershipMessage::SetStatus(object, _)
            | OwnershipMessage::Despawned(object) => *object,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OwnershipMessage::Request(_) => "Request",
            OwnershipMessage::Release(_) => "Release",
            OwnershipMessage::Transfer(_, _) => "Transfer",
            OwnershipMessage::SetStatus(_, _) => "SetStatus",
            OwnershipMessage::Despawned(_) => "Despawned",
        }
    }
}

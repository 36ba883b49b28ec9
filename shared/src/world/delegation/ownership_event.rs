use crate::{ObjectId, OwnershipError, ParticipantKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseReason {
    /// The owner gave the object up
    Released,
    /// The owner left and the disconnect sweep released the object
    OwnerDisconnected,
}

/// Emitted by the arbiter every time ownership of an object changes or a request is turned down
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnershipEvent {
    Granted {
        object: ObjectId,
        owner: ParticipantKey,
    },
    Denied {
        object: ObjectId,
        requester: ParticipantKey,
        error: OwnershipError,
    },
    Released {
        object: ObjectId,
        previous_owner: ParticipantKey,
        reason: ReleaseReason,
    },
    Transferred {
        object: ObjectId,
        from: ParticipantKey,
        to: ParticipantKey,
    },
    /// The Server took ownership back
    Reclaimed {
        object: ObjectId,
        previous_owner: ParticipantKey,
    },
}

impl OwnershipEvent {
    pub fn object(&self) -> ObjectId {
        match self {
            OwnershipEvent::Granted { object, .. }
            | OwnershipEvent::Denied { object, .. }
            | OwnershipEvent::Released { object, .. }
            | OwnershipEvent::Transferred { object, .. }
            | OwnershipEvent::Reclaimed { object, .. } => *object,
        }
    }

    /// Owner of the object right after this event, `None` for a Denied event
    /// which does not change ownership
    pub fn new_owner(&self) -> Option<Option<ParticipantKey>> {
        match self {
            OwnershipEvent::Granted { owner, .. } => Some(Some(*owner)),
            OwnershipEvent::Transferred { to, .. } => Some(Some(*to)),
            OwnershipEvent::Released { .. } | OwnershipEvent::Reclaimed { .. } => Some(None),
            OwnershipEvent::Denied { .. } => None,
        }
    }
}

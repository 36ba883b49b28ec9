use std::sync::{Arc, RwLock};

use crate::{world::delegation::error::OwnershipError, ObjectId, ParticipantKey};

type Outcome = Option<Result<(), OwnershipError>>;

/// Deferred completion of an ownership request.
///
/// A ticket stays pending until the authority resolves the request queue,
/// after which every clone reports the same outcome. The requester does not
/// own the object before `is_granted()` returns true.
#[derive(Clone, Debug)]
pub struct OwnershipTicket {
    object: ObjectId,
    requester: ParticipantKey,
    outcome: Arc<RwLock<Outcome>>,
}

impl OwnershipTicket {
    pub(crate) fn pending(object: &ObjectId, requester: &ParticipantKey) -> Self {
        Self {
            object: *object,
            requester: *requester,
            outcome: Arc::new(RwLock::new(None)),
        }
    }

    pub(crate) fn granted(object: &ObjectId, requester: &ParticipantKey) -> Self {
        Self {
            object: *object,
            requester: *requester,
            outcome: Arc::new(RwLock::new(Some(Ok(())))),
        }
    }

    /// Only the first completion is kept; returns whether this call completed the ticket
    pub(crate) fn complete(&self, result: Result<(), OwnershipError>) -> bool {
        let mut outcome = self
            .outcome
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if outcome.is_some() {
            return false;
        }
        *outcome = Some(result);
        true
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn requester(&self) -> ParticipantKey {
        self.requester
    }

    pub fn outcome(&self) -> Option<Result<(), OwnershipError>> {
        self.outcome
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_pending(&self) -> bool {
        self.outcome().is_none()
    }

    pub fn is_granted(&self) -> bool {
        matches!(self.outcome(), Some(Ok(())))
    }

    pub fn error(&self) -> Option<OwnershipError> {
        match self.outcome() {
            Some(Err(error)) => Some(error),
            _ => None,
        }
    }

    /// Whether both tickets are handles to the same in-flight request
    pub fn same_request(&self, other: &OwnershipTicket) -> bool {
        Arc::ptr_eq(&self.outcome, &other.outcome)
    }
}

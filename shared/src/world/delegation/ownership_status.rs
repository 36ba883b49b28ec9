use crate::ParticipantKey;

/// Ownership of an object as seen from a single participant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OwnershipStatus {
    /// Nobody but the Server owns the object, it can be requested
    Available,
    /// A request has been sent and no answer has arrived yet
    Requested,
    /// This participant is the owner
    Granted,
    /// A release or transfer has been sent and no answer has arrived yet
    Releasing,
    /// Another participant owns the object
    Denied,
}

impl OwnershipStatus {
    /// The status the authority reports to `participant` for an object currently owned by `owner`
    pub fn for_participant(owner: Option<ParticipantKey>, participant: &ParticipantKey) -> Self {
        match owner {
            None => OwnershipStatus::Available,
            Some(owner) if owner == *participant => OwnershipStatus::Granted,
            Some(_) => OwnershipStatus::Denied,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OwnershipStatus::Available => "Available",
            OwnershipStatus::Requested => "Requested",
            OwnershipStatus::Granted => "Granted",
            OwnershipStatus::Releasing => "Releasing",
            OwnershipStatus::Denied => "Denied",
        }
    }

    pub fn is_mine(&self) -> bool {
        matches!(self, OwnershipStatus::Granted)
    }

    pub fn can_request(&self) -> bool {
        matches!(self, OwnershipStatus::Available)
    }

    pub fn can_release(&self) -> bool {
        matches!(self, OwnershipStatus::Requested | OwnershipStatus::Granted)
    }

    pub fn can_transfer(&self) -> bool {
        matches!(self, OwnershipStatus::Granted)
    }
}

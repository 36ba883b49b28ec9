use std::sync::{Arc, RwLock};

use crate::{world::delegation::error::OwnershipError, ParticipantKey};

// OwnerChannel
#[derive(Clone)]
pub(crate) struct OwnerChannel {
    data: Arc<RwLock<OwnerData>>,
}

impl OwnerChannel {
    pub(crate) fn new_channel() -> (OwnerMutator, OwnerAccessor) {
        let channel = Self {
            data: Arc::new(RwLock::new(OwnerData::new())),
        };

        let mutator = OwnerMutator::new(&channel);
        let accessor = OwnerAccessor::new(&channel);

        (mutator, accessor)
    }

    fn owner(&self) -> Result<Option<ParticipantKey>, OwnershipError> {
        let data = self
            .data
            .as_ref()
            .read()
            .map_err(|_| OwnershipError::LockPoisoned)?;
        Ok(data.owner)
    }

    fn generation(&self) -> Result<u64, OwnershipError> {
        let data = self
            .data
            .as_ref()
            .read()
            .map_err(|_| OwnershipError::LockPoisoned)?;
        Ok(data.generation)
    }

    /// Swaps in the new owner with a single write, returning the previous one
    fn set_owner(
        &self,
        owner: Option<ParticipantKey>,
    ) -> Result<Option<ParticipantKey>, OwnershipError> {
        let mut data = self
            .data
            .as_ref()
            .write()
            .map_err(|_| OwnershipError::LockPoisoned)?;
        Ok(data.set_owner(owner))
    }
}

// OwnerData
struct OwnerData {
    owner: Option<ParticipantKey>,
    generation: u64,
}

impl OwnerData {
    fn new() -> Self {
        Self {
            owner: None,
            generation: 0,
        }
    }

    fn set_owner(&mut self, owner: Option<ParticipantKey>) -> Option<ParticipantKey> {
        let previous = std::mem::replace(&mut self.owner, owner);
        if previous != owner {
            self.generation += 1;
        }
        previous
    }
}

// OwnerAccessor
/// Read-only view of an object's owner. Cheap to clone and safe to read from
/// any thread; reads never wait on queued ownership requests.
#[derive(Clone)]
pub struct OwnerAccessor {
    channel: OwnerChannel,
}

impl OwnerAccessor {
    fn new(channel: &OwnerChannel) -> Self {
        Self {
            channel: channel.clone(),
        }
    }

    pub fn owner(&self) -> Result<Option<ParticipantKey>, OwnershipError> {
        self.channel.owner()
    }

    /// Number of times the owner has changed since the object was registered
    pub fn generation(&self) -> Result<u64, OwnershipError> {
        self.channel.generation()
    }
}

// OwnerMutator
// no Clone, there is exactly one writer per object
pub struct OwnerMutator {
    channel: OwnerChannel,
}

impl OwnerMutator {
    fn new(channel: &OwnerChannel) -> Self {
        Self {
            channel: channel.clone(),
        }
    }

    pub(crate) fn owner(&self) -> Result<Option<ParticipantKey>, OwnershipError> {
        self.channel.owner()
    }

    pub(crate) fn set_owner(
        &self,
        owner: Option<ParticipantKey>,
    ) -> Result<Option<ParticipantKey>, OwnershipError> {
        self.channel.set_owner(owner)
    }
}

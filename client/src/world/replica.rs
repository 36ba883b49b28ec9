use std::collections::HashMap;

use tether_shared::{
    tick_less_than, OwnershipStatus, ParticipantKey, PropertyValue, ReplicationFrame,
    RigidbodyState, Tick, Transform,
};

/// The Client's copy of a networked object
#[derive(Clone, Debug)]
pub struct Replica {
    status: OwnershipStatus,
    owner: Option<ParticipantKey>,
    transform: Transform,
    rigidbody: RigidbodyState,
    properties: HashMap<String, PropertyValue>,
    last_tick: Option<Tick>,
}

impl Replica {
    pub(crate) fn new(status: OwnershipStatus) -> Self {
        Self {
            status,
            owner: None,
            transform: Transform::default(),
            rigidbody: RigidbodyState::default(),
            properties: HashMap::new(),
            last_tick: None,
        }
    }

    pub fn status(&self) -> OwnershipStatus {
        self.status
    }

    /// Owner as of the last frame or status update. `None` means the Server.
    pub fn owner(&self) -> Option<ParticipantKey> {
        self.owner
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn rigidbody(&self) -> &RigidbodyState {
        &self.rigidbody
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn properties(&self) -> &HashMap<String, PropertyValue> {
        &self.properties
    }

    /// Tick of the newest frame applied
    pub fn last_tick(&self) -> Option<Tick> {
        self.last_tick
    }

    pub(crate) fn set_status(&mut self, status: OwnershipStatus) -> OwnershipStatus {
        std::mem::replace(&mut self.status, status)
    }

    pub(crate) fn set_owner(&mut self, owner: Option<ParticipantKey>) {
        self.owner = owner;
    }

    /// Applies a frame unless it is older than one already applied
    pub(crate) fn apply_frame(&mut self, frame: &ReplicationFrame) -> bool {
        if let Some(last_tick) = self.last_tick {
            if tick_less_than(frame.tick, last_tick) {
                return false;
            }
        }
        self.last_tick = Some(frame.tick);
        self.owner = frame.owner;

        if let Some(transform) = frame.transform {
            self.transform = transform;
        }
        if let Some(rigidbody) = frame.rigidbody {
            self.rigidbody = rigidbody;
        }
        if let Some(changes) = &frame.properties {
            for key in changes.removed() {
                self.properties.remove(key);
            }
            for (key, value) in changes.changed() {
                self.properties.insert(key.clone(), value.clone());
            }
        }
        true
    }
}

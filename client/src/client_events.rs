use std::{mem, vec::IntoIter};

use tether_shared::ObjectId;

/// Ownership and replication changes observed by the Client since events were last taken
pub struct ClientEvents {
    grants: Vec<ObjectId>,
    denials: Vec<ObjectId>,
    resets: Vec<ObjectId>,
    despawns: Vec<ObjectId>,
    updates: Vec<ObjectId>,
    empty: bool,
}

impl Default for ClientEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientEvents {
    pub(crate) fn new() -> Self {
        Self {
            grants: Vec::new(),
            denials: Vec::new(),
            resets: Vec::new(),
            despawns: Vec::new(),
            updates: Vec::new(),
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: ClientEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: ClientEvent>(&self) -> bool {
        V::has(self)
    }

    pub(crate) fn push_grant(&mut self, object: &ObjectId) {
        self.grants.push(*object);
        self.empty = false;
    }

    pub(crate) fn push_denial(&mut self, object: &ObjectId) {
        self.denials.push(*object);
        self.empty = false;
    }

    pub(crate) fn push_reset(&mut self, object: &ObjectId) {
        self.resets.push(*object);
        self.empty = false;
    }

    pub(crate) fn push_despawn(&mut self, object: &ObjectId) {
        self.despawns.push(*object);
        self.empty = false;
    }

    pub(crate) fn push_update(&mut self, object: &ObjectId) {
        self.updates.push(*object);
        self.empty = false;
    }
}

// Event Trait
pub trait ClientEvent {
    type Iter;

    fn iter(events: &mut ClientEvents) -> Self::Iter;

    fn has(events: &ClientEvents) -> bool;
}

// Ownership Granted Event, this Client became the owner
pub struct OwnershipGrantedEvent;
impl ClientEvent for OwnershipGrantedEvent {
    type Iter = IntoIter<ObjectId>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        mem::take(&mut events.grants).into_iter()
    }

    fn has(events: &ClientEvents) -> bool {
        !events.grants.is_empty()
    }
}

// Ownership Denied Event, a request of this Client did not succeed
pub struct OwnershipDeniedEvent;
impl ClientEvent for OwnershipDeniedEvent {
    type Iter = IntoIter<ObjectId>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        mem::take(&mut events.denials).into_iter()
    }

    fn has(events: &ClientEvents) -> bool {
        !events.denials.is_empty()
    }
}

// Ownership Reset Event, this Client lost ownership
pub struct OwnershipResetEvent;
impl ClientEvent for OwnershipResetEvent {
    type Iter = IntoIter<ObjectId>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        mem::take(&mut events.resets).into_iter()
    }

    fn has(events: &ClientEvents) -> bool {
        !events.resets.is_empty()
    }
}

// Despawn Object Event
pub struct DespawnObjectEvent;
impl ClientEvent for DespawnObjectEvent {
    type Iter = IntoIter<ObjectId>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        mem::take(&mut events.despawns).into_iter()
    }

    fn has(events: &ClientEvents) -> bool {
        !events.despawns.is_empty()
    }
}

// Update Object Event, a replication frame was applied
pub struct UpdateObjectEvent;
impl ClientEvent for UpdateObjectEvent {
    type Iter = IntoIter<ObjectId>;

    fn iter(events: &mut ClientEvents) -> Self::Iter {
        mem::take(&mut events.updates).into_iter()
    }

    fn has(events: &ClientEvents) -> bool {
        !events.updates.is_empty()
    }
}

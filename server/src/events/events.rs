use std::{mem, vec::IntoIter};

use log::warn;

use tether_shared::{ObjectId, OwnershipError, OwnershipEvent, ParticipantKey, ReleaseReason, Tick};

use crate::ServerError;

/// Everything that happened on the Server since events were last taken
pub struct Events {
    connections: Vec<ParticipantKey>,
    disconnections: Vec<ParticipantKey>,
    spawns: Vec<ObjectId>,
    despawns: Vec<ObjectId>,
    grants: Vec<(ObjectId, ParticipantKey)>,
    denials: Vec<(ObjectId, ParticipantKey, OwnershipError)>,
    releases: Vec<(ObjectId, ParticipantKey, ReleaseReason)>,
    transfers: Vec<(ObjectId, ParticipantKey, ParticipantKey)>,
    reclaims: Vec<(ObjectId, ParticipantKey)>,
    ticks: Vec<Tick>,
    errors: Vec<ServerError>,
    empty: bool,
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            disconnections: Vec::new(),
            spawns: Vec::new(),
            despawns: Vec::new(),
            grants: Vec::new(),
            denials: Vec::new(),
            releases: Vec::new(),
            transfers: Vec::new(),
            reclaims: Vec::new(),
            ticks: Vec::new(),
            errors: Vec::new(),
            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_connection(&mut self, participant: &ParticipantKey) {
        self.connections.push(*participant);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, participant: &ParticipantKey) {
        self.disconnections.push(*participant);
        self.empty = false;
    }

    pub(crate) fn push_spawn(&mut self, object: &ObjectId) {
        self.spawns.push(*object);
        self.empty = false;
    }

    pub(crate) fn push_despawn(&mut self, object: &ObjectId) {
        self.despawns.push(*object);
        self.empty = false;
    }

    pub(crate) fn push_tick(&mut self, tick: Tick) {
        self.ticks.push(tick);
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: ServerError) {
        self.errors.push(error);
        self.empty = false;
    }

    pub(crate) fn push_ownership(&mut self, event: OwnershipEvent) {
        match event {
            OwnershipEvent::Granted { object, owner } => self.grants.push((object, owner)),
            OwnershipEvent::Denied {
                object,
                requester,
                error,
            } => self.denials.push((object, requester, error)),
            OwnershipEvent::Released {
                object,
                previous_owner,
                reason,
            } => self.releases.push((object, previous_owner, reason)),
            OwnershipEvent::Transferred { object, from, to } => {
                self.transfers.push((object, from, to))
            }
            OwnershipEvent::Reclaimed {
                object,
                previous_owner,
            } => self.reclaims.push((object, previous_owner)),
        }
        self.empty = false;
    }
}

impl Drop for Events {
    fn drop(&mut self) {
        if !self.errors.is_empty() {
            warn!("Dropped {} Server Error Event(s)! Make sure to handle these through `events.read::<ErrorEvent>()`.", self.errors.len());
        }
        if !self.denials.is_empty() {
            warn!("Dropped {} Ownership Deny Event(s)! Make sure to handle these through `events.read::<OwnershipDenyEvent>()`.", self.denials.len());
        }
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut Events) -> Self::Iter;

    fn has(events: &Events) -> bool;
}

// Connect Event
pub struct ConnectEvent;
impl Event for ConnectEvent {
    type Iter = IntoIter<ParticipantKey>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.connections).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.connections.is_empty()
    }
}

// Disconnect Event
pub struct DisconnectEvent;
impl Event for DisconnectEvent {
    type Iter = IntoIter<ParticipantKey>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.disconnections).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.disconnections.is_empty()
    }
}

// Spawn Object Event
pub struct SpawnObjectEvent;
impl Event for SpawnObjectEvent {
    type Iter = IntoIter<ObjectId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.spawns).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.spawns.is_empty()
    }
}

// Despawn Object Event
pub struct DespawnObjectEvent;
impl Event for DespawnObjectEvent {
    type Iter = IntoIter<ObjectId>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.despawns).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.despawns.is_empty()
    }
}

// Ownership Grant Event
pub struct OwnershipGrantEvent;
impl Event for OwnershipGrantEvent {
    type Iter = IntoIter<(ObjectId, ParticipantKey)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.grants).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.grants.is_empty()
    }
}

// Ownership Deny Event
pub struct OwnershipDenyEvent;
impl Event for OwnershipDenyEvent {
    type Iter = IntoIter<(ObjectId, ParticipantKey, OwnershipError)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.denials).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.denials.is_empty()
    }
}

// Ownership Release Event
pub struct OwnershipReleaseEvent;
impl Event for OwnershipReleaseEvent {
    type Iter = IntoIter<(ObjectId, ParticipantKey, ReleaseReason)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.releases).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.releases.is_empty()
    }
}

// Ownership Transfer Event, yields (object, from, to)
pub struct OwnershipTransferEvent;
impl Event for OwnershipTransferEvent {
    type Iter = IntoIter<(ObjectId, ParticipantKey, ParticipantKey)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.transfers).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.transfers.is_empty()
    }
}

// Ownership Reclaim Event
pub struct OwnershipReclaimEvent;
impl Event for OwnershipReclaimEvent {
    type Iter = IntoIter<(ObjectId, ParticipantKey)>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.reclaims).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.reclaims.is_empty()
    }
}

// Tick Event
pub struct TickEvent;
impl Event for TickEvent {
    type Iter = IntoIter<Tick>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.ticks).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.ticks.is_empty()
    }
}

// Error Event
pub struct ErrorEvent;
impl Event for ErrorEvent {
    type Iter = IntoIter<ServerError>;

    fn iter(events: &mut Events) -> Self::Iter {
        mem::take(&mut events.errors).into_iter()
    }

    fn has(events: &Events) -> bool {
        !events.errors.is_empty()
    }
}

//! # Tether Server
//! The authority for a set of networked objects: arbitrates which connected
//! participant owns each object, guards writes by ownership, and builds the
//! replication frames and status messages the transport layer delivers.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use tether_shared::{
        Actor, DisconnectSweep, NetworkObject, NewObject, ObjectId, OwnerAccessor,
        OwnershipError, OwnershipMessage, OwnershipStatus, OwnershipTicket, ParticipantKey,
        PropertyChangeSet, PropertyCommandSender, PropertyLogError, PropertyValue,
        RegistryError, ReleaseReason, ReplicationFrame, RigidbodyState, SpawnSource, SyncFlags,
        Tick, Transform,
    };
}

mod error;
mod events;
mod property_observer;
mod server;

pub use error::ServerError;
pub use events::{
    ConnectEvent, DespawnObjectEvent, DisconnectEvent, ErrorEvent, Event, Events,
    OwnershipDenyEvent, OwnershipGrantEvent, OwnershipReclaimEvent, OwnershipReleaseEvent,
    OwnershipTransferEvent, SpawnObjectEvent, TickEvent,
};
pub use property_observer::PropertyObserver;
pub use server::{DisconnectPolicy, Server, ServerConfig};

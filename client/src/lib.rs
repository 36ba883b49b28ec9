//! # Tether Client
//! The participant side of tether: keeps the ownership status of every
//! networked object it has heard of, queues ownership requests for the
//! authority, and applies replication frames to a local replica of each
//! object.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use tether_shared::{
        ObjectId, OwnershipMessage, OwnershipStatus, ParticipantKey, PropertyValue,
        ReplicationFrame, RigidbodyState, Tick, Transform,
    };
}

mod client;
mod client_events;
mod error;
mod world;

pub use client::Client;
pub use client_events::{
    ClientEvent, ClientEvents, DespawnObjectEvent, OwnershipDeniedEvent, OwnershipGrantedEvent,
    OwnershipResetEvent, UpdateObjectEvent,
};
pub use error::ClientError;
pub use world::replica::Replica;

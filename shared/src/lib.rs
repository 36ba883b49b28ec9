//! # Tether Shared
//! Object registry, ownership arbitration, property change log and sync
//! dispatch shared between the tether-server & tether-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod key_generator;
mod messages;
mod types;
mod world;
mod wrapping_number;

pub use key_generator::KeyGenerator;
pub use messages::ownership_message::OwnershipMessage;
pub use types::{Actor, ParticipantKey, Tick};
pub use wrapping_number::{tick_greater_than, tick_less_than};
pub use world::{
    delegation::{
        error::OwnershipError,
        ownership_arbiter::{ArbiterConfig, DisconnectSweep, OwnershipArbiter},
        ownership_channel::{OwnerAccessor, OwnerMutator},
        ownership_event::{OwnershipEvent, ReleaseReason},
        ownership_status::OwnershipStatus,
        ownership_ticket::OwnershipTicket,
        request_queue::OwnershipRequest,
    },
    object::{
        network_object::{NetworkObject, NewObject, ObjectState},
        object_id::ObjectId,
        spawn_source::SpawnSource,
        sync_flags::SyncFlags,
        transform::{RigidbodyState, Transform},
    },
    property::{
        change_set::PropertyChangeSet,
        error::PropertyLogError,
        property_change_log::PropertyChangeLog,
        property_command::{PropertyCommand, PropertyCommandSender},
        property_value::PropertyValue,
    },
    registry::{error::RegistryError, object_registry::ObjectRegistry},
    replication::{replication_frame::ReplicationFrame, sync_dispatcher::SyncDispatcher},
};

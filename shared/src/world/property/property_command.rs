use crossbeam_channel::Sender;

use crate::{Actor, ObjectId, PropertyLogError, PropertyValue};

/// A property write routed from another thread to the thread that owns the
/// change log. It carries the Actor it is written on behalf of, and is held
/// to the same ownership rules as a direct write.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyCommand {
    Set {
        actor: Actor,
        object: ObjectId,
        key: String,
        value: PropertyValue,
    },
    Remove {
        actor: Actor,
        object: ObjectId,
        key: String,
    },
}

impl PropertyCommand {
    pub fn object(&self) -> ObjectId {
        match self {
            PropertyCommand::Set { object, .. } | PropertyCommand::Remove { object, .. } => *object,
        }
    }

    pub fn actor(&self) -> Actor {
        match self {
            PropertyCommand::Set { actor, .. } | PropertyCommand::Remove { actor, .. } => *actor,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            PropertyCommand::Set { key, .. } | PropertyCommand::Remove { key, .. } => key,
        }
    }
}

/// Cloneable handle for writing properties from any thread. Commands are
/// applied the next time the owning thread calls `apply_pending_commands`.
#[derive(Clone)]
pub struct PropertyCommandSender {
    sender: Sender<PropertyCommand>,
}

impl PropertyCommandSender {
    pub(crate) fn new(sender: Sender<PropertyCommand>) -> Self {
        Self { sender }
    }

    pub fn set_property<K: Into<String>, V: Into<PropertyValue>>(
        &self,
        actor: &Actor,
        object: &ObjectId,
        key: K,
        value: V,
    ) -> Result<(), PropertyLogError> {
        self.send(PropertyCommand::Set {
            actor: *actor,
            object: *object,
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn remove_property<K: Into<String>>(
        &self,
        actor: &Actor,
        object: &ObjectId,
        key: K,
    ) -> Result<(), PropertyLogError> {
        self.send(PropertyCommand::Remove {
            actor: *actor,
            object: *object,
            key: key.into(),
        })
    }

    pub fn send(&self, command: PropertyCommand) -> Result<(), PropertyLogError> {
        self.sender
            .send(command)
            .map_err(|_| PropertyLogError::LogDropped)
    }
}

use crate::{ObjectId, ParticipantKey, RigidbodyState, SpawnSource, SyncFlags, Transform};

/// Everything needed to register a new object
#[derive(Clone, Debug)]
pub struct NewObject {
    pub spawn_source: SpawnSource,
    pub parent: Option<ObjectId>,
    pub sync_flags: SyncFlags,
    pub transform: Transform,
}

impl NewObject {
    pub fn new(spawn_source: SpawnSource) -> Self {
        Self {
            spawn_source,
            parent: None,
            sync_flags: SyncFlags::default(),
            transform: Transform::default(),
        }
    }

    pub fn with_parent(mut self, parent: ObjectId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_sync_flags(mut self, sync_flags: SyncFlags) -> Self {
        self.sync_flags = sync_flags;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// Mutable replicated state of an object, written only by its current owner
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectState {
    pub transform: Transform,
    pub rigidbody: RigidbodyState,
}

/// A point-in-time snapshot of a registered object
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkObject {
    pub id: ObjectId,
    pub parent: Option<ObjectId>,
    /// `None` means the object is owned by the Server
    pub owner: Option<ParticipantKey>,
    pub sync_flags: SyncFlags,
    pub spawn_source: SpawnSource,
    pub state: ObjectState,
}

impl NetworkObject {
    pub fn is_owned_by(&self, participant: &ParticipantKey) -> bool {
        self.owner.as_ref() == Some(participant)
    }

    pub fn is_unowned(&self) -> bool {
        self.owner.is_none()
    }
}

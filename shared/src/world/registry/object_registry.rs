use std::{
    collections::{HashMap, VecDeque},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use log::trace;

use crate::{
    world::{
        delegation::ownership_channel::{OwnerAccessor, OwnerChannel, OwnerMutator},
        registry::error::RegistryError,
    },
    KeyGenerator, NetworkObject, NewObject, ObjectId, ObjectState, SpawnSource, SyncFlags,
};

struct ObjectRecord {
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    sync_flags: SyncFlags,
    spawn_source: SpawnSource,
    state: ObjectState,
    owner: OwnerAccessor,
}

impl ObjectRecord {
    fn snapshot(&self, id: &ObjectId) -> Result<NetworkObject, RegistryError> {
        let owner = self
            .owner
            .owner()
            .map_err(|_| RegistryError::LockPoisoned)?;
        Ok(NetworkObject {
            id: *id,
            parent: self.parent,
            owner,
            sync_flags: self.sync_flags,
            spawn_source: self.spawn_source.clone(),
            state: self.state.clone(),
        })
    }
}

/// Authoritative table of live objects.
///
/// Lookups take a shared lock and read the owner through its accessor, so they
/// run concurrently with each other and never wait on ownership arbitration.
pub struct ObjectRegistry {
    key_generator: KeyGenerator,
    records: RwLock<HashMap<ObjectId, ObjectRecord>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self {
            key_generator: KeyGenerator::new(),
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new object, returning its id along with the single writer of its owner field
    pub fn register(&self, new_object: NewObject) -> Result<(ObjectId, OwnerMutator), RegistryError> {
        let mut records = self.write()?;

        if let Some(parent) = &new_object.parent {
            if !records.contains_key(parent) {
                return Err(RegistryError::NotFound { object: *parent });
            }
        }

        let id = self.key_generator.generate();
        let (mutator, accessor) = OwnerChannel::new_channel();

        if let Some(parent) = &new_object.parent {
            if let Some(parent_record) = records.get_mut(parent) {
                parent_record.children.push(id);
            }
        }

        records.insert(
            id,
            ObjectRecord {
                parent: new_object.parent,
                children: Vec::new(),
                sync_flags: new_object.sync_flags,
                spawn_source: new_object.spawn_source,
                state: ObjectState {
                    transform: new_object.transform,
                    ..ObjectState::default()
                },
                owner: accessor,
            },
        );

        trace!("ObjectRegistry: registered {}", id);
        Ok((id, mutator))
    }

    /// Removes an object, returning its final snapshot. Its children are detached to the root.
    pub fn unregister(&self, id: &ObjectId) -> Result<NetworkObject, RegistryError> {
        let mut records = self.write()?;

        let record = records
            .remove(id)
            .ok_or(RegistryError::NotFound { object: *id })?;

        if let Some(parent) = &record.parent {
            if let Some(parent_record) = records.get_mut(parent) {
                parent_record.children.retain(|child| child != id);
            }
        }
        for child in &record.children {
            if let Some(child_record) = records.get_mut(child) {
                child_record.parent = None;
            }
        }

        trace!("ObjectRegistry: unregistered {}", id);
        record.snapshot(id)
    }

    pub fn find(&self, id: &ObjectId) -> Result<NetworkObject, RegistryError> {
        let records = self.read()?;
        let record = records
            .get(id)
            .ok_or(RegistryError::NotFound { object: *id })?;
        record.snapshot(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.read()
            .map(|records| records.contains_key(id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All live ids, in registration order
    pub fn ids(&self) -> Result<Vec<ObjectId>, RegistryError> {
        let records = self.read()?;
        let mut ids: Vec<ObjectId> = records.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    pub fn owner_accessor(&self, id: &ObjectId) -> Result<OwnerAccessor, RegistryError> {
        let records = self.read()?;
        let record = records
            .get(id)
            .ok_or(RegistryError::NotFound { object: *id })?;
        Ok(record.owner.clone())
    }

    // Hierarchy

    pub fn children(&self, id: &ObjectId) -> Result<Vec<ObjectId>, RegistryError> {
        let records = self.read()?;
        let record = records
            .get(id)
            .ok_or(RegistryError::NotFound { object: *id })?;
        Ok(record.children.clone())
    }

    /// Every object below `id`, breadth-first. `id` itself is not included.
    pub fn descendants(&self, id: &ObjectId) -> Result<Vec<ObjectId>, RegistryError> {
        let records = self.read()?;
        let record = records
            .get(id)
            .ok_or(RegistryError::NotFound { object: *id })?;

        let mut output = Vec::new();
        let mut frontier: VecDeque<ObjectId> = record.children.iter().copied().collect();
        while let Some(next) = frontier.pop_front() {
            output.push(next);
            if let Some(next_record) = records.get(&next) {
                frontier.extend(next_record.children.iter().copied());
            }
        }
        Ok(output)
    }

    /// Moves `id` under `parent`, or to the root. Rejects any move that would
    /// make `id` its own ancestor.
    pub fn set_parent(&self, id: &ObjectId, parent: Option<ObjectId>) -> Result<(), RegistryError> {
        let mut records = self.write()?;

        if !records.contains_key(id) {
            return Err(RegistryError::NotFound { object: *id });
        }

        if let Some(new_parent) = parent {
            if !records.contains_key(&new_parent) {
                return Err(RegistryError::NotFound { object: new_parent });
            }
            // walk up from the new parent, we must never meet `id`
            let mut cursor = Some(new_parent);
            while let Some(ancestor) = cursor {
                if ancestor == *id {
                    return Err(RegistryError::ParentCycle {
                        object: *id,
                        parent: new_parent,
                    });
                }
                cursor = records.get(&ancestor).and_then(|record| record.parent);
            }
        }

        let old_parent = records.get(id).and_then(|record| record.parent);
        if old_parent == parent {
            return Ok(());
        }
        if let Some(old_parent) = old_parent {
            if let Some(old_record) = records.get_mut(&old_parent) {
                old_record.children.retain(|child| child != id);
            }
        }
        if let Some(new_parent) = parent {
            if let Some(new_record) = records.get_mut(&new_parent) {
                new_record.children.push(*id);
            }
        }
        if let Some(record) = records.get_mut(id) {
            record.parent = parent;
        }
        Ok(())
    }

    // State

    pub fn set_sync_flags(&self, id: &ObjectId, sync_flags: SyncFlags) -> Result<(), RegistryError> {
        let mut records = self.write()?;
        let record = records
            .get_mut(id)
            .ok_or(RegistryError::NotFound { object: *id })?;
        record.sync_flags = sync_flags;
        Ok(())
    }

    pub fn update_state<F: FnOnce(&mut ObjectState)>(
        &self,
        id: &ObjectId,
        update: F,
    ) -> Result<(), RegistryError> {
        let mut records = self.write()?;
        let record = records
            .get_mut(id)
            .ok_or(RegistryError::NotFound { object: *id })?;
        update(&mut record.state);
        Ok(())
    }

    // Private

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<ObjectId, ObjectRecord>>, RegistryError> {
        self.records.read().map_err(|_| RegistryError::LockPoisoned)
    }

    fn write(
        &self,
    ) -> Result<RwLockWriteGuard<'_, HashMap<ObjectId, ObjectRecord>>, RegistryError> {
        self.records.write().map_err(|_| RegistryError::LockPoisoned)
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

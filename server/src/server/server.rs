use std::{
    collections::{BTreeSet, HashMap, HashSet},
    mem,
};

use crossbeam_channel::{unbounded, Receiver};
use log::{debug, info, warn};

use tether_shared::{
    Actor, DisconnectSweep, NetworkObject, NewObject, ObjectId, ObjectRegistry, OwnerAccessor,
    OwnershipArbiter, OwnershipError, OwnershipEvent, OwnershipMessage, OwnershipStatus,
    OwnershipTicket, ParticipantKey, PropertyChangeLog, PropertyChangeSet, PropertyCommandSender,
    PropertyLogError, PropertyValue, RegistryError, ReplicationFrame, RigidbodyState, SpawnSource,
    SyncDispatcher, SyncFlags, Tick, Transform,
};

use crate::{
    events::Events,
    server::server_config::{DisconnectPolicy, ServerConfig},
    PropertyObserver, ServerError,
};

/// The authority over a set of networked objects.
///
/// Ownership requests are queued as they arrive and resolved on `tick`, in
/// arrival order. Status messages, replication frames and events produced
/// along the way are buffered until taken.
pub struct Server {
    config: ServerConfig,
    registry: ObjectRegistry,
    arbiter: OwnershipArbiter,
    ownership_events: Receiver<OwnershipEvent>,
    property_log: PropertyChangeLog,
    participants: BTreeSet<ParticipantKey>,
    // objects whose transform, rigidbody, flags or owner changed since the last tick
    dirty_objects: HashSet<ObjectId>,
    observers: Vec<Box<dyn PropertyObserver>>,
    outgoing_messages: Vec<(ParticipantKey, OwnershipMessage)>,
    outgoing_frames: Vec<ReplicationFrame>,
    incoming_events: Events,
    tick: Tick,
}

impl Server {
    /// Create a new Server
    pub fn new(config: ServerConfig) -> Self {
        let (event_sender, ownership_events) = unbounded();
        let arbiter = OwnershipArbiter::new(config.arbiter_config(), event_sender);

        Self {
            config,
            registry: ObjectRegistry::new(),
            arbiter,
            ownership_events,
            property_log: PropertyChangeLog::new(),
            participants: BTreeSet::new(),
            dirty_objects: HashSet::new(),
            observers: Vec::new(),
            outgoing_messages: Vec::new(),
            outgoing_frames: Vec::new(),
            incoming_events: Events::new(),
            tick: 0,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    // Participants

    /// Adds a participant. It is sent the current ownership status of every
    /// live object. Connecting twice is a no-op.
    pub fn connect_participant(&mut self, participant: &ParticipantKey) -> Result<(), ServerError> {
        if !self.arbiter.connect_participant(participant)? {
            debug!("Server: {:?} is already connected", participant);
            return Ok(());
        }
        self.participants.insert(*participant);

        for object in self.registry.ids()? {
            let owner = self.arbiter.owner(&object)?;
            self.outgoing_messages.push((
                *participant,
                OwnershipMessage::SetStatus(
                    object,
                    OwnershipStatus::for_participant(owner, participant),
                ),
            ));
        }

        info!("Server: participant {:?} connected", participant);
        self.incoming_events.push_connection(participant);
        Ok(())
    }

    /// Removes a participant. Every object it owned is released, or despawned
    /// under `DisconnectPolicy::Despawn`, and its queued requests fail.
    pub fn disconnect_participant(
        &mut self,
        participant: &ParticipantKey,
    ) -> Result<DisconnectSweep, ServerError> {
        if !self.participants.contains(participant) {
            return Err(ServerError::UnknownParticipant {
                participant: *participant,
            });
        }

        let sweep = self.arbiter.disconnect_participant(participant)?;
        self.participants.remove(participant);
        self.outgoing_messages
            .retain(|(recipient, _)| recipient != participant);

        if self.config.disconnect_policy == DisconnectPolicy::Despawn {
            for object in &sweep.released {
                // may already be gone with an ancestor despawned earlier in this loop
                if self.registry.contains(object) {
                    self.despawn_object(object)?;
                }
            }
        }

        info!(
            "Server: participant {:?} disconnected, {} owned object(s) swept",
            participant,
            sweep.released.len()
        );
        self.incoming_events.push_disconnection(participant);
        Ok(sweep)
    }

    pub fn is_connected(&self, participant: &ParticipantKey) -> bool {
        self.participants.contains(participant)
    }

    pub fn participants(&self) -> Vec<ParticipantKey> {
        self.participants.iter().copied().collect()
    }

    // Objects

    /// A `NewObject` carrying the configured default sync flags
    pub fn new_object(&self, spawn_source: SpawnSource) -> NewObject {
        NewObject::new(spawn_source).with_sync_flags(self.config.default_sync_flags)
    }

    /// Spawns an object owned by the Server
    pub fn spawn_object(&mut self, new_object: NewObject) -> Result<ObjectId, ServerError> {
        let (object, mutator) = self.registry.register(new_object)?;
        self.arbiter.track(&object, mutator)?;
        self.property_log.track(&object)?;
        self.dirty_objects.insert(object);

        for participant in &self.participants {
            self.outgoing_messages.push((
                *participant,
                OwnershipMessage::SetStatus(object, OwnershipStatus::Available),
            ));
        }

        info!("Server: spawned {}", object);
        self.incoming_events.push_spawn(&object);
        Ok(object)
    }

    /// Despawns an object along with everything parented under it, deepest
    /// first. Returns the despawned ids in the order they were removed.
    ///
    /// Nothing is torn down unless every object in the subtree is known to the
    /// registry, the arbiter and the property log. A failure during teardown
    /// does not stop the remaining components or objects from being removed;
    /// the first one is returned and any others are pushed as `ErrorEvent`s.
    pub fn despawn_object(&mut self, object: &ObjectId) -> Result<Vec<ObjectId>, ServerError> {
        let mut doomed = self.registry.descendants(object)?;
        doomed.reverse();
        doomed.push(*object);

        for id in &doomed {
            if !self.registry.contains(id) {
                return Err(RegistryError::NotFound { object: *id }.into());
            }
            if !self.arbiter.is_tracked(id) {
                return Err(OwnershipError::NotFound { object: *id }.into());
            }
            if !self.property_log.is_tracked(id) {
                return Err(PropertyLogError::NotFound { object: *id }.into());
            }
        }

        let mut first_error = None;
        for id in &doomed {
            let teardown = [
                self.arbiter.untrack(id).map(|_| ()).map_err(ServerError::from),
                self.property_log.untrack(id).map_err(ServerError::from),
                self.registry.unregister(id).map(|_| ()).map_err(ServerError::from),
            ];
            for result in teardown {
                if let Err(error) = result {
                    warn!("Server: error while despawning {}: {}", id, error);
                    if first_error.is_none() {
                        first_error = Some(error);
                    } else {
                        self.incoming_events.push_error(error);
                    }
                }
            }
            self.dirty_objects.remove(id);

            for participant in &self.participants {
                self.outgoing_messages
                    .push((*participant, OwnershipMessage::Despawned(*id)));
            }

            info!("Server: despawned {}", id);
            self.incoming_events.push_despawn(id);
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(doomed),
        }
    }

    pub fn object(&self, object: &ObjectId) -> Result<NetworkObject, ServerError> {
        Ok(self.registry.find(object)?)
    }

    pub fn has_object(&self, object: &ObjectId) -> bool {
        self.registry.contains(object)
    }

    /// Snapshots of every live object, in spawn order
    pub fn objects(&self) -> Result<Vec<NetworkObject>, ServerError> {
        let mut output = Vec::new();
        for object in self.registry.ids()? {
            output.push(self.registry.find(&object)?);
        }
        Ok(output)
    }

    pub fn children(&self, object: &ObjectId) -> Result<Vec<ObjectId>, ServerError> {
        Ok(self.registry.children(object)?)
    }

    pub fn set_parent(
        &mut self,
        object: &ObjectId,
        parent: Option<ObjectId>,
    ) -> Result<(), ServerError> {
        Ok(self.registry.set_parent(object, parent)?)
    }

    pub fn set_sync_flags(
        &mut self,
        object: &ObjectId,
        sync_flags: SyncFlags,
    ) -> Result<(), ServerError> {
        self.registry.set_sync_flags(object, sync_flags)?;
        self.dirty_objects.insert(*object);
        Ok(())
    }

    // Ownership

    pub fn owner(&self, object: &ObjectId) -> Result<Option<ParticipantKey>, ServerError> {
        Ok(self.arbiter.owner(object)?)
    }

    /// A read handle on the owner of an object, usable from any thread
    pub fn owner_accessor(&self, object: &ObjectId) -> Result<OwnerAccessor, ServerError> {
        Ok(self.registry.owner_accessor(object)?)
    }

    pub fn owned_objects(&self, participant: &ParticipantKey) -> Result<Vec<ObjectId>, ServerError> {
        Ok(self.arbiter.owned_objects(participant)?)
    }

    /// Queues an ownership request. The ticket completes on the next `tick`.
    pub fn request_ownership(
        &self,
        object: &ObjectId,
        requester: &ParticipantKey,
    ) -> Result<OwnershipTicket, ServerError> {
        Ok(self.arbiter.request_ownership(object, requester)?)
    }

    pub fn release_ownership(
        &self,
        object: &ObjectId,
        releaser: &ParticipantKey,
    ) -> Result<(), ServerError> {
        Ok(self.arbiter.release_ownership(object, releaser)?)
    }

    pub fn transfer_ownership(
        &self,
        object: &ObjectId,
        from: &ParticipantKey,
        to: &ParticipantKey,
    ) -> Result<(), ServerError> {
        Ok(self.arbiter.transfer_ownership(object, from, to)?)
    }

    /// Takes ownership back from whoever holds it. Returns whether the owner changed.
    pub fn reclaim_ownership(&self, object: &ObjectId) -> Result<bool, ServerError> {
        Ok(self.arbiter.reclaim_ownership(object)?)
    }

    // Writes

    pub fn set_property<K: Into<String>, V: Into<PropertyValue>>(
        &mut self,
        actor: &Actor,
        object: &ObjectId,
        key: K,
        value: V,
    ) -> Result<(), ServerError> {
        self.check_writer(actor, object)?;
        self.property_log.set_property(object, key, value)?;
        Ok(())
    }

    pub fn remove_property<K: Into<String>>(
        &mut self,
        actor: &Actor,
        object: &ObjectId,
        key: K,
    ) -> Result<(), ServerError> {
        self.check_writer(actor, object)?;
        self.property_log.remove_property(object, key)?;
        Ok(())
    }

    pub fn set_transform(
        &mut self,
        actor: &Actor,
        object: &ObjectId,
        transform: Transform,
    ) -> Result<(), ServerError> {
        self.check_writer(actor, object)?;
        self.registry
            .update_state(object, |state| state.transform = transform)?;
        self.dirty_objects.insert(*object);
        Ok(())
    }

    pub fn set_rigidbody(
        &mut self,
        actor: &Actor,
        object: &ObjectId,
        rigidbody: RigidbodyState,
    ) -> Result<(), ServerError> {
        self.check_writer(actor, object)?;
        self.registry
            .update_state(object, |state| state.rigidbody = rigidbody)?;
        self.dirty_objects.insert(*object);
        Ok(())
    }

    pub fn property(&self, object: &ObjectId, key: &str) -> Option<&PropertyValue> {
        self.property_log.property(object, key)
    }

    pub fn properties(&self, object: &ObjectId) -> Option<&HashMap<String, PropertyValue>> {
        self.property_log.properties(object)
    }

    /// Handle for property writes from other threads, applied on the next
    /// `tick`. Each command is checked against the object's owner when it is
    /// applied; refused commands surface as `ErrorEvent`s.
    pub fn property_command_sender(&self) -> PropertyCommandSender {
        self.property_log.command_sender()
    }

    pub fn add_property_observer<O: PropertyObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    // Transport

    /// Applies a message received from a participant. A rejected message is
    /// answered with the participant's authoritative status, so its view of the
    /// object converges even though the request failed.
    pub fn receive_message(
        &mut self,
        participant: &ParticipantKey,
        message: OwnershipMessage,
    ) -> Result<(), ServerError> {
        if !self.participants.contains(participant) {
            warn!(
                "Server: dropping {} message from unknown participant {:?}",
                message.name(),
                participant
            );
            return Err(ServerError::UnknownParticipant {
                participant: *participant,
            });
        }

        let result = match &message {
            OwnershipMessage::Request(object) => {
                match self.arbiter.request_ownership(object, participant) {
                    Ok(ticket) => {
                        // already the owner, no event will follow
                        if ticket.is_granted() {
                            self.outgoing_messages.push((
                                *participant,
                                OwnershipMessage::SetStatus(*object, OwnershipStatus::Granted),
                            ));
                        }
                        Ok(())
                    }
                    Err(error) => Err(error),
                }
            }
            OwnershipMessage::Release(object) => self.arbiter.release_ownership(object, participant),
            OwnershipMessage::Transfer(object, to) => {
                self.arbiter.transfer_ownership(object, participant, to)
            }
            OwnershipMessage::SetStatus(_, _) | OwnershipMessage::Despawned(_) => {
                warn!(
                    "Server: participant {:?} sent authority-only message {}",
                    participant,
                    message.name()
                );
                return Err(ServerError::UnexpectedMessage {
                    participant: *participant,
                    message: message.name(),
                });
            }
        };

        if let Err(error) = result {
            warn!(
                "Server: rejected {} from {:?}: {}",
                message.name(),
                participant,
                error
            );
            self.resync_status(participant, &message.object());
            return Err(error.into());
        }
        Ok(())
    }

    /// Status messages addressed to participants since the last call
    pub fn take_outgoing_messages(&mut self) -> Vec<(ParticipantKey, OwnershipMessage)> {
        mem::take(&mut self.outgoing_messages)
    }

    /// Replication frames built since the last call
    pub fn take_frames(&mut self) -> Vec<ReplicationFrame> {
        mem::take(&mut self.outgoing_frames)
    }

    /// Full state of every live object, for bringing a late joiner up to date
    pub fn snapshot_frames(&self) -> Result<Vec<ReplicationFrame>, ServerError> {
        let mut frames = Vec::new();
        for object in self.registry.ids()? {
            let snapshot = self.registry.find(&object)?;
            let properties: PropertyChangeSet = self
                .property_log
                .properties(&object)
                .map(|values| {
                    values
                        .iter()
                        .map(|(key, value)| (key.clone(), value.clone()))
                        .collect()
                })
                .unwrap_or_default();
            frames.extend(SyncDispatcher::dispatch(
                &snapshot,
                self.tick,
                Some(&properties),
            ));
        }
        Ok(frames)
    }

    pub fn take_events(&mut self) -> Events {
        mem::replace(&mut self.incoming_events, Events::new())
    }

    // Tick

    /// Resolves queued ownership requests, fans out the resulting status
    /// changes, flushes property changes and builds this tick's replication
    /// frames. Returns the tick that was just processed.
    pub fn tick(&mut self) -> Result<Tick, ServerError> {
        let resolved = self.arbiter.resolve_requests()?;
        if resolved > 0 {
            debug!(
                "Server: resolved {} ownership request(s) on tick {}",
                resolved, self.tick
            );
        }

        self.process_ownership_events();
        self.apply_property_commands();
        self.flush_and_dispatch();

        let tick = self.tick;
        self.incoming_events.push_tick(tick);
        self.tick = self.tick.wrapping_add(1);
        Ok(tick)
    }

    // Private

    fn check_writer(&self, actor: &Actor, object: &ObjectId) -> Result<(), ServerError> {
        check_writer(&self.arbiter, actor, object)
    }

    fn apply_property_commands(&mut self) {
        let arbiter = &self.arbiter;
        let failed = self
            .property_log
            .apply_pending_commands(|command| check_writer(arbiter, &command.actor(), &command.object()));

        for (command, error) in failed {
            warn!(
                "Server: dropped property command on {} from {:?}: {}",
                command.object(),
                command.actor(),
                error
            );
            self.incoming_events.push_error(error);
        }
    }

    fn process_ownership_events(&mut self) {
        let events: Vec<OwnershipEvent> = self.ownership_events.try_iter().collect();
        for event in events {
            let object = event.object();
            // nothing to announce about an object that has been despawned since
            if self.registry.contains(&object) {
                match event.new_owner() {
                    Some(owner) => {
                        self.dirty_objects.insert(object);
                        self.fan_out_status(&object, owner);
                    }
                    None => {
                        if let OwnershipEvent::Denied { requester, .. } = &event {
                            if self.participants.contains(requester) {
                                self.resync_status(requester, &object);
                            }
                        }
                    }
                }
            }
            self.incoming_events.push_ownership(event);
        }
    }

    fn fan_out_status(&mut self, object: &ObjectId, owner: Option<ParticipantKey>) {
        for participant in &self.participants {
            self.outgoing_messages.push((
                *participant,
                OwnershipMessage::SetStatus(
                    *object,
                    OwnershipStatus::for_participant(owner, participant),
                ),
            ));
        }
    }

    fn resync_status(&mut self, participant: &ParticipantKey, object: &ObjectId) {
        let message = match self.arbiter.owner(object) {
            Ok(owner) => OwnershipMessage::SetStatus(
                *object,
                OwnershipStatus::for_participant(owner, participant),
            ),
            Err(OwnershipError::NotFound { .. }) => OwnershipMessage::Despawned(*object),
            Err(error) => {
                self.incoming_events.push_error(error.into());
                return;
            }
        };
        self.outgoing_messages.push((*participant, message));
    }

    fn flush_and_dispatch(&mut self) {
        let tick = self.tick;
        let Self {
            registry,
            property_log,
            dirty_objects,
            observers,
            outgoing_frames,
            incoming_events,
            ..
        } = self;

        let mut frames = Vec::new();
        property_log.flush_each(|object, changes| {
            let dirty = dirty_objects.remove(object);
            if changes.is_empty() && !dirty {
                return;
            }

            if !changes.is_empty() {
                for observer in observers.iter_mut() {
                    observer.on_properties_changed(object, tick, changes);
                }
            }

            match registry.find(object) {
                Ok(snapshot) => frames.extend(SyncDispatcher::dispatch(&snapshot, tick, Some(changes))),
                Err(error) => incoming_events.push_error(error.into()),
            }
        });

        frames.sort_by_key(|frame| frame.object);
        outgoing_frames.extend(frames);
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new(ServerConfig::default())
    }
}

// A participant may write only what it owns, the Server only what nobody owns
fn check_writer(
    arbiter: &OwnershipArbiter,
    actor: &Actor,
    object: &ObjectId,
) -> Result<(), ServerError> {
    let owner = arbiter.owner(object)?;
    if actor.is_owner_of(owner) {
        return Ok(());
    }
    Err(OwnershipError::NotOwner {
        object: *object,
        actor: *actor,
        owner,
    }
    .into())
}

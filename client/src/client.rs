use std::{
    collections::{HashMap, HashSet},
    mem,
};

use log::{debug, warn};

use tether_shared::{ObjectId, OwnershipMessage, OwnershipStatus, ParticipantKey, ReplicationFrame};

use crate::{client_events::ClientEvents, world::replica::Replica, ClientError};

/// A participant's view of the networked objects.
///
/// Ownership actions only move the local status into a transient state and
/// queue a message for the authority. The status settles when the
/// authority's answer arrives through `receive_message`.
pub struct Client {
    participant: ParticipantKey,
    replicas: HashMap<ObjectId, Replica>,
    // ids are never reused, so anything in here stays dead
    despawned: HashSet<ObjectId>,
    outgoing_messages: Vec<OwnershipMessage>,
    incoming_events: ClientEvents,
}

impl Client {
    pub fn new(participant: ParticipantKey) -> Self {
        Self {
            participant,
            replicas: HashMap::new(),
            despawned: HashSet::new(),
            outgoing_messages: Vec::new(),
            incoming_events: ClientEvents::new(),
        }
    }

    pub fn participant_key(&self) -> ParticipantKey {
        self.participant
    }

    // Objects

    pub fn has_object(&self, object: &ObjectId) -> bool {
        self.replicas.contains_key(object)
    }

    /// Every object this Client knows of, in spawn order
    pub fn objects(&self) -> Vec<ObjectId> {
        let mut objects: Vec<ObjectId> = self.replicas.keys().copied().collect();
        objects.sort();
        objects
    }

    pub fn replica(&self, object: &ObjectId) -> Option<&Replica> {
        self.replicas.get(object)
    }

    pub fn status(&self, object: &ObjectId) -> Option<OwnershipStatus> {
        self.replicas.get(object).map(|replica| replica.status())
    }

    /// True only once the authority has granted ownership to this Client
    pub fn is_mine(&self, object: &ObjectId) -> bool {
        self.status(object)
            .map(|status| status.is_mine())
            .unwrap_or(false)
    }

    // Ownership

    /// Asks the authority for ownership. Asking again while the request is in
    /// flight does nothing.
    pub fn request_ownership(&mut self, object: &ObjectId) -> Result<(), ClientError> {
        let replica = self
            .replicas
            .get_mut(object)
            .ok_or(ClientError::UnknownObject { object: *object })?;

        match replica.status() {
            OwnershipStatus::Requested => Ok(()),
            status if status.can_request() => {
                replica.set_status(OwnershipStatus::Requested);
                self.outgoing_messages
                    .push(OwnershipMessage::Request(*object));
                Ok(())
            }
            status => Err(ClientError::InvalidTransition {
                object: *object,
                action: "request ownership of",
                status,
            }),
        }
    }

    pub fn release_ownership(&mut self, object: &ObjectId) -> Result<(), ClientError> {
        let replica = self
            .replicas
            .get_mut(object)
            .ok_or(ClientError::UnknownObject { object: *object })?;

        let status = replica.status();
        if !status.can_release() {
            return Err(ClientError::InvalidTransition {
                object: *object,
                action: "release ownership of",
                status,
            });
        }

        replica.set_status(OwnershipStatus::Releasing);
        self.outgoing_messages
            .push(OwnershipMessage::Release(*object));
        Ok(())
    }

    /// Hands ownership to another participant. Transferring to this Client
    /// itself does nothing.
    pub fn transfer_ownership(
        &mut self,
        object: &ObjectId,
        to: &ParticipantKey,
    ) -> Result<(), ClientError> {
        let replica = self
            .replicas
            .get_mut(object)
            .ok_or(ClientError::UnknownObject { object: *object })?;

        let status = replica.status();
        if !status.can_transfer() {
            return Err(ClientError::InvalidTransition {
                object: *object,
                action: "transfer ownership of",
                status,
            });
        }
        if *to == self.participant {
            return Ok(());
        }

        replica.set_status(OwnershipStatus::Releasing);
        self.outgoing_messages
            .push(OwnershipMessage::Transfer(*object, *to));
        Ok(())
    }

    // Transport

    /// Messages for the authority queued since the last call
    pub fn take_outgoing_messages(&mut self) -> Vec<OwnershipMessage> {
        mem::take(&mut self.outgoing_messages)
    }

    /// Applies a message from the authority
    pub fn receive_message(&mut self, message: OwnershipMessage) -> Result<(), ClientError> {
        match message {
            OwnershipMessage::SetStatus(object, status) => self.apply_status(&object, status),
            OwnershipMessage::Despawned(object) => {
                self.despawned.insert(object);
                if self.replicas.remove(&object).is_some() {
                    debug!("Client {:?}: {} despawned", self.participant, object);
                    self.incoming_events.push_despawn(&object);
                }
                Ok(())
            }
            OwnershipMessage::Request(_)
            | OwnershipMessage::Release(_)
            | OwnershipMessage::Transfer(_, _) => {
                warn!(
                    "Client {:?}: received participant-only message {}",
                    self.participant,
                    message.name()
                );
                Err(ClientError::UnexpectedMessage {
                    message: message.name(),
                })
            }
        }
    }

    /// Applies a replication frame to the replica of its object. Returns false
    /// if the frame was stale or its object has been despawned.
    pub fn receive_frame(&mut self, frame: &ReplicationFrame) -> bool {
        if self.despawned.contains(&frame.object) {
            return false;
        }

        let participant = self.participant;
        let replica = self.replicas.entry(frame.object).or_insert_with(|| {
            Replica::new(OwnershipStatus::for_participant(frame.owner, &participant))
        });

        if !replica.apply_frame(frame) {
            debug!(
                "Client {:?}: skipped stale frame for {} from tick {}",
                participant, frame.object, frame.tick
            );
            return false;
        }
        self.incoming_events.push_update(&frame.object);
        true
    }

    pub fn take_events(&mut self) -> ClientEvents {
        mem::replace(&mut self.incoming_events, ClientEvents::new())
    }

    // Private

    fn apply_status(&mut self, object: &ObjectId, status: OwnershipStatus) -> Result<(), ClientError> {
        if matches!(
            status,
            OwnershipStatus::Requested | OwnershipStatus::Releasing
        ) {
            return Err(ClientError::UnexpectedStatus {
                object: *object,
                status,
            });
        }
        if self.despawned.contains(object) {
            return Ok(());
        }

        let replica = self
            .replicas
            .entry(*object)
            .or_insert_with(|| Replica::new(OwnershipStatus::Available));
        let previous = replica.set_status(status);
        match status {
            OwnershipStatus::Granted => replica.set_owner(Some(self.participant)),
            OwnershipStatus::Available => replica.set_owner(None),
            _ => {}
        }

        match (previous, status) {
            (OwnershipStatus::Granted, OwnershipStatus::Granted) => {}
            (_, OwnershipStatus::Granted) => self.incoming_events.push_grant(object),
            (OwnershipStatus::Requested, _) => self.incoming_events.push_denial(object),
            (OwnershipStatus::Granted | OwnershipStatus::Releasing, _) => {
                self.incoming_events.push_reset(object)
            }
            _ => {}
        }
        Ok(())
    }
}

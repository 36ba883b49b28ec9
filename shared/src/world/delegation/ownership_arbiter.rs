use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, RwLock,
    },
};

use crossbeam_channel::Sender;
use log::{debug, trace};

use crate::{
    world::delegation::{
        error::OwnershipError,
        ownership_channel::OwnerMutator,
        ownership_event::{OwnershipEvent, ReleaseReason},
        ownership_ticket::OwnershipTicket,
        request_queue::{OwnershipRequest, RequestQueue},
    },
    Actor, ObjectId, ParticipantKey,
};

#[derive(Clone, Debug)]
pub struct ArbiterConfig {
    /// Requests from distinct participants that may wait on one object at once.
    /// Requests beyond this fail immediately with `RequestConflict`.
    pub max_queued_requests: usize,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            max_queued_requests: 8,
        }
    }
}

/// Result of sweeping a participant that left
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisconnectSweep {
    /// Objects the participant owned, now owned by the Server
    pub released: Vec<ObjectId>,
    /// Queued requests of the participant that were failed with `Disconnected`
    pub cancelled_requests: usize,
}

struct ArbitrationSlot {
    mutator: OwnerMutator,
    queue: RequestQueue,
}

/// Serializes every ownership mutation of an object through that object's own
/// slot, so unrelated objects never contend with each other.
///
/// Lock order is slot, then roster. The slot map lock is only held long enough
/// to clone a slot handle.
pub struct OwnershipArbiter {
    config: ArbiterConfig,
    slots: RwLock<HashMap<ObjectId, Arc<Mutex<ArbitrationSlot>>>>,
    // connected participants, and the objects each of them owns
    roster: RwLock<HashMap<ParticipantKey, HashSet<ObjectId>>>,
    next_arrival: AtomicU64,
    event_sender: Sender<OwnershipEvent>,
}

impl OwnershipArbiter {
    pub fn new(config: ArbiterConfig, event_sender: Sender<OwnershipEvent>) -> Self {
        Self {
            config,
            slots: RwLock::new(HashMap::new()),
            roster: RwLock::new(HashMap::new()),
            next_arrival: AtomicU64::new(0),
            event_sender,
        }
    }

    // Objects

    /// Start arbitrating ownership of an object
    pub fn track(&self, object: &ObjectId, mutator: OwnerMutator) -> Result<(), OwnershipError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| OwnershipError::LockPoisoned)?;
        slots.insert(
            *object,
            Arc::new(Mutex::new(ArbitrationSlot {
                mutator,
                queue: RequestQueue::new(),
            })),
        );
        trace!("OwnershipArbiter: tracking {}", object);
        Ok(())
    }

    /// Stop arbitrating an object that is being destroyed. Every queued request
    /// fails with `NotFound`. Returns the owner the object had.
    pub fn untrack(&self, object: &ObjectId) -> Result<Option<ParticipantKey>, OwnershipError> {
        let slot = {
            let mut slots = self
                .slots
                .write()
                .map_err(|_| OwnershipError::LockPoisoned)?;
            slots
                .remove(object)
                .ok_or(OwnershipError::NotFound { object: *object })?
        };
        let mut slot = lock_slot(&slot)?;

        for (request, ticket) in slot.queue.drain() {
            self.fail(&ticket, &request, OwnershipError::NotFound { object: *object });
        }

        let previous = slot.mutator.set_owner(None)?;
        if let Some(previous) = previous {
            let mut roster = self
                .roster
                .write()
                .map_err(|_| OwnershipError::LockPoisoned)?;
            if let Some(owned) = roster.get_mut(&previous) {
                owned.remove(object);
            }
        }
        trace!("OwnershipArbiter: untracked {}", object);
        Ok(previous)
    }

    pub fn is_tracked(&self, object: &ObjectId) -> bool {
        self.slots
            .read()
            .map(|slots| slots.contains_key(object))
            .unwrap_or(false)
    }

    // Participants

    /// Returns false if the participant was already connected
    pub fn connect_participant(&self, participant: &ParticipantKey) -> Result<bool, OwnershipError> {
        let mut roster = self
            .roster
            .write()
            .map_err(|_| OwnershipError::LockPoisoned)?;
        if roster.contains_key(participant) {
            return Ok(false);
        }
        roster.insert(*participant, HashSet::new());
        Ok(true)
    }

    /// Removes the participant, releases every object it owned (each one
    /// independently) and fails its queued requests with `Disconnected`
    pub fn disconnect_participant(
        &self,
        participant: &ParticipantKey,
    ) -> Result<DisconnectSweep, OwnershipError> {
        let owned = {
            let mut roster = self
                .roster
                .write()
                .map_err(|_| OwnershipError::LockPoisoned)?;
            roster
                .remove(participant)
                .ok_or(OwnershipError::Disconnected {
                    participant: *participant,
                })?
        };

        let mut sweep = DisconnectSweep::default();

        let mut owned: Vec<ObjectId> = owned.into_iter().collect();
        owned.sort();
        for object in owned {
            let Ok(slot) = self.slot(&object) else {
                continue;
            };
            let slot = lock_slot(&slot)?;
            if slot.mutator.owner()? != Some(*participant) {
                continue;
            }
            slot.mutator.set_owner(None)?;
            self.emit(OwnershipEvent::Released {
                object,
                previous_owner: *participant,
                reason: ReleaseReason::OwnerDisconnected,
            });
            sweep.released.push(object);
        }

        for (_, slot) in self.slot_snapshot()? {
            let mut slot = lock_slot(&slot)?;
            for (request, ticket) in slot.queue.remove_requester(participant) {
                self.fail(
                    &ticket,
                    &request,
                    OwnershipError::Disconnected {
                        participant: *participant,
                    },
                );
                sweep.cancelled_requests += 1;
            }
        }

        debug!(
            "OwnershipArbiter: {:?} disconnected, released {} object(s), cancelled {} request(s)",
            participant,
            sweep.released.len(),
            sweep.cancelled_requests
        );
        Ok(sweep)
    }

    pub fn is_connected(&self, participant: &ParticipantKey) -> Result<bool, OwnershipError> {
        let roster = self
            .roster
            .read()
            .map_err(|_| OwnershipError::LockPoisoned)?;
        Ok(roster.contains_key(participant))
    }

    pub fn owned_objects(&self, participant: &ParticipantKey) -> Result<Vec<ObjectId>, OwnershipError> {
        let roster = self
            .roster
            .read()
            .map_err(|_| OwnershipError::LockPoisoned)?;
        let mut objects: Vec<ObjectId> = roster
            .get(participant)
            .map(|owned| owned.iter().copied().collect())
            .unwrap_or_default();
        objects.sort();
        Ok(objects)
    }

    // Ownership

    pub fn owner(&self, object: &ObjectId) -> Result<Option<ParticipantKey>, OwnershipError> {
        let slot = self.slot(object)?;
        let slot = lock_slot(&slot)?;
        slot.mutator.owner()
    }

    pub fn pending_requests(&self, object: &ObjectId) -> Result<usize, OwnershipError> {
        let slot = self.slot(object)?;
        let slot = lock_slot(&slot)?;
        Ok(slot.queue.len())
    }

    /// Queues a request for ownership. The returned ticket completes when the
    /// queue is next resolved.
    ///
    /// Asking again while a request is in flight returns the same ticket. If
    /// the requester already owns the object, the ticket is already granted.
    pub fn request_ownership(
        &self,
        object: &ObjectId,
        requester: &ParticipantKey,
    ) -> Result<OwnershipTicket, OwnershipError> {
        let slot = self.slot(object)?;
        if !self.is_connected(requester)? {
            return Err(OwnershipError::Disconnected {
                participant: *requester,
            });
        }

        let mut slot = lock_slot(&slot)?;

        if slot.mutator.owner()? == Some(*requester) {
            return Ok(OwnershipTicket::granted(object, requester));
        }

        if let Some(ticket) = slot.queue.ticket_for(requester) {
            return Ok(ticket.clone());
        }

        if slot.queue.len() >= self.config.max_queued_requests {
            return Err(OwnershipError::RequestConflict {
                object: *object,
                requester: *requester,
            });
        }

        let arrival = self.next_arrival.fetch_add(1, Ordering::Relaxed);
        let ticket = OwnershipTicket::pending(object, requester);
        slot.queue
            .push(OwnershipRequest::new(*object, *requester, arrival), ticket.clone());
        trace!(
            "OwnershipArbiter: {:?} queued request #{} for {}",
            requester,
            arrival,
            object
        );
        Ok(ticket)
    }

    /// Resolves every queued request, object by object, in arrival order.
    /// Returns how many requests were resolved.
    pub fn resolve_requests(&self) -> Result<usize, OwnershipError> {
        let mut resolved = 0;
        for (object, slot) in self.slot_snapshot()? {
            let mut slot = lock_slot(&slot)?;
            resolved += self.resolve_slot(&object, &mut slot)?;
        }
        Ok(resolved)
    }

    fn resolve_slot(
        &self,
        object: &ObjectId,
        slot: &mut ArbitrationSlot,
    ) -> Result<usize, OwnershipError> {
        let mut resolved = 0;
        let mut granted_this_pass = false;

        while let Some((request, ticket)) = slot.queue.pop_front() {
            resolved += 1;
            let requester = request.requester;

            let outcome = match slot.mutator.owner()? {
                Some(owner) if owner == requester => Ok(false),
                // lost to the request granted earlier in this pass
                Some(_) if granted_this_pass => Err(OwnershipError::RequestConflict {
                    object: *object,
                    requester,
                }),
                Some(owner) => Err(OwnershipError::AlreadyOwned {
                    object: *object,
                    owner,
                }),
                None => self.grant(object, slot, &requester).map(|_| true),
            };

            match outcome {
                Ok(changed) => {
                    ticket.complete(Ok(()));
                    if changed {
                        granted_this_pass = true;
                        self.emit(OwnershipEvent::Granted {
                            object: *object,
                            owner: requester,
                        });
                    }
                }
                Err(OwnershipError::LockPoisoned) => return Err(OwnershipError::LockPoisoned),
                Err(error) => self.fail(&ticket, &request, error),
            }
        }

        Ok(resolved)
    }

    fn grant(
        &self,
        object: &ObjectId,
        slot: &ArbitrationSlot,
        requester: &ParticipantKey,
    ) -> Result<(), OwnershipError> {
        let mut roster = self
            .roster
            .write()
            .map_err(|_| OwnershipError::LockPoisoned)?;
        let Some(owned) = roster.get_mut(requester) else {
            return Err(OwnershipError::Disconnected {
                participant: *requester,
            });
        };
        owned.insert(*object);
        slot.mutator.set_owner(Some(*requester))?;
        Ok(())
    }

    /// Gives up ownership. Only the current owner may release.
    pub fn release_ownership(
        &self,
        object: &ObjectId,
        releaser: &ParticipantKey,
    ) -> Result<(), OwnershipError> {
        let slot = self.slot(object)?;
        let slot = lock_slot(&slot)?;

        let owner = slot.mutator.owner()?;
        if owner != Some(*releaser) {
            return Err(OwnershipError::NotOwner {
                object: *object,
                actor: Actor::Participant(*releaser),
                owner,
            });
        }

        {
            let mut roster = self
                .roster
                .write()
                .map_err(|_| OwnershipError::LockPoisoned)?;
            if let Some(owned) = roster.get_mut(releaser) {
                owned.remove(object);
            }
        }
        slot.mutator.set_owner(None)?;

        self.emit(OwnershipEvent::Released {
            object: *object,
            previous_owner: *releaser,
            reason: ReleaseReason::Released,
        });
        Ok(())
    }

    /// Hands ownership straight from `from` to `to`. The owner is rewritten in
    /// one step, so nobody can observe the object unowned in between.
    pub fn transfer_ownership(
        &self,
        object: &ObjectId,
        from: &ParticipantKey,
        to: &ParticipantKey,
    ) -> Result<(), OwnershipError> {
        let slot = self.slot(object)?;
        let slot = lock_slot(&slot)?;

        let owner = slot.mutator.owner()?;
        if owner != Some(*from) {
            return Err(OwnershipError::NotOwner {
                object: *object,
                actor: Actor::Participant(*from),
                owner,
            });
        }
        if from == to {
            return Ok(());
        }

        {
            let mut roster = self
                .roster
                .write()
                .map_err(|_| OwnershipError::LockPoisoned)?;
            if !roster.contains_key(from) {
                return Err(OwnershipError::Disconnected { participant: *from });
            }
            let Some(target) = roster.get_mut(to) else {
                return Err(OwnershipError::Disconnected { participant: *to });
            };
            target.insert(*object);
            if let Some(source) = roster.get_mut(from) {
                source.remove(object);
            }
        }
        slot.mutator.set_owner(Some(*to))?;

        self.emit(OwnershipEvent::Transferred {
            object: *object,
            from: *from,
            to: *to,
        });
        Ok(())
    }

    /// The Server takes ownership back, whoever holds it. Returns whether the owner changed.
    pub fn reclaim_ownership(&self, object: &ObjectId) -> Result<bool, OwnershipError> {
        let slot = self.slot(object)?;
        let slot = lock_slot(&slot)?;

        let Some(previous_owner) = slot.mutator.owner()? else {
            return Ok(false);
        };

        {
            let mut roster = self
                .roster
                .write()
                .map_err(|_| OwnershipError::LockPoisoned)?;
            if let Some(owned) = roster.get_mut(&previous_owner) {
                owned.remove(object);
            }
        }
        slot.mutator.set_owner(None)?;

        self.emit(OwnershipEvent::Reclaimed {
            object: *object,
            previous_owner,
        });
        Ok(true)
    }

    // Private

    fn slot(&self, object: &ObjectId) -> Result<Arc<Mutex<ArbitrationSlot>>, OwnershipError> {
        let slots = self
            .slots
            .read()
            .map_err(|_| OwnershipError::LockPoisoned)?;
        slots
            .get(object)
            .cloned()
            .ok_or(OwnershipError::NotFound { object: *object })
    }

    fn slot_snapshot(
        &self,
    ) -> Result<Vec<(ObjectId, Arc<Mutex<ArbitrationSlot>>)>, OwnershipError> {
        let slots = self
            .slots
            .read()
            .map_err(|_| OwnershipError::LockPoisoned)?;
        let mut snapshot: Vec<_> = slots
            .iter()
            .map(|(object, slot)| (*object, slot.clone()))
            .collect();
        snapshot.sort_by_key(|(object, _)| *object);
        Ok(snapshot)
    }

    fn fail(&self, ticket: &OwnershipTicket, request: &OwnershipRequest, error: OwnershipError) {
        trace!(
            "OwnershipArbiter: request #{} by {:?} on {} failed: {}",
            request.arrival,
            request.requester,
            request.object,
            error
        );
        ticket.complete(Err(error.clone()));
        self.emit(OwnershipEvent::Denied {
            object: request.object,
            requester: request.requester,
            error,
        });
    }

    fn emit(&self, event: OwnershipEvent) {
        // a dropped receiver means nobody is listening anymore
        if self.event_sender.send(event).is_err() {
            trace!("OwnershipArbiter: event receiver dropped");
        }
    }
}

fn lock_slot(
    slot: &Arc<Mutex<ArbitrationSlot>>,
) -> Result<MutexGuard<'_, ArbitrationSlot>, OwnershipError> {
    slot.lock().map_err(|_| OwnershipError::LockPoisoned)
}

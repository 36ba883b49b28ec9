use std::collections::VecDeque;

use crate::{ObjectId, OwnershipTicket, ParticipantKey};

/// A request for ownership as it arrived at the arbitrating authority
#[derive(Clone, Debug)]
pub struct OwnershipRequest {
    pub object: ObjectId,
    pub requester: ParticipantKey,
    /// Arrival order at the authority, used to break ties first-come-first-served
    pub arrival: u64,
}

impl OwnershipRequest {
    pub fn new(object: ObjectId, requester: ParticipantKey, arrival: u64) -> Self {
        Self {
            object,
            requester,
            arrival,
        }
    }
}

/// Per-object FIFO of unresolved requests
pub(crate) struct RequestQueue {
    entries: VecDeque<(OwnershipRequest, OwnershipTicket)>,
}

impl RequestQueue {
    pub(crate) fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn ticket_for(&self, requester: &ParticipantKey) -> Option<&OwnershipTicket> {
        self.entries
            .iter()
            .find(|(request, _)| request.requester == *requester)
            .map(|(_, ticket)| ticket)
    }

    pub(crate) fn push(&mut self, request: OwnershipRequest, ticket: OwnershipTicket) {
        self.entries.push_back((request, ticket));
    }

    pub(crate) fn pop_front(&mut self) -> Option<(OwnershipRequest, OwnershipTicket)> {
        self.entries.pop_front()
    }

    pub(crate) fn remove_requester(
        &mut self,
        requester: &ParticipantKey,
    ) -> Vec<(OwnershipRequest, OwnershipTicket)> {
        let mut removed = Vec::new();
        let mut kept = VecDeque::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if entry.0.requester == *requester {
                removed.push(entry);
            } else {
                kept.push_back(entry);
            }
        }
        self.entries = kept;
        removed
    }

    pub(crate) fn drain(&mut self) -> Vec<(OwnershipRequest, OwnershipTicket)> {
        self.entries.drain(..).collect()
    }
}

use crate::{ObjectId, ParticipantKey, PropertyChangeSet, RigidbodyState, Tick, Transform};

/// Everything replicated for one object on one tick. Owns its data, so it can
/// be queued for the transport after the change log has moved on.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplicationFrame {
    pub object: ObjectId,
    pub tick: Tick,
    pub owner: Option<ParticipantKey>,
    pub transform: Option<Transform>,
    pub rigidbody: Option<RigidbodyState>,
    pub properties: Option<PropertyChangeSet>,
}

impl ReplicationFrame {
    pub fn is_empty(&self) -> bool {
        self.transform.is_none() && self.rigidbody.is_none() && self.properties.is_none()
    }
}

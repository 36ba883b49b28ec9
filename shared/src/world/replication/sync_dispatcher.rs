use crate::{NetworkObject, PropertyChangeSet, ReplicationFrame, SyncFlags, Tick};

/// Picks the sub-systems of an object that go out on a tick.
///
/// Holds no state: the frame depends only on the object snapshot, its sync
/// flags and the changes flushed for it. Sub-systems whose flag is off are
/// skipped without error.
pub struct SyncDispatcher;

impl SyncDispatcher {
    pub fn dispatch(
        object: &NetworkObject,
        tick: Tick,
        changes: Option<&PropertyChangeSet>,
    ) -> Option<ReplicationFrame> {
        let flags = object.sync_flags;

        let transform = flags
            .contains(SyncFlags::TRANSFORM)
            .then_some(object.state.transform);
        let rigidbody = flags
            .contains(SyncFlags::RIGIDBODY)
            .then_some(object.state.rigidbody);
        let properties = if flags.contains(SyncFlags::CUSTOM_PROPERTIES) {
            changes.filter(|changes| !changes.is_empty()).cloned()
        } else {
            None
        };

        let frame = ReplicationFrame {
            object: object.id,
            tick,
            owner: object.owner,
            transform,
            rigidbody,
            properties,
        };

        if frame.is_empty() {
            None
        } else {
            Some(frame)
        }
    }
}

use tether_shared::{ObjectId, PropertyChangeSet, Tick};

/// Receives every non-empty property change set the Server flushes.
///
/// The change set is only borrowed for the duration of the call, it is
/// recycled by the next flush. Clone whatever must be kept.
pub trait PropertyObserver: Send {
    fn on_properties_changed(&mut self, object: &ObjectId, tick: Tick, changes: &PropertyChangeSet);
}

impl<F> PropertyObserver for F
where
    F: FnMut(&ObjectId, Tick, &PropertyChangeSet) + Send,
{
    fn on_properties_changed(&mut self, object: &ObjectId, tick: Tick, changes: &PropertyChangeSet) {
        self(object, tick, changes)
    }
}

use std::collections::HashMap;

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::debug;

use crate::{
    ObjectId, PropertyChangeSet, PropertyCommand, PropertyCommandSender, PropertyLogError,
    PropertyValue,
};

// DoubleBuffer
struct DoubleBuffer {
    buffers: [PropertyChangeSet; 2],
    accumulating: usize,
    values: HashMap<String, PropertyValue>,
}

impl DoubleBuffer {
    fn new() -> Self {
        Self {
            buffers: [PropertyChangeSet::new(), PropertyChangeSet::new()],
            accumulating: 0,
            values: HashMap::new(),
        }
    }

    fn set(&mut self, key: String, value: PropertyValue) {
        self.values.insert(key.clone(), value.clone());
        self.buffers[self.accumulating].set(key, value);
    }

    fn remove(&mut self, key: String) {
        self.values.remove(&key);
        self.buffers[self.accumulating].remove(key);
    }

    fn swap(&mut self) -> &PropertyChangeSet {
        let delivered = self.accumulating;
        self.accumulating = 1 - delivered;
        // the buffer delivered by the previous flush is recycled here
        self.buffers[self.accumulating].clear();
        &self.buffers[delivered]
    }
}

/// Accumulates custom property changes per object between flushes.
///
/// Each object has two change sets: one fills up while the other holds the
/// result of the last flush. A flush swaps them and clears the older one for
/// reuse. The set returned by `flush` borrows the log, so it cannot be held
/// across the next flush; copy anything that must outlive it.
///
/// The log belongs to a single scheduling thread. Other threads write through
/// a `PropertyCommandSender`.
pub struct PropertyChangeLog {
    objects: HashMap<ObjectId, DoubleBuffer>,
    command_sender: Sender<PropertyCommand>,
    command_receiver: Receiver<PropertyCommand>,
}

impl PropertyChangeLog {
    pub fn new() -> Self {
        let (command_sender, command_receiver) = unbounded();
        Self {
            objects: HashMap::new(),
            command_sender,
            command_receiver,
        }
    }

    pub fn track(&mut self, object: &ObjectId) -> Result<(), PropertyLogError> {
        if self.objects.contains_key(object) {
            return Err(PropertyLogError::AlreadyTracked { object: *object });
        }
        self.objects.insert(*object, DoubleBuffer::new());
        Ok(())
    }

    pub fn untrack(&mut self, object: &ObjectId) -> Result<(), PropertyLogError> {
        self.objects
            .remove(object)
            .map(|_| ())
            .ok_or(PropertyLogError::NotFound { object: *object })
    }

    pub fn is_tracked(&self, object: &ObjectId) -> bool {
        self.objects.contains_key(object)
    }

    /// Records a new value. The last write to a key within an interval wins.
    pub fn set_property<K: Into<String>, V: Into<PropertyValue>>(
        &mut self,
        object: &ObjectId,
        key: K,
        value: V,
    ) -> Result<(), PropertyLogError> {
        let buffer = self.buffer_mut(object)?;
        buffer.set(key.into(), value.into());
        Ok(())
    }

    /// Records a removal, cancelling any set of the same key earlier in the interval
    pub fn remove_property<K: Into<String>>(
        &mut self,
        object: &ObjectId,
        key: K,
    ) -> Result<(), PropertyLogError> {
        let buffer = self.buffer_mut(object)?;
        buffer.remove(key.into());
        Ok(())
    }

    /// Current value of a property
    pub fn property(&self, object: &ObjectId, key: &str) -> Option<&PropertyValue> {
        self.objects
            .get(object)
            .and_then(|buffer| buffer.values.get(key))
    }

    /// Every current property of an object
    pub fn properties(&self, object: &ObjectId) -> Option<&HashMap<String, PropertyValue>> {
        self.objects.get(object).map(|buffer| &buffer.values)
    }

    /// Ends the interval for one object and returns what changed during it
    pub fn flush(&mut self, object: &ObjectId) -> Result<&PropertyChangeSet, PropertyLogError> {
        let buffer = self.buffer_mut(object)?;
        Ok(buffer.swap())
    }

    /// Ends the interval for every tracked object, handing each change set to `visit`
    pub fn flush_each<F: FnMut(&ObjectId, &PropertyChangeSet)>(&mut self, mut visit: F) {
        for (object, buffer) in self.objects.iter_mut() {
            let changes = buffer.swap();
            visit(object, changes);
        }
    }

    /// Handle for writing properties from other threads
    pub fn command_sender(&self) -> PropertyCommandSender {
        PropertyCommandSender::new(self.command_sender.clone())
    }

    /// Applies every command sent from other threads since the last call.
    ///
    /// Each command is first passed to `admit`, which decides whether its
    /// Actor may write the object. Commands that are refused, or whose object
    /// is no longer tracked, are returned with the reason they failed.
    pub fn apply_pending_commands<E, F>(&mut self, mut admit: F) -> Vec<(PropertyCommand, E)>
    where
        E: From<PropertyLogError>,
        F: FnMut(&PropertyCommand) -> Result<(), E>,
    {
        let commands: Vec<PropertyCommand> = self.command_receiver.try_iter().collect();
        let mut failed = Vec::new();
        for command in commands {
            if let Err(error) = admit(&command) {
                failed.push((command, error));
                continue;
            }
            let result = match &command {
                PropertyCommand::Set {
                    object, key, value, ..
                } => self.set_property(object, key.clone(), value.clone()),
                PropertyCommand::Remove { object, key, .. } => {
                    self.remove_property(object, key.clone())
                }
            };
            if let Err(error) = result {
                debug!(
                    "PropertyChangeLog: command for {} failed: {}",
                    command.object(),
                    error
                );
                failed.push((command, error.into()));
            }
        }
        failed
    }

    fn buffer_mut(&mut self, object: &ObjectId) -> Result<&mut DoubleBuffer, PropertyLogError> {
        self.objects
            .get_mut(object)
            .ok_or(PropertyLogError::NotFound { object: *object })
    }
}

impl Default for PropertyChangeLog {
    fn default() -> Self {
        Self::new()
    }
}

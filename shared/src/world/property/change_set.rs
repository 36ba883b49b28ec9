use std::collections::{HashMap, HashSet};

use crate::PropertyValue;

/// Custom property changes of one object over one flush interval.
///
/// A key is never both changed and removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyChangeSet {
    changed: HashMap<String, PropertyValue>,
    removed: HashSet<String>,
}

impl PropertyChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changed(&self) -> &HashMap<String, PropertyValue> {
        &self.changed
    }

    pub fn removed(&self) -> &HashSet<String> {
        &self.removed
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.changed.get(key)
    }

    pub fn is_removed(&self, key: &str) -> bool {
        self.removed.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }

    /// Number of keys touched
    pub fn len(&self) -> usize {
        self.changed.len() + self.removed.len()
    }

    pub(crate) fn set(&mut self, key: String, value: PropertyValue) {
        self.removed.remove(&key);
        self.changed.insert(key, value);
    }

    pub(crate) fn remove(&mut self, key: String) {
        self.changed.remove(&key);
        self.removed.insert(key);
    }

    // keeps the allocations around for the next interval
    pub(crate) fn clear(&mut self) {
        self.changed.clear();
        self.removed.clear();
    }
}

/// A change set that sets every given property, used to bring a late joiner up to date
impl FromIterator<(String, PropertyValue)> for PropertyChangeSet {
    fn from_iter<I: IntoIterator<Item = (String, PropertyValue)>>(iter: I) -> Self {
        Self {
            changed: iter.into_iter().collect(),
            removed: HashSet::new(),
        }
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

use crate::ObjectId;

/// Hands out process-unique ObjectIds. Ids are never recycled.
pub struct KeyGenerator {
    next: AtomicU64,
}

impl KeyGenerator {
    pub fn new() -> Self {
        // 0 is left unused so a zeroed id is never a live object
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn generate(&self) -> ObjectId {
        ObjectId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

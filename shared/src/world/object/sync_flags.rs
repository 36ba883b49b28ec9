bitflags::bitflags! {
    /// Selects which sub-systems of an object are replicated each tick
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SyncFlags: u8 {
        /// Position, rotation & scale
        const TRANSFORM = 1 << 0;
        /// Linear & angular velocity
        const RIGIDBODY = 1 << 1;
        /// Custom key/value properties
        const CUSTOM_PROPERTIES = 1 << 2;
    }
}

impl Default for SyncFlags {
    fn default() -> Self {
        SyncFlags::TRANSFORM | SyncFlags::CUSTOM_PROPERTIES
    }
}

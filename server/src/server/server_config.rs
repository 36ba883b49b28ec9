use std::default::Default;

use tether_shared::{ArbiterConfig, SyncFlags};

/// What happens to the objects a participant owned when it disconnects
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DisconnectPolicy {
    /// Ownership goes back to the Server, the objects stay alive
    #[default]
    Release,
    /// The objects (and everything parented under them) are despawned
    Despawn,
}

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Determines what happens to owned objects when their owner disconnects
    pub disconnect_policy: DisconnectPolicy,
    /// How many ownership requests from distinct participants may wait on a
    /// single object. Requests beyond this are rejected immediately.
    pub max_queued_requests: usize,
    /// Sync flags given to objects created through `Server::new_object`
    pub default_sync_flags: SyncFlags,
}

impl ServerConfig {
    pub(crate) fn arbiter_config(&self) -> ArbiterConfig {
        ArbiterConfig {
            max_queued_requests: self.max_queued_requests,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            disconnect_policy: DisconnectPolicy::default(),
            max_queued_requests: ArbiterConfig::default().max_queued_requests,
            default_sync_flags: SyncFlags::default(),
        }
    }
}

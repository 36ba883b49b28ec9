pub mod network_object;
pub mod object_id;
pub mod spawn_source;
pub mod sync_flags;
pub mod transform;

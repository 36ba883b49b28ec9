pub mod replication_frame;
pub mod sync_dispatcher;

pub mod error;
pub mod ownership_arbiter;
pub mod ownership_channel;
pub mod ownership_event;
pub mod ownership_status;
pub mod ownership_ticket;
pub mod request_queue;

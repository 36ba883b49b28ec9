pub mod error;
pub mod object_registry;

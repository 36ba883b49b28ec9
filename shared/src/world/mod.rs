pub mod delegation;
pub mod object;
pub mod property;
pub mod registry;
pub mod replication;

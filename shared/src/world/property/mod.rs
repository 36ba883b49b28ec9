pub mod change_set;
pub mod error;
pub mod property_change_log;
pub mod property_command;
pub mod property_value;

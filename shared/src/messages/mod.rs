pub mod ownership_message;

pub mod loopback;

pub use loopback::{Delivery, Loopback};

//! Concrete routes

pub mod null;
pub mod queueing;

pub use null::NullRoute;
pub use queueing::{QueueStopper, Queueing};

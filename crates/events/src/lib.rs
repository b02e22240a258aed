//! Encore real-time fan-out.
//!
//! - [`SessionHub`]: per-session publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`QueueEvent`]: the change notification envelope (`request:new`,
//!   `request:update`).

pub mod event;
pub mod hub;

pub use event::{QueueEvent, QueueEventKind};
pub use hub::{Delivery, SessionHub, Subscription};

//! Encore queue engine.
//!
//! Owns every session's request queue in memory and serializes all
//! position-affecting operations through one lock per session:
//!
//! - [`registry`]: sessions, slugs, lifecycle, and the per-session lock.
//! - [`store`]: the request entity store guarded by that lock.
//! - [`transition`]: status changes and their side effects.
//! - [`QueueEngine`]: the façade used by the API, publishing change
//!   notifications through [`encore_events::SessionHub`].

pub mod config;
pub mod engine;
pub mod registry;
pub mod store;
pub mod transition;

pub use config::EngineConfig;
pub use engine::QueueEngine;

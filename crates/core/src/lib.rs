//! Encore domain core.
//!
//! Pure domain logic with no runtime dependencies: identifiers, the error
//! taxonomy, the request status state machine, dense queue ordering, slug
//! generation, and the session/request models shared by every other crate.

pub mod error;
pub mod models;
pub mod ordering;
pub mod slug;
pub mod status;
pub mod types;

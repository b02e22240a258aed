//! Request guards.
//!
//! - [`auth::RequireAdmin`] -- Requires the configured admin bearer token.

pub mod auth;

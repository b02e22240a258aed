//! Session and request models plus the input DTOs accepted by the API.

pub mod request;
pub mod session;

pub mod admin;
pub mod requests;
pub mod sessions;

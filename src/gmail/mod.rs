//! Gmail API module
//!
//! Contains types, authentication, and client for interacting with the Gmail API.

pub mod auth;
pub mod client;
pub mod filters;
pub mod labels;
pub mod settings;
pub mod types;
pub mod utils;

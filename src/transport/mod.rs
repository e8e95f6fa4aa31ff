//! HTTP streaming transport
//!
//! Session registry and the SSE + message-post routes.

pub mod http;
pub mod session;

//! MCP (Model Context Protocol) module
//!
//! Protocol types, the tool dispatcher, and the stdio transport.

pub mod dispatcher;
pub mod stdio;
pub mod tools;
pub mod types;

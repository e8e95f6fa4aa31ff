//! Gmail MCP Server Library
//!
//! A Model Context Protocol (MCP) server for Gmail integration.
//! Serves Gmail tools over stdio or an SSE-based HTTP transport.

pub mod config;
pub mod error;
pub mod gmail;
pub mod mcp;
pub mod transport;

pub use config::Config;
pub use error::{GmailMcpError, Result};

//! Stdio transport
//!
//! Line-oriented JSON-RPC over stdin/stdout. Logging goes to stderr so
//! stdout stays a clean protocol channel.

use std::io::{BufRead, Write};
use std::sync::Arc;

use crate::error::Result;
use crate::mcp::dispatcher::ToolDispatcher;

/// Stdio transport over the shared dispatcher
pub struct StdioTransport {
    dispatcher: Arc<ToolDispatcher>,
}

impl StdioTransport {
    pub fn new(dispatcher: Arc<ToolDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// Read envelopes line by line until stdin closes
    pub async fn run(&self) -> Result<()> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        let reader = stdin.lock();

        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match self.dispatcher.handle_message(&line).await {
                Some(response) => {
                    let response_str = serde_json::to_string(&response)?;
                    writeln!(stdout, "{}", response_str)?;
                    stdout.flush()?;
                }
                None => {
                    // Notification, no response needed
                }
            }
        }

        Ok(())
    }
}

//! Gmail MCP Server
//!
//! A Model Context Protocol (MCP) server for Gmail integration.
//! Serves Gmail tools over stdio (the default) or an SSE-based HTTP
//! transport, with a one-time interactive OAuth flow for setup.

use std::sync::Arc;

use clap::{Parser, Subcommand};

use gmail_mcp::config::Config;
use gmail_mcp::error::{AuthError, Result};
use gmail_mcp::gmail::auth::Authenticator;
use gmail_mcp::gmail::client::GmailClient;
use gmail_mcp::mcp::dispatcher::ToolDispatcher;
use gmail_mcp::mcp::stdio::StdioTransport;
use gmail_mcp::transport::http;

/// Gmail MCP Server
#[derive(Parser)]
#[command(name = "gmail-mcp")]
#[command(author, version, about = "Gmail MCP Server - A Model Context Protocol server for Gmail")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate with Gmail (run this first)
    Auth,
    /// Serve the MCP protocol over HTTP with SSE streaming
    Http {
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging goes to stderr; stdout is the stdio protocol channel
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::new()?;

    match cli.command {
        Some(Commands::Auth) => {
            let authenticator = Authenticator::new(config).await?;
            authenticator.authenticate_interactive().await?;
            eprintln!("Authentication completed successfully!");
            Ok(())
        }
        Some(Commands::Http { port }) => {
            let port = port.unwrap_or(config.http_port);
            let dispatcher = build_dispatcher(config).await?;
            http::serve(dispatcher, port).await
        }
        None => {
            let dispatcher = build_dispatcher(config).await?;
            StdioTransport::new(dispatcher).run().await
        }
    }
}

/// Build the shared dispatcher, refusing to start without a usable
/// token state.
async fn build_dispatcher(config: Config) -> Result<Arc<ToolDispatcher>> {
    let authenticator = Authenticator::new(config).await?;

    if !authenticator.validate().await {
        return Err(AuthError::NotAuthenticated.into());
    }

    let gmail_client = Arc::new(GmailClient::new(Arc::new(authenticator)));
    Ok(Arc::new(ToolDispatcher::new(gmail_client)))
}

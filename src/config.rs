//! Configuration management for the Gmail MCP server
//!
//! Handles paths, environment variables, and port selection.

use std::path::PathBuf;

use crate::error::{ConfigError, GmailMcpError, Result};

/// Gmail API scopes requested during authorization
pub const AUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.modify",
    "https://www.googleapis.com/auth/gmail.compose",
    "https://www.googleapis.com/auth/gmail.send",
    "https://www.googleapis.com/auth/gmail.settings.basic",
    "https://www.googleapis.com/auth/gmail.settings.sharing",
];

/// Client credentials supplied through the environment. A complete triple
/// takes precedence over the key file on disk.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Configuration for the Gmail MCP server
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory for storing configuration files
    pub config_dir: PathBuf,

    /// Path to OAuth keys file (client credentials)
    pub oauth_path: PathBuf,

    /// Path to stored credentials (access/refresh tokens)
    pub credentials_path: PathBuf,

    /// OAuth callback URL
    pub oauth_callback_url: String,

    /// OAuth callback port
    pub oauth_callback_port: u16,

    /// Port for the HTTP (SSE) transport
    pub http_port: u16,
}

impl Config {
    /// Create a new configuration with default paths
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;

        let oauth_path = std::env::var("GMAIL_OAUTH_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir.join("gcp-oauth.keys.json"));

        let credentials_path = std::env::var("GMAIL_CREDENTIALS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir.join("credentials.json"));

        let oauth_callback_port = std::env::var("GMAIL_OAUTH_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let http_port = std::env::var("GMAIL_MCP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3003);

        let oauth_callback_url = format!("http://localhost:{}/oauth2callback", oauth_callback_port);

        Ok(Self {
            config_dir,
            oauth_path,
            credentials_path,
            oauth_callback_url,
            oauth_callback_port,
            http_port,
        })
    }

    /// Get the configuration directory, creating it if necessary
    fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::home_dir()
            .ok_or_else(|| {
                GmailMcpError::Config(ConfigError::DirNotFound {
                    path: "~".to_string(),
                })
            })?
            .join(".gmail-mcp");

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir).map_err(|_| {
                GmailMcpError::Config(ConfigError::DirCreationFailed {
                    path: config_dir.display().to_string(),
                })
            })?;
        }

        Ok(config_dir)
    }

    /// Client credentials from the environment, if a complete triple is set
    pub fn env_credentials(&self) -> Option<EnvCredentials> {
        let client_id = std::env::var("GMAIL_CLIENT_ID").ok()?;
        let client_secret = std::env::var("GMAIL_CLIENT_SECRET").ok()?;
        let refresh_token = std::env::var("GMAIL_REFRESH_TOKEN").ok()?;

        if client_id.is_empty() || client_secret.is_empty() || refresh_token.is_empty() {
            return None;
        }

        Some(EnvCredentials {
            client_id,
            client_secret,
            refresh_token,
        })
    }

    /// Check if credentials (tokens) exist
    pub fn credentials_exist(&self) -> bool {
        self.credentials_path.exists()
    }
}

/// Gmail API constants
pub mod gmail {
    /// Base URL for Gmail API
    pub const API_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

    /// User ID for the authenticated user
    pub const USER_ID: &str = "me";
}

//! Error types for the Gmail MCP server
//!
//! This module defines the error hierarchy for all operations in the server.

use thiserror::Error;

/// Remediation hint appended to every authentication failure surfaced to
/// the caller.
pub const REAUTH_HINT: &str = "Please re-authenticate by running: gmail-mcp auth";

/// Main error type for the Gmail MCP server
#[derive(Error, Debug)]
pub enum GmailMcpError {
    /// OAuth authentication errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Gmail API errors
    #[error("Gmail API error: {0}")]
    Gmail(#[from] GmailApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// MCP protocol errors
    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GmailMcpError {
    /// Whether this failure requires the user to re-run the authorization
    /// flow: a revoked or invalid grant, a bad client, or an auth-shaped
    /// HTTP status from the downstream API.
    pub fn requires_reauth(&self) -> bool {
        match self {
            GmailMcpError::Auth(_) => true,
            GmailMcpError::Gmail(GmailApiError::RequestFailed { status, message }) => {
                *status == 401
                    || *status == 403
                    || message.contains("invalid_grant")
                    || message.contains("refresh_token")
                    || message.contains("invalid_client")
                    || message.contains("unauthorized_client")
            }
            _ => false,
        }
    }
}

/// OAuth authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("OAuth keys file not found: {path}")]
    KeysFileNotFound { path: String },

    #[error("Invalid OAuth keys format: expected 'installed' or 'web' credentials")]
    InvalidKeysFormat,

    #[error("No stored credentials: {path}")]
    CredentialsNotFound { path: String },

    #[error("Access token is expired and no refresh token is available")]
    NotRefreshable,

    #[error("Not authenticated; run 'gmail-mcp auth' first")]
    NotAuthenticated,

    #[error("Failed to refresh access token: {message}")]
    TokenRefreshFailed { message: String },

    #[error("OAuth callback error: {message}")]
    CallbackError { message: String },

    #[error("No authorization code provided")]
    NoAuthCode,

    #[error("Timed out waiting for the OAuth callback")]
    AuthorizationTimeout,

    #[error("Token exchange failed: {message}")]
    TokenExchangeFailed { message: String },
}

/// Gmail API errors
#[derive(Error, Debug)]
pub enum GmailApiError {
    #[error("API request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Unexpected response shape: {message}")]
    InvalidResponse { message: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found: {path}")]
    DirNotFound { path: String },

    #[error("Failed to create config directory: {path}")]
    DirCreationFailed { path: String },

    #[error(
        "No usable client credentials: set GMAIL_CLIENT_ID and GMAIL_CLIENT_SECRET \
         or place gcp-oauth.keys.json in the config directory"
    )]
    MissingClientCredentials,
}

/// Session transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("sessionId query parameter required")]
    MissingSessionId,

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool arguments: {message}")]
    InvalidArguments { message: String },

    #[error("Transport error: {message}")]
    TransportFailure { message: String },
}

/// Result type alias for Gmail MCP operations
pub type Result<T> = std::result::Result<T, GmailMcpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::KeysFileNotFound {
            path: "/path/to/keys.json".to_string(),
        };
        assert!(err.to_string().contains("/path/to/keys.json"));
    }

    #[test]
    fn test_error_conversion() {
        let auth_err = AuthError::NoAuthCode;
        let err: GmailMcpError = auth_err.into();
        assert!(matches!(err, GmailMcpError::Auth(_)));
    }

    #[test]
    fn test_requires_reauth_for_auth_errors() {
        let err: GmailMcpError = AuthError::NotRefreshable.into();
        assert!(err.requires_reauth());
    }

    #[test]
    fn test_not_authenticated_names_the_auth_command() {
        let err: GmailMcpError = AuthError::NotAuthenticated.into();
        assert!(err.to_string().contains("gmail-mcp auth"));
        assert!(err.requires_reauth());
    }

    #[test]
    fn test_requires_reauth_for_api_statuses() {
        let unauthorized: GmailMcpError = GmailApiError::RequestFailed {
            status: 401,
            message: "Invalid Credentials".to_string(),
        }
        .into();
        assert!(unauthorized.requires_reauth());

        let revoked: GmailMcpError = GmailApiError::RequestFailed {
            status: 400,
            message: "error: invalid_grant".to_string(),
        }
        .into();
        assert!(revoked.requires_reauth());

        let server_side: GmailMcpError = GmailApiError::RequestFailed {
            status: 500,
            message: "backend error".to_string(),
        }
        .into();
        assert!(!server_side.requires_reauth());
    }

    #[test]
    fn test_session_not_found_display() {
        let err = TransportError::SessionNotFound {
            session_id: "abc".to_string(),
        };
        assert!(err.to_string().contains("abc"));
    }
}

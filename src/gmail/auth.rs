//! OAuth authentication for the Gmail API
//!
//! Drives the credential lifecycle: loading client credentials from the
//! environment or a key file, validating and refreshing access tokens,
//! persisting token sets, and the one-time interactive authorization flow
//! with a local callback listener.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::config::{Config, AUTH_SCOPES};
use crate::error::{AuthError, ConfigError, GmailMcpError, Result};

/// Google OAuth endpoints used when credentials come from the environment
/// (the key file carries its own).
const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// How long the interactive flow waits for the OAuth callback before the
/// listener is torn down and the attempt fails.
const AUTH_FLOW_TIMEOUT: Duration = Duration::from_secs(300);

/// OAuth client credentials
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthKeys {
    /// Client ID
    pub client_id: String,

    /// Client secret
    pub client_secret: String,

    /// Auth URI
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,

    /// Token URI
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth keys file format (can be "installed" or "web")
#[derive(Debug, Deserialize)]
struct OAuthKeysFile {
    #[serde(alias = "web")]
    installed: Option<OAuthKeys>,
}

/// Stored token set, persisted as JSON under the config directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Access token (absent until the first refresh when only a refresh
    /// token was supplied)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    /// Refresh token
    pub refresh_token: Option<String>,

    /// Token type (usually "Bearer")
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Expiry timestamp (Unix seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,

    /// Scopes
    #[serde(default)]
    pub scope: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl StoredCredentials {
    /// A credential set holding only a refresh token (environment override)
    fn from_refresh_token(refresh_token: String) -> Self {
        Self {
            access_token: None,
            refresh_token: Some(refresh_token),
            token_type: default_token_type(),
            expiry_date: None,
            scope: String::new(),
        }
    }

    /// Usable right now: an access token with an expiry strictly in the
    /// future.
    fn is_fresh(&self, now: i64) -> bool {
        self.access_token.is_some() && self.expiry_date.map(|e| e > now).unwrap_or(false)
    }
}

/// Token response from the OAuth token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
    expires_in: Option<i64>,
    #[serde(default)]
    scope: String,
}

fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// OAuth credential lifecycle manager
pub struct Authenticator {
    /// Configuration
    config: Config,

    /// HTTP client
    http_client: reqwest::Client,

    /// OAuth client credentials
    keys: OAuthKeys,

    /// Current token set
    credentials: Arc<RwLock<Option<StoredCredentials>>>,

    /// Single-flight guard: concurrent callers that both observe a stale
    /// token share one refresh instead of each issuing a network call.
    refresh_guard: Mutex<()>,
}

impl Authenticator {
    /// Create a new authenticator.
    ///
    /// A complete `GMAIL_CLIENT_ID`/`GMAIL_CLIENT_SECRET`/`GMAIL_REFRESH_TOKEN`
    /// triple takes precedence over the key file; with neither source the
    /// startup fails.
    pub async fn new(config: Config) -> Result<Self> {
        let http_client = reqwest::Client::new();

        if let Some(env) = config.env_credentials() {
            let keys = OAuthKeys {
                client_id: env.client_id,
                client_secret: env.client_secret,
                auth_uri: default_auth_uri(),
                token_uri: default_token_uri(),
            };
            let creds = StoredCredentials::from_refresh_token(env.refresh_token);

            return Ok(Self {
                config,
                http_client,
                keys,
                credentials: Arc::new(RwLock::new(Some(creds))),
                refresh_guard: Mutex::new(()),
            });
        }

        let keys = Self::load_oauth_keys(&config.oauth_path)?;

        let auth = Self {
            config,
            http_client,
            keys,
            credentials: Arc::new(RwLock::new(None)),
            refresh_guard: Mutex::new(()),
        };

        if auth.config.credentials_exist() {
            if let Ok(creds) = auth.load_credentials().await {
                *auth.credentials.write().await = Some(creds);
            }
        }

        Ok(auth)
    }

    /// Create an authenticator from explicit keys with no stored tokens,
    /// bypassing environment and file discovery.
    pub fn with_keys(config: Config, keys: OAuthKeys) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
            keys,
            credentials: Arc::new(RwLock::new(None)),
            refresh_guard: Mutex::new(()),
        }
    }

    /// Load OAuth keys from file
    fn load_oauth_keys(path: &Path) -> Result<OAuthKeys> {
        if !path.exists() {
            return Err(GmailMcpError::Config(ConfigError::MissingClientCredentials));
        }

        let content = std::fs::read_to_string(path)?;
        let keys_file: OAuthKeysFile = serde_json::from_str(&content)?;

        keys_file
            .installed
            .ok_or_else(|| GmailMcpError::Auth(AuthError::InvalidKeysFormat))
    }

    /// Load stored credentials from file
    async fn load_credentials(&self) -> Result<StoredCredentials> {
        let content = tokio::fs::read_to_string(&self.config.credentials_path).await?;
        let creds: StoredCredentials = serde_json::from_str(&content)?;
        Ok(creds)
    }

    /// Persist credentials to file. Persistence happens before the caller
    /// sees a valid result, so a crash after a refresh never loses tokens.
    async fn save_credentials(&self, credentials: &StoredCredentials) -> Result<()> {
        let content = serde_json::to_string_pretty(credentials)?;
        tokio::fs::write(&self.config.credentials_path, content).await?;
        Ok(())
    }

    /// Whether the credential is usable right now, refreshing it if a
    /// refresh token allows. Returns false without a network call when no
    /// refresh token is present, and false when the refresh itself fails;
    /// neither case is retried here.
    pub async fn validate(&self) -> bool {
        match self.ensure_valid().await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("credential validation failed: {}", e);
                false
            }
        }
    }

    /// Get a valid access token, refreshing if necessary
    pub async fn access_token(&self) -> Result<String> {
        self.ensure_valid().await?;

        let creds = self.credentials.read().await;
        creds
            .as_ref()
            .and_then(|c| c.access_token.clone())
            .ok_or_else(|| {
                GmailMcpError::Auth(AuthError::CredentialsNotFound {
                    path: self.config.credentials_path.display().to_string(),
                })
            })
    }

    /// Make the in-memory token set fresh, refreshing at most once
    async fn ensure_valid(&self) -> Result<()> {
        let now = unix_now();
        {
            let creds = self.credentials.read().await;
            let creds = creds.as_ref().ok_or_else(|| {
                GmailMcpError::Auth(AuthError::CredentialsNotFound {
                    path: self.config.credentials_path.display().to_string(),
                })
            })?;

            if creds.is_fresh(now) {
                return Ok(());
            }

            if creds.refresh_token.is_none() {
                return Err(GmailMcpError::Auth(AuthError::NotRefreshable));
            }
        }

        self.refresh_token().await
    }

    /// Refresh the access token using the refresh token. Serialized behind
    /// the single-flight guard; a caller that was queued behind an
    /// in-flight refresh re-checks the expiry and reuses the fresh result.
    async fn refresh_token(&self) -> Result<()> {
        let _guard = self.refresh_guard.lock().await;

        let refresh_token = {
            let creds = self.credentials.read().await;
            let creds = creds.as_ref().ok_or_else(|| {
                GmailMcpError::Auth(AuthError::CredentialsNotFound {
                    path: self.config.credentials_path.display().to_string(),
                })
            })?;

            if creds.is_fresh(unix_now()) {
                return Ok(());
            }

            creds
                .refresh_token
                .clone()
                .ok_or_else(|| GmailMcpError::Auth(AuthError::NotRefreshable))?
        };

        let params = [
            ("client_id", self.keys.client_id.as_str()),
            ("client_secret", self.keys.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http_client
            .post(&self.keys.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GmailMcpError::Auth(AuthError::TokenRefreshFailed {
                message: text,
            }));
        }

        let token_response: TokenResponse = response.json().await?;
        let now = unix_now();

        let new_credentials = StoredCredentials {
            access_token: Some(token_response.access_token),
            refresh_token: token_response.refresh_token.or(Some(refresh_token)),
            token_type: token_response.token_type,
            expiry_date: token_response.expires_in.map(|e| now + e),
            scope: token_response.scope,
        };

        self.save_credentials(&new_credentials).await?;
        *self.credentials.write().await = Some(new_credentials);

        Ok(())
    }

    /// Generate the authorization URL
    pub fn generate_auth_url(&self) -> String {
        let scopes = AUTH_SCOPES.join(" ");
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
            self.keys.auth_uri,
            urlencoding::encode(&self.keys.client_id),
            urlencoding::encode(&self.config.oauth_callback_url),
            urlencoding::encode(&scopes)
        )
    }

    /// Exchange authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> Result<StoredCredentials> {
        let params = [
            ("client_id", self.keys.client_id.as_str()),
            ("client_secret", self.keys.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.config.oauth_callback_url.as_str()),
        ];

        let response = self
            .http_client
            .post(&self.keys.token_uri)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GmailMcpError::Auth(AuthError::TokenExchangeFailed {
                message: text,
            }));
        }

        let token_response: TokenResponse = response.json().await?;
        let now = unix_now();

        let credentials = StoredCredentials {
            access_token: Some(token_response.access_token),
            refresh_token: token_response.refresh_token,
            token_type: token_response.token_type,
            expiry_date: token_response.expires_in.map(|e| now + e),
            scope: token_response.scope,
        };

        self.save_credentials(&credentials).await?;
        *self.credentials.write().await = Some(credentials.clone());

        Ok(credentials)
    }

    /// Run the interactive authorization flow.
    ///
    /// Starts a transient listener on the callback port, opens the consent
    /// URL, and waits for exactly one callback. The first callback consumes
    /// the attempt: a missing code fails the flow, and the listener is
    /// always shut down afterwards or when the timeout elapses.
    pub async fn authenticate_interactive(&self) -> Result<()> {
        use axum::{extract::Query, response::Html, routing::get, Router};
        use std::collections::HashMap;
        use tokio::sync::oneshot;

        let auth_url = self.generate_auth_url();
        eprintln!("\nPlease visit this URL to authenticate:");
        eprintln!("{}\n", auth_url);

        if let Err(e) = open::that(&auth_url) {
            eprintln!("Could not open browser automatically: {}", e);
            eprintln!("Please open the URL manually.");
        }

        // One-shot: the first callback, with or without a code, consumes
        // the in-flight attempt.
        let (tx, rx) = oneshot::channel::<Option<String>>();
        let tx = Arc::new(std::sync::Mutex::new(Some(tx)));

        let tx_clone = tx.clone();
        let callback_handler = move |Query(params): Query<HashMap<String, String>>| async move {
            let code = params.get("code").cloned();
            let page = if code.is_some() {
                Html("<html><body><h1>Authentication successful!</h1><p>You can close this window.</p></body></html>")
            } else {
                Html("<html><body><h1>Authentication failed</h1><p>No authorization code received.</p></body></html>")
            };
            if let Ok(mut guard) = tx_clone.lock() {
                if let Some(tx) = guard.take() {
                    let _ = tx.send(code);
                }
            }
            page
        };

        let app = Router::new().route("/oauth2callback", get(callback_handler));

        let addr = std::net::SocketAddr::from(([127, 0, 0, 1], self.config.oauth_callback_port));
        let listener = tokio::net::TcpListener::bind(addr).await?;

        eprintln!(
            "Waiting for authentication callback on port {}...",
            self.config.oauth_callback_port
        );

        let server = axum::serve(listener, app);

        tokio::select! {
            result = server => {
                if let Err(e) = result {
                    return Err(GmailMcpError::Auth(AuthError::CallbackError {
                        message: e.to_string(),
                    }));
                }
                Ok(())
            }
            outcome = tokio::time::timeout(AUTH_FLOW_TIMEOUT, rx) => {
                match outcome {
                    Err(_) => Err(GmailMcpError::Auth(AuthError::AuthorizationTimeout)),
                    Ok(Err(_)) => Err(GmailMcpError::Auth(AuthError::NoAuthCode)),
                    Ok(Ok(None)) => Err(GmailMcpError::Auth(AuthError::NoAuthCode)),
                    Ok(Ok(Some(code))) => {
                        eprintln!("Received authorization code, exchanging for tokens...");
                        self.exchange_code(&code).await?;
                        eprintln!("Authentication completed successfully!");
                        Ok(())
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config(dir: &tempfile::TempDir) -> Config {
        Config {
            config_dir: dir.path().to_path_buf(),
            oauth_path: dir.path().join("gcp-oauth.keys.json"),
            credentials_path: dir.path().join("credentials.json"),
            oauth_callback_url: "http://localhost:3000/oauth2callback".to_string(),
            oauth_callback_port: 3000,
            http_port: 3003,
        }
    }

    fn test_keys(token_uri: &str) -> OAuthKeys {
        OAuthKeys {
            client_id: "test-client-id".to_string(),
            client_secret: "test-secret".to_string(),
            auth_uri: DEFAULT_AUTH_URI.to_string(),
            token_uri: token_uri.to_string(),
        }
    }

    fn authenticator_with(
        config: Config,
        keys: OAuthKeys,
        creds: Option<StoredCredentials>,
    ) -> Authenticator {
        Authenticator {
            config,
            http_client: reqwest::Client::new(),
            keys,
            credentials: Arc::new(RwLock::new(creds)),
            refresh_guard: Mutex::new(()),
        }
    }

    /// Stub token endpoint that counts refresh calls
    async fn spawn_token_endpoint() -> (String, Arc<AtomicUsize>) {
        use axum::{routing::post, Json, Router};

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        let app = Router::new().route(
            "/token",
            post(move || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    // Slow enough that concurrent callers overlap
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Json(serde_json::json!({
                        "access_token": "fresh-access-token",
                        "token_type": "Bearer",
                        "expires_in": 3600,
                        "scope": ""
                    }))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/token", addr), counter)
    }

    #[test]
    fn test_oauth_keys_deserialize() {
        let json = r#"{
            "installed": {
                "client_id": "test-client-id",
                "client_secret": "test-secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token"
            }
        }"#;

        let keys_file: OAuthKeysFile = serde_json::from_str(json).unwrap();
        assert_eq!(keys_file.installed.unwrap().client_id, "test-client-id");
    }

    #[test]
    fn test_web_keys_alias() {
        let json = r#"{"web": {"client_id": "web-id", "client_secret": "s"}}"#;
        let keys_file: OAuthKeysFile = serde_json::from_str(json).unwrap();
        let keys = keys_file.installed.unwrap();
        assert_eq!(keys.client_id, "web-id");
        assert_eq!(keys.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn test_is_fresh_requires_strictly_future_expiry() {
        let mut creds = StoredCredentials {
            access_token: Some("tok".to_string()),
            refresh_token: None,
            token_type: "Bearer".to_string(),
            expiry_date: Some(1000),
            scope: String::new(),
        };
        assert!(!creds.is_fresh(1000));
        assert!(creds.is_fresh(999));

        creds.expiry_date = None;
        assert!(!creds.is_fresh(0));
    }

    #[tokio::test]
    async fn test_validate_fresh_token_no_refresh() {
        let dir = tempfile::tempdir().unwrap();
        // Unroutable token_uri: any network attempt would fail the test
        let auth = authenticator_with(
            test_config(&dir),
            test_keys("http://127.0.0.1:1/token"),
            Some(StoredCredentials {
                access_token: Some("tok".to_string()),
                refresh_token: Some("refresh".to_string()),
                token_type: "Bearer".to_string(),
                expiry_date: Some(unix_now() + 3600),
                scope: String::new(),
            }),
        );

        assert!(auth.validate().await);
        assert_eq!(auth.access_token().await.unwrap(), "tok");
    }

    #[tokio::test]
    async fn test_validate_expired_without_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let auth = authenticator_with(
            test_config(&dir),
            test_keys("http://127.0.0.1:1/token"),
            Some(StoredCredentials {
                access_token: Some("tok".to_string()),
                refresh_token: None,
                token_type: "Bearer".to_string(),
                expiry_date: Some(unix_now() - 10),
                scope: String::new(),
            }),
        );

        // No refresh token: false, and no network call is attempted (the
        // unroutable token_uri would error differently if it were).
        assert!(!auth.validate().await);
        assert!(matches!(
            auth.ensure_valid().await,
            Err(GmailMcpError::Auth(AuthError::NotRefreshable))
        ));
    }

    #[tokio::test]
    async fn test_validate_refreshes_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let (token_uri, counter) = spawn_token_endpoint().await;
        let config = test_config(&dir);
        let credentials_path = config.credentials_path.clone();

        let auth = authenticator_with(
            config,
            test_keys(&token_uri),
            Some(StoredCredentials {
                access_token: None,
                refresh_token: Some("refresh-token".to_string()),
                token_type: "Bearer".to_string(),
                expiry_date: None,
                scope: String::new(),
            }),
        );

        assert!(auth.validate().await);
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // Persisted before validate() returned
        let stored: StoredCredentials =
            serde_json::from_str(&std::fs::read_to_string(&credentials_path).unwrap()).unwrap();
        assert_eq!(stored.access_token.as_deref(), Some("fresh-access-token"));
        assert_eq!(stored.refresh_token.as_deref(), Some("refresh-token"));
        assert!(stored.expiry_date.unwrap() > unix_now());
    }

    #[tokio::test]
    async fn test_concurrent_validate_single_flight() {
        let dir = tempfile::tempdir().unwrap();
        let (token_uri, counter) = spawn_token_endpoint().await;

        let auth = Arc::new(authenticator_with(
            test_config(&dir),
            test_keys(&token_uri),
            Some(StoredCredentials {
                access_token: Some("stale".to_string()),
                refresh_token: Some("refresh-token".to_string()),
                token_type: "Bearer".to_string(),
                expiry_date: Some(unix_now() - 100),
                scope: String::new(),
            }),
        ));

        let a = {
            let auth = auth.clone();
            tokio::spawn(async move { auth.validate().await })
        };
        let b = {
            let auth = auth.clone();
            tokio::spawn(async move { auth.validate().await })
        };

        assert!(a.await.unwrap());
        assert!(b.await.unwrap());

        // Both observed the expired token, but only one refresh hit the
        // network; the persisted token set is the fresh one.
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(
            auth.access_token().await.unwrap(),
            "fresh-access-token"
        );
    }

    #[tokio::test]
    async fn test_credentials_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let auth = authenticator_with(
            test_config(&dir),
            test_keys("http://127.0.0.1:1/token"),
            None,
        );

        let creds = StoredCredentials {
            access_token: Some("tok".to_string()),
            refresh_token: Some("refresh".to_string()),
            token_type: "Bearer".to_string(),
            expiry_date: Some(1234567890),
            scope: "https://www.googleapis.com/auth/gmail.modify".to_string(),
        };

        auth.save_credentials(&creds).await.unwrap();
        let loaded = auth.load_credentials().await.unwrap();

        assert_eq!(loaded.expiry_date, creds.expiry_date);
        assert_eq!(loaded.refresh_token, creds.refresh_token);
        assert_eq!(loaded.access_token, creds.access_token);
    }
}

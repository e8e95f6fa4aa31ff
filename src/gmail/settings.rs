//! Settings endpoints
//!
//! Mailbox settings (vacation responder, IMAP, POP, display language,
//! auto-forwarding), delegates, forwarding addresses, send-as aliases,
//! and S/MIME configs as a further impl block on [`GmailClient`].
//! Settings payloads are passed through as JSON; the API's own
//! validation applies.

use reqwest::Method;
use serde_json::{json, Value};

use crate::error::Result;
use crate::gmail::client::GmailClient;

impl GmailClient {
    /// Get the vacation responder settings
    pub async fn get_vacation_settings(&self) -> Result<Value> {
        self.request(Method::GET, "/settings/vacation", &[], None)
            .await
    }

    /// Update the vacation responder settings
    pub async fn update_vacation_settings(&self, settings: Value) -> Result<Value> {
        self.request(Method::PUT, "/settings/vacation", &[], Some(settings))
            .await
    }

    /// Get the IMAP settings
    pub async fn get_imap_settings(&self) -> Result<Value> {
        self.request(Method::GET, "/settings/imap", &[], None).await
    }

    /// Update the IMAP settings
    pub async fn update_imap_settings(&self, settings: Value) -> Result<Value> {
        self.request(Method::PUT, "/settings/imap", &[], Some(settings))
            .await
    }

    /// Get the POP settings
    pub async fn get_pop_settings(&self) -> Result<Value> {
        self.request(Method::GET, "/settings/pop", &[], None).await
    }

    /// Update the POP settings
    pub async fn update_pop_settings(&self, settings: Value) -> Result<Value> {
        self.request(Method::PUT, "/settings/pop", &[], Some(settings))
            .await
    }

    /// Get the display language setting
    pub async fn get_language_settings(&self) -> Result<Value> {
        self.request(Method::GET, "/settings/language", &[], None)
            .await
    }

    /// Update the display language setting
    pub async fn update_language_settings(&self, settings: Value) -> Result<Value> {
        self.request(Method::PUT, "/settings/language", &[], Some(settings))
            .await
    }

    /// Get the auto-forwarding settings
    pub async fn get_auto_forwarding(&self) -> Result<Value> {
        self.request(Method::GET, "/settings/autoForwarding", &[], None)
            .await
    }

    /// Update the auto-forwarding settings
    pub async fn update_auto_forwarding(&self, settings: Value) -> Result<Value> {
        self.request(Method::PUT, "/settings/autoForwarding", &[], Some(settings))
            .await
    }

    // ==================== Delegates ====================

    /// List mailbox delegates
    pub async fn list_delegates(&self) -> Result<Value> {
        self.request(Method::GET, "/settings/delegates", &[], None)
            .await
    }

    /// Get one delegate
    pub async fn get_delegate(&self, delegate_email: &str) -> Result<Value> {
        self.request(
            Method::GET,
            &format!("/settings/delegates/{}", delegate_email),
            &[],
            None,
        )
        .await
    }

    /// Add a delegate; the delegate must accept the invitation
    pub async fn add_delegate(&self, delegate_email: &str) -> Result<Value> {
        self.request(
            Method::POST,
            "/settings/delegates",
            &[],
            Some(json!({ "delegateEmail": delegate_email })),
        )
        .await
    }

    /// Remove a delegate
    pub async fn remove_delegate(&self, delegate_email: &str) -> Result<Value> {
        self.request(
            Method::DELETE,
            &format!("/settings/delegates/{}", delegate_email),
            &[],
            None,
        )
        .await
    }

    // ==================== Forwarding addresses ====================

    /// List registered forwarding addresses
    pub async fn list_forwarding_addresses(&self) -> Result<Value> {
        self.request(Method::GET, "/settings/forwardingAddresses", &[], None)
            .await
    }

    /// Get one forwarding address
    pub async fn get_forwarding_address(&self, forwarding_email: &str) -> Result<Value> {
        self.request(
            Method::GET,
            &format!("/settings/forwardingAddresses/{}", forwarding_email),
            &[],
            None,
        )
        .await
    }

    /// Register a forwarding address; the owner must confirm it
    pub async fn create_forwarding_address(&self, forwarding_email: &str) -> Result<Value> {
        self.request(
            Method::POST,
            "/settings/forwardingAddresses",
            &[],
            Some(json!({ "forwardingEmail": forwarding_email })),
        )
        .await
    }

    /// Delete a forwarding address
    pub async fn delete_forwarding_address(&self, forwarding_email: &str) -> Result<Value> {
        self.request(
            Method::DELETE,
            &format!("/settings/forwardingAddresses/{}", forwarding_email),
            &[],
            None,
        )
        .await
    }

    // ==================== Send-as aliases ====================

    /// List send-as aliases
    pub async fn list_send_as(&self) -> Result<Value> {
        self.request(Method::GET, "/settings/sendAs", &[], None)
            .await
    }

    /// Get one send-as alias
    pub async fn get_send_as(&self, send_as_email: &str) -> Result<Value> {
        self.request(
            Method::GET,
            &format!("/settings/sendAs/{}", send_as_email),
            &[],
            None,
        )
        .await
    }

    /// Create a custom send-as alias
    pub async fn create_send_as(&self, alias: Value) -> Result<Value> {
        self.request(Method::POST, "/settings/sendAs", &[], Some(alias))
            .await
    }

    /// Replace a send-as alias
    pub async fn update_send_as(&self, send_as_email: &str, alias: Value) -> Result<Value> {
        self.request(
            Method::PUT,
            &format!("/settings/sendAs/{}", send_as_email),
            &[],
            Some(alias),
        )
        .await
    }

    /// Patch a send-as alias; only the supplied fields change
    pub async fn patch_send_as(&self, send_as_email: &str, alias: Value) -> Result<Value> {
        self.request(
            Method::PATCH,
            &format!("/settings/sendAs/{}", send_as_email),
            &[],
            Some(alias),
        )
        .await
    }

    /// Delete a send-as alias
    pub async fn delete_send_as(&self, send_as_email: &str) -> Result<Value> {
        self.request(
            Method::DELETE,
            &format!("/settings/sendAs/{}", send_as_email),
            &[],
            None,
        )
        .await
    }

    /// Send a verification email to a send-as alias
    pub async fn verify_send_as(&self, send_as_email: &str) -> Result<Value> {
        self.request(
            Method::POST,
            &format!("/settings/sendAs/{}/verify", send_as_email),
            &[],
            None,
        )
        .await
    }

    // ==================== S/MIME ====================

    /// List S/MIME configs for a send-as alias
    pub async fn list_smime_info(&self, send_as_email: &str) -> Result<Value> {
        self.request(
            Method::GET,
            &format!("/settings/sendAs/{}/smimeInfo", send_as_email),
            &[],
            None,
        )
        .await
    }

    /// Get one S/MIME config
    pub async fn get_smime_info(&self, send_as_email: &str, id: &str) -> Result<Value> {
        self.request(
            Method::GET,
            &format!("/settings/sendAs/{}/smimeInfo/{}", send_as_email, id),
            &[],
            None,
        )
        .await
    }

    /// Upload an S/MIME config for a send-as alias
    pub async fn insert_smime_info(&self, send_as_email: &str, config: Value) -> Result<Value> {
        self.request(
            Method::POST,
            &format!("/settings/sendAs/{}/smimeInfo", send_as_email),
            &[],
            Some(config),
        )
        .await
    }

    /// Mark an S/MIME config as the default for its alias
    pub async fn set_default_smime_info(&self, send_as_email: &str, id: &str) -> Result<Value> {
        self.request(
            Method::POST,
            &format!(
                "/settings/sendAs/{}/smimeInfo/{}/setDefault",
                send_as_email, id
            ),
            &[],
            None,
        )
        .await
    }

    /// Delete an S/MIME config
    pub async fn delete_smime_info(&self, send_as_email: &str, id: &str) -> Result<Value> {
        self.request(
            Method::DELETE,
            &format!("/settings/sendAs/{}/smimeInfo/{}", send_as_email, id),
            &[],
            None,
        )
        .await
    }
}

//! Gmail API client
//!
//! All endpoint calls funnel through [`GmailClient::request`], which
//! attaches the bearer token from the authenticator and maps non-2xx
//! responses to [`GmailApiError::RequestFailed`] with the response body
//! preserved verbatim. Label, filter, and settings endpoints live in
//! sibling modules as further impl blocks on this type.

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::config::gmail::{API_BASE_URL, USER_ID};
use crate::error::{GmailApiError, GmailMcpError, Result};
use crate::gmail::auth::Authenticator;
use crate::gmail::types::{
    BatchModifyRequest, CreateDraftRequest, Message, ModifyLabelsRequest, SendMessageRequest,
    Thread,
};
use crate::gmail::utils::{create_email_message, encode_raw_message, process_message, EmailParams};

/// Gmail API client
pub struct GmailClient {
    http_client: reqwest::Client,
    authenticator: Arc<Authenticator>,
}

impl GmailClient {
    /// Create a new Gmail client
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            authenticator,
        }
    }

    /// Perform one API call under the current access token.
    ///
    /// `path` is relative to the per-user root, e.g. `/messages/send`.
    /// Empty response bodies (DELETE, batch endpoints) come back as `{}`.
    pub(crate) async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value> {
        let token = self.authenticator.access_token().await?;
        let url = format!("{}/users/{}{}", API_BASE_URL, USER_ID, path);

        let mut request = self
            .http_client
            .request(method, &url)
            .bearer_auth(&token);

        if !query.is_empty() {
            request = request.query(query);
        }

        match body {
            Some(body) => request = request.json(&body),
            // Gmail rejects bodyless POSTs without an explicit length
            None => request = request.header(reqwest::header::CONTENT_LENGTH, "0"),
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GmailMcpError::Gmail(GmailApiError::RequestFailed {
                status: status.as_u16(),
                message: text,
            }));
        }

        if text.trim().is_empty() {
            Ok(json!({}))
        } else {
            Ok(serde_json::from_str(&text)?)
        }
    }

    /// Parse a response value into a typed struct
    fn parse<T: DeserializeOwned>(value: Value) -> Result<T> {
        serde_json::from_value(value).map_err(|e| {
            GmailMcpError::Gmail(GmailApiError::InvalidResponse {
                message: e.to_string(),
            })
        })
    }

    // ==================== Messages ====================

    /// Send an email
    pub async fn send_message(&self, params: EmailParams) -> Result<Value> {
        let raw = create_email_message(&params)?;
        let request = SendMessageRequest {
            raw: encode_raw_message(&raw),
            thread_id: params.thread_id.clone(),
        };
        self.request(
            Method::POST,
            "/messages/send",
            &[],
            Some(serde_json::to_value(request)?),
        )
        .await
    }

    /// Get a message, with text bodies decoded for output
    pub async fn get_message(&self, message_id: &str, include_body_html: bool) -> Result<Message> {
        let value = self
            .request(
                Method::GET,
                &format!("/messages/{}", message_id),
                &[("format", "full".to_string())],
                None,
            )
            .await?;
        let message: Message = Self::parse(value)?;
        Ok(process_message(message, include_body_html))
    }

    /// List messages matching an optional query
    pub async fn list_messages(
        &self,
        query: Option<&str>,
        max_results: Option<u32>,
        label_ids: &[String],
        page_token: Option<&str>,
    ) -> Result<Value> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(q) = query {
            params.push(("q", q.to_string()));
        }
        if let Some(max) = max_results {
            params.push(("maxResults", max.to_string()));
        }
        for label_id in label_ids {
            params.push(("labelIds", label_id.clone()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.request(Method::GET, "/messages", &params, None).await
    }

    /// Modify message labels
    pub async fn modify_message(
        &self,
        message_id: &str,
        add_label_ids: Option<Vec<String>>,
        remove_label_ids: Option<Vec<String>>,
    ) -> Result<Value> {
        let request = ModifyLabelsRequest {
            add_label_ids,
            remove_label_ids,
        };
        self.request(
            Method::POST,
            &format!("/messages/{}/modify", message_id),
            &[],
            Some(serde_json::to_value(request)?),
        )
        .await
    }

    /// Move a message to trash
    pub async fn trash_message(&self, message_id: &str) -> Result<Value> {
        self.request(
            Method::POST,
            &format!("/messages/{}/trash", message_id),
            &[],
            None,
        )
        .await
    }

    /// Remove a message from trash
    pub async fn untrash_message(&self, message_id: &str) -> Result<Value> {
        self.request(
            Method::POST,
            &format!("/messages/{}/untrash", message_id),
            &[],
            None,
        )
        .await
    }

    /// Permanently delete a message (bypasses trash)
    pub async fn delete_message(&self, message_id: &str) -> Result<Value> {
        self.request(
            Method::DELETE,
            &format!("/messages/{}", message_id),
            &[],
            None,
        )
        .await
    }

    /// Modify labels on many messages at once
    pub async fn batch_modify_messages(
        &self,
        ids: Vec<String>,
        add_label_ids: Option<Vec<String>>,
        remove_label_ids: Option<Vec<String>>,
    ) -> Result<Value> {
        let request = BatchModifyRequest {
            ids,
            add_label_ids,
            remove_label_ids,
        };
        self.request(
            Method::POST,
            "/messages/batchModify",
            &[],
            Some(serde_json::to_value(request)?),
        )
        .await
    }

    /// Permanently delete many messages at once
    pub async fn batch_delete_messages(&self, ids: Vec<String>) -> Result<Value> {
        self.request(
            Method::POST,
            "/messages/batchDelete",
            &[],
            Some(json!({ "ids": ids })),
        )
        .await
    }

    /// Download an attachment body
    pub async fn get_attachment(&self, message_id: &str, attachment_id: &str) -> Result<Value> {
        self.request(
            Method::GET,
            &format!("/messages/{}/attachments/{}", message_id, attachment_id),
            &[],
            None,
        )
        .await
    }

    // ==================== Drafts ====================

    /// Create a draft
    pub async fn create_draft(&self, params: EmailParams) -> Result<Value> {
        let raw = create_email_message(&params)?;
        let request = CreateDraftRequest {
            message: SendMessageRequest {
                raw: encode_raw_message(&raw),
                thread_id: params.thread_id.clone(),
            },
        };
        self.request(
            Method::POST,
            "/drafts",
            &[],
            Some(serde_json::to_value(request)?),
        )
        .await
    }

    /// Get a draft
    pub async fn get_draft(&self, draft_id: &str) -> Result<Value> {
        self.request(
            Method::GET,
            &format!("/drafts/{}", draft_id),
            &[("format", "full".to_string())],
            None,
        )
        .await
    }

    /// List drafts
    pub async fn list_drafts(
        &self,
        query: Option<&str>,
        max_results: Option<u32>,
        page_token: Option<&str>,
    ) -> Result<Value> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(q) = query {
            params.push(("q", q.to_string()));
        }
        if let Some(max) = max_results {
            params.push(("maxResults", max.to_string()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.request(Method::GET, "/drafts", &params, None).await
    }

    /// Send an existing draft
    pub async fn send_draft(&self, draft_id: &str) -> Result<Value> {
        self.request(
            Method::POST,
            "/drafts/send",
            &[],
            Some(json!({ "id": draft_id })),
        )
        .await
    }

    /// Delete a draft
    pub async fn delete_draft(&self, draft_id: &str) -> Result<Value> {
        self.request(Method::DELETE, &format!("/drafts/{}", draft_id), &[], None)
            .await
    }

    // ==================== Threads ====================

    /// Get a thread with all messages, text bodies decoded
    pub async fn get_thread(&self, thread_id: &str, include_body_html: bool) -> Result<Thread> {
        let value = self
            .request(
                Method::GET,
                &format!("/threads/{}", thread_id),
                &[("format", "full".to_string())],
                None,
            )
            .await?;
        let mut thread: Thread = Self::parse(value)?;
        thread.messages = thread
            .messages
            .into_iter()
            .map(|m| process_message(m, include_body_html))
            .collect();
        Ok(thread)
    }

    /// List threads matching an optional query
    pub async fn list_threads(
        &self,
        query: Option<&str>,
        max_results: Option<u32>,
        label_ids: &[String],
        page_token: Option<&str>,
    ) -> Result<Value> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(q) = query {
            params.push(("q", q.to_string()));
        }
        if let Some(max) = max_results {
            params.push(("maxResults", max.to_string()));
        }
        for label_id in label_ids {
            params.push(("labelIds", label_id.clone()));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token.to_string()));
        }
        self.request(Method::GET, "/threads", &params, None).await
    }

    /// Modify thread labels
    pub async fn modify_thread(
        &self,
        thread_id: &str,
        add_label_ids: Option<Vec<String>>,
        remove_label_ids: Option<Vec<String>>,
    ) -> Result<Value> {
        let request = ModifyLabelsRequest {
            add_label_ids,
            remove_label_ids,
        };
        self.request(
            Method::POST,
            &format!("/threads/{}/modify", thread_id),
            &[],
            Some(serde_json::to_value(request)?),
        )
        .await
    }

    /// Move a thread to trash
    pub async fn trash_thread(&self, thread_id: &str) -> Result<Value> {
        self.request(
            Method::POST,
            &format!("/threads/{}/trash", thread_id),
            &[],
            None,
        )
        .await
    }

    /// Remove a thread from trash
    pub async fn untrash_thread(&self, thread_id: &str) -> Result<Value> {
        self.request(
            Method::POST,
            &format!("/threads/{}/untrash", thread_id),
            &[],
            None,
        )
        .await
    }

    /// Permanently delete a thread
    pub async fn delete_thread(&self, thread_id: &str) -> Result<Value> {
        self.request(
            Method::DELETE,
            &format!("/threads/{}", thread_id),
            &[],
            None,
        )
        .await
    }

    // ==================== Mailbox ====================

    /// Get the user's Gmail profile
    pub async fn get_profile(&self) -> Result<Value> {
        self.request(Method::GET, "/profile", &[], None).await
    }

    /// Start pushing mailbox change notifications to a Pub/Sub topic
    pub async fn watch_mailbox(&self, request: Value) -> Result<Value> {
        self.request(Method::POST, "/watch", &[], Some(request))
            .await
    }

    /// Stop mailbox push notifications
    pub async fn stop_mail_watch(&self) -> Result<Value> {
        self.request(Method::POST, "/stop", &[], None).await
    }
}

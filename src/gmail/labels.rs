//! Label endpoints
//!
//! Label CRUD as a further impl block on [`GmailClient`].

use reqwest::Method;
use serde_json::Value;

use crate::error::Result;
use crate::gmail::client::GmailClient;
use crate::gmail::types::LabelRequest;

impl GmailClient {
    /// List all labels
    pub async fn list_labels(&self) -> Result<Value> {
        self.request(Method::GET, "/labels", &[], None).await
    }

    /// Get a label by ID
    pub async fn get_label(&self, label_id: &str) -> Result<Value> {
        self.request(Method::GET, &format!("/labels/{}", label_id), &[], None)
            .await
    }

    /// Create a label
    pub async fn create_label(&self, request: LabelRequest) -> Result<Value> {
        self.request(
            Method::POST,
            "/labels",
            &[],
            Some(serde_json::to_value(request)?),
        )
        .await
    }

    /// Replace a label's definition
    pub async fn update_label(&self, label_id: &str, request: LabelRequest) -> Result<Value> {
        self.request(
            Method::PUT,
            &format!("/labels/{}", label_id),
            &[],
            Some(serde_json::to_value(request)?),
        )
        .await
    }

    /// Patch a label; only the fields set in `request` change
    pub async fn patch_label(&self, label_id: &str, request: LabelRequest) -> Result<Value> {
        self.request(
            Method::PATCH,
            &format!("/labels/{}", label_id),
            &[],
            Some(serde_json::to_value(request)?),
        )
        .await
    }

    /// Delete a label
    pub async fn delete_label(&self, label_id: &str) -> Result<Value> {
        self.request(Method::DELETE, &format!("/labels/{}", label_id), &[], None)
            .await
    }
}

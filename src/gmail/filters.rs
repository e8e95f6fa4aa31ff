//! Filter endpoints
//!
//! Filter CRUD as a further impl block on [`GmailClient`]. Filters live
//! under the settings resource and cannot be updated in place; the API
//! only supports create and delete.

use reqwest::Method;
use serde_json::Value;

use crate::error::Result;
use crate::gmail::client::GmailClient;
use crate::gmail::types::{Filter, FilterAction, FilterCriteria};

impl GmailClient {
    /// List all filters
    pub async fn list_filters(&self) -> Result<Value> {
        self.request(Method::GET, "/settings/filters", &[], None)
            .await
    }

    /// Get a filter by ID
    pub async fn get_filter(&self, filter_id: &str) -> Result<Value> {
        self.request(
            Method::GET,
            &format!("/settings/filters/{}", filter_id),
            &[],
            None,
        )
        .await
    }

    /// Create a filter
    pub async fn create_filter(
        &self,
        criteria: FilterCriteria,
        action: FilterAction,
    ) -> Result<Value> {
        let filter = Filter {
            id: None,
            criteria,
            action,
        };
        self.request(
            Method::POST,
            "/settings/filters",
            &[],
            Some(serde_json::to_value(filter)?),
        )
        .await
    }

    /// Delete a filter
    pub async fn delete_filter(&self, filter_id: &str) -> Result<Value> {
        self.request(
            Method::DELETE,
            &format!("/settings/filters/{}", filter_id),
            &[],
            None,
        )
        .await
    }
}

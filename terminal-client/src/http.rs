//! HTTP API client
//!
//! The pull side of the pipeline: order submission plus the reconcile
//! fallback (order re-fetch, notification history) a client runs after a
//! bus disconnect, since the bus never replays missed events.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use shared::models::{Notification, Order};
use shared::request::{OrderDraft, TransitionRequest};

use crate::error::{ClientError, ClientResult};

/// HTTP client for the order server API
#[derive(Debug, Clone)]
pub struct HttpApi {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn handle<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        // Error envelope: { "code": "...", "message": "..." }
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| status.to_string());

        Err(match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Rejected(message)
            }
            _ => ClientError::Internal(message),
        })
    }

    /// Submit an order (customer)
    pub async fn create_order(&self, draft: &OrderDraft) -> ClientResult<Order> {
        let response = self
            .client
            .post(self.url("/api/orders"))
            .bearer_auth(&self.token)
            .json(draft)
            .send()
            .await?;
        Self::handle(response).await
    }

    /// List orders newest-first (operator)
    pub async fn list_orders(&self, limit: i64, offset: i64) -> ClientResult<Vec<Order>> {
        let response = self
            .client
            .get(self.url("/api/orders"))
            .query(&[("limit", limit), ("offset", offset)])
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::handle(response).await
    }

    /// Fetch one order (owner or operator)
    pub async fn get_order(&self, id: i64) -> ClientResult<Order> {
        let response = self
            .client
            .get(self.url(&format!("/api/orders/{id}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::handle(response).await
    }

    /// Transition an order (operator)
    pub async fn transition_order(&self, id: i64, request: &TransitionRequest) -> ClientResult<Order> {
        let response = self
            .client
            .post(self.url(&format!("/api/orders/{id}/status")))
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;
        Self::handle(response).await
    }

    /// List the caller's notifications newest-first (reconcile fallback)
    pub async fn list_notifications(
        &self,
        limit: i64,
        offset: i64,
    ) -> ClientResult<Vec<Notification>> {
        let response = self
            .client
            .get(self.url("/api/notifications"))
            .query(&[("limit", limit), ("offset", offset)])
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::handle(response).await
    }

    /// Mark one notification as read
    pub async fn mark_notification_read(&self, id: i64) -> ClientResult<()> {
        let response = self
            .client
            .post(self.url(&format!("/api/notifications/{id}/read")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        // Envelope body is irrelevant, only the status matters
        Self::handle::<serde_json::Value>(response).await.map(|_| ())
    }
}

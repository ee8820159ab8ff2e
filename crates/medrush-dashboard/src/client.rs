//! HTTP client for the admin dashboard API.
//!
//! Every endpoint has two forms. `try_*` returns the raw [`Result`] after
//! retries. The plain form never fails: when the dashboard stays unreachable
//! it logs the error and returns a synthesized [`DashboardResponse`] with
//! `local_only = true`, so the order flow can carry on and sync later.

use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::DashboardError;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::types::{CreateOrderRequest, DashboardResponse, EmergencyRequest, UpdateOrderStatusRequest};

const CREATE_ORDER_PATH: &str = "orders/create";
const UPDATE_STATUS_PATH: &str = "orders/update-status";
const EMERGENCY_REQUEST_PATH: &str = "emergency/request";
const EMERGENCY_ETA_PATH: &str = "emergency/eta/";

pub struct DashboardClient {
    client: Client,
    base_url: Url,
    policy: RetryPolicy,
}

impl DashboardClient {
    /// Creates a client for the dashboard at `base_url` with the default
    /// [`RetryPolicy`].
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`DashboardError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, DashboardError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Trailing slash so relative joins append to the API prefix.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| DashboardError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url: parsed,
            policy: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// `POST /orders/create`.
    ///
    /// # Errors
    ///
    /// The last error once retries are exhausted, or the first non-retriable one.
    pub async fn try_create_order(
        &self,
        order: &CreateOrderRequest,
    ) -> Result<DashboardResponse, DashboardError> {
        self.post_json(CREATE_ORDER_PATH, order).await
    }

    pub async fn create_order(&self, order: &CreateOrderRequest) -> DashboardResponse {
        let result = self.try_create_order(order).await;
        degrade(result, "create_order", || {
            json!({ "orderId": order.order_id, "status": "pending" })
        })
    }

    /// `POST /orders/update-status`.
    ///
    /// # Errors
    ///
    /// The last error once retries are exhausted, or the first non-retriable one.
    pub async fn try_update_order_status(
        &self,
        update: &UpdateOrderStatusRequest,
    ) -> Result<DashboardResponse, DashboardError> {
        self.post_json(UPDATE_STATUS_PATH, update).await
    }

    pub async fn update_order_status(&self, update: &UpdateOrderStatusRequest) -> DashboardResponse {
        let result = self.try_update_order_status(update).await;
        degrade(result, "update_order_status", || {
            json!({ "orderId": update.order_id, "status": update.status })
        })
    }

    /// `POST /emergency/request`.
    ///
    /// # Errors
    ///
    /// The last error once retries are exhausted, or the first non-retriable one.
    pub async fn try_request_emergency(
        &self,
        request: &EmergencyRequest,
    ) -> Result<DashboardResponse, DashboardError> {
        self.post_json(EMERGENCY_REQUEST_PATH, request).await
    }

    pub async fn request_emergency(&self, request: &EmergencyRequest) -> DashboardResponse {
        let result = self.try_request_emergency(request).await;
        degrade(result, "request_emergency", || {
            json!({ "requestId": request.request_id })
        })
    }

    /// `GET /emergency/eta/:id`.
    ///
    /// # Errors
    ///
    /// The last error once retries are exhausted, or the first non-retriable one.
    pub async fn try_emergency_eta(&self, request_id: &str) -> Result<DashboardResponse, DashboardError> {
        let url = self.eta_url(request_id)?;
        retry_with_backoff(&self.policy, || self.send(Method::GET, url.clone(), None)).await
    }

    /// Without a dashboard there is no ETA; the synthesized response carries
    /// `etaMinutes: null`.
    pub async fn emergency_eta(&self, request_id: &str) -> DashboardResponse {
        let result = self.try_emergency_eta(request_id).await;
        degrade(result, "emergency_eta", || {
            json!({ "requestId": request_id, "etaMinutes": null })
        })
    }

    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<DashboardResponse, DashboardError> {
        let url = self.endpoint(path)?;
        let body = serde_json::to_value(body).map_err(|e| DashboardError::Deserialize {
            context: format!("encode {path}"),
            source: e,
        })?;
        retry_with_backoff(&self.policy, || self.send(Method::POST, url.clone(), Some(&body))).await
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<DashboardResponse, DashboardError> {
        let path = url.path().to_owned();
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(DashboardError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(DashboardResponse {
                success: true,
                message: None,
                data: None,
                local_only: false,
            });
        }
        serde_json::from_str(&text).map_err(|e| DashboardError::Deserialize {
            context: path,
            source: e,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, DashboardError> {
        self.base_url
            .join(path)
            .map_err(|e| DashboardError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    fn eta_url(&self, request_id: &str) -> Result<Url, DashboardError> {
        let mut url = self.endpoint(EMERGENCY_ETA_PATH)?;
        // Push as a segment so the id is percent-encoded rather than parsed.
        url.path_segments_mut()
            .map_err(|()| DashboardError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "base URL cannot have path segments".to_owned(),
            })?
            .pop_if_empty()
            .push(request_id);
        Ok(url)
    }
}

fn degrade(
    result: Result<DashboardResponse, DashboardError>,
    operation: &'static str,
    local_data: impl FnOnce() -> Value,
) -> DashboardResponse {
    match result {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(operation, error = %e, "dashboard unreachable, continuing with local result");
            DashboardResponse::local(
                "Dashboard unreachable; the caller should keep this locally and sync later.",
                Some(local_data()),
            )
        }
    }
}

//! Authenticated request dispatcher and typed resource client.
//!
//! Every request goes through [`ApiClient::request`]: obtain a valid token
//! from the session (refreshing proactively when expired), attach the bearer
//! header, and translate failures into [`ApiError`]. A 401 from any endpoint
//! invalidates the session exactly once.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::Session;
use crate::models::{
    Agent, AnalyticsOverview, Call, Campaign, CreateAgentRequest, CreateBatchCallRequest,
    CreateLeadRequest, CreatePhoneCallRequest, DayBucket, Lead, Settings, UpdateAgentRequest,
    UpdateLeadRequest, UpdateSettingsRequest,
};

use super::ApiError;

/// API client for the dashboard backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<Session>,
}

impl ApiClient {
    /// Create a client sharing the session's connection pool.
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            client: session.http().clone(),
            base_url: session.base_url().to_string(),
            session,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Send one authenticated request and translate the response status.
    /// Returns the raw response for the caller to parse.
    async fn dispatch<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        headers: Option<HeaderMap>,
    ) -> Result<Response, ApiError> {
        // Proactive expiry check: refresh happens here, not on a 401 retry
        let token = self
            .session
            .get_valid_token()
            .await
            .ok_or(ApiError::NoToken)?;

        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), &url).bearer_auth(&token);
        if let Some(body) = body {
            request = request.json(body);
        }
        // Caller-supplied headers are applied last and win over defaults
        if let Some(headers) = headers {
            request = request.headers(headers);
        }

        debug!(method = %method, path, "Dispatching API request");
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(path, "Backend rejected token, ending session");
            self.session.invalidate().await;
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }
        Ok(response)
    }

    /// Dispatch and parse the JSON response body.
    pub async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        self.request_with_headers(method, path, body, HeaderMap::new())
            .await
    }

    /// Dispatch with extra headers merged after the defaults, so a caller
    /// can override anything but still rides the authenticated path.
    pub async fn request_with_headers<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        headers: HeaderMap,
    ) -> Result<T, ApiError> {
        let headers = if headers.is_empty() {
            None
        } else {
            Some(headers)
        };
        let response = self.dispatch(method, path, body, headers).await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("response from {}: {}", path, e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(Method::PUT, path, Some(body)).await
    }

    /// DELETE, discarding whatever acknowledgement body the backend returns.
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.dispatch(Method::DELETE, path, None::<&()>, None).await?;
        Ok(())
    }

    // ===== Agents =====

    pub async fn list_agents(&self) -> Result<Vec<Agent>, ApiError> {
        self.get("/api/agents").await
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent, ApiError> {
        self.get(&format!("/api/agents/{}", agent_id)).await
    }

    pub async fn create_agent(&self, request: &CreateAgentRequest) -> Result<Agent, ApiError> {
        self.post("/api/agents", request).await
    }

    pub async fn update_agent(
        &self,
        agent_id: &str,
        request: &UpdateAgentRequest,
    ) -> Result<Agent, ApiError> {
        self.put(&format!("/api/agents/{}", agent_id), request).await
    }

    pub async fn delete_agent(&self, agent_id: &str) -> Result<(), ApiError> {
        self.delete(&format!("/api/agents/{}", agent_id)).await
    }

    // ===== Leads =====

    pub async fn list_leads(&self) -> Result<Vec<Lead>, ApiError> {
        self.get("/api/leads").await
    }

    pub async fn get_lead(&self, lead_id: i64) -> Result<Lead, ApiError> {
        self.get(&format!("/api/leads/{}", lead_id)).await
    }

    pub async fn create_lead(&self, request: &CreateLeadRequest) -> Result<Lead, ApiError> {
        self.post("/api/leads", request).await
    }

    pub async fn update_lead(
        &self,
        lead_id: i64,
        request: &UpdateLeadRequest,
    ) -> Result<Lead, ApiError> {
        self.put(&format!("/api/leads/{}", lead_id), request).await
    }

    pub async fn delete_lead(&self, lead_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/api/leads/{}", lead_id)).await
    }

    // ===== Calls =====

    /// List calls, optionally filtered to one agent.
    pub async fn list_calls(&self, agent_id: Option<&str>) -> Result<Vec<Call>, ApiError> {
        let path = match agent_id {
            Some(agent_id) => {
                let encoded: String =
                    url::form_urlencoded::byte_serialize(agent_id.as_bytes()).collect();
                format!("/api/calls?agent_id={}", encoded)
            }
            None => "/api/calls".to_string(),
        };
        self.get(&path).await
    }

    pub async fn get_call(&self, call_id: &str) -> Result<Call, ApiError> {
        self.get(&format!("/api/calls/{}", call_id)).await
    }

    pub async fn create_phone_call(
        &self,
        request: &CreatePhoneCallRequest,
    ) -> Result<Call, ApiError> {
        self.post("/api/calls", request).await
    }

    // ===== Batch campaigns =====

    pub async fn list_batch_calls(&self) -> Result<Vec<Campaign>, ApiError> {
        self.get("/api/outbound-calls").await
    }

    pub async fn get_batch_call(&self, campaign_id: i64) -> Result<Campaign, ApiError> {
        self.get(&format!("/api/outbound-calls/{}", campaign_id)).await
    }

    pub async fn create_batch_call(
        &self,
        request: &CreateBatchCallRequest,
    ) -> Result<Campaign, ApiError> {
        self.post("/api/outbound-calls/batch", request).await
    }

    // ===== Analytics =====

    pub async fn analytics_overview(&self) -> Result<AnalyticsOverview, ApiError> {
        self.get("/api/analytics/overview").await
    }

    /// Per-day call volume over the trailing window.
    pub async fn call_volume(&self, days: u32) -> Result<Vec<DayBucket>, ApiError> {
        self.get(&format!("/api/analytics/calls?days={}", days)).await
    }

    // ===== Settings =====

    pub async fn get_settings(&self) -> Result<Settings, ApiError> {
        self.get("/api/settings").await
    }

    pub async fn update_settings(
        &self,
        request: &UpdateSettingsRequest,
    ) -> Result<Settings, ApiError> {
        self.put("/api/settings", request).await
    }
}

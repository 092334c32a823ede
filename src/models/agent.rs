// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// A configured phone agent. Field names are snake_case as passed through
/// from the upstream voice-agent API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: String,
    pub agent_name: Option<String>,
    pub voice_id: String,
    pub language: Option<String>,
    pub prompt: Option<String>,
    pub webhook_url: Option<String>,
    pub last_modification_timestamp: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAgentRequest {
    pub agent_name: String,
    pub voice_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub prompt: String,
}

/// Partial update; absent fields are left unchanged by the backend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateAgentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// A completed or in-progress call, snake_case as passed through from the
/// upstream voice-agent API. Most fields are optional: in-progress calls have
/// no end timestamp, analysis, or cost yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    pub call_id: String,
    pub agent_id: Option<String>,
    pub direction: Option<CallDirection>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub call_status: Option<String>,
    pub start_timestamp: Option<i64>,
    pub end_timestamp: Option<i64>,
    pub duration_ms: Option<i64>,
    pub transcript: Option<String>,
    pub recording_url: Option<String>,
    pub disconnection_reason: Option<String>,
    pub call_analysis: Option<CallAnalysis>,
    pub call_cost: Option<CallCost>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    Inbound,
    Outbound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallAnalysis {
    pub user_sentiment: Option<String>,
    pub call_successful: Option<bool>,
    pub call_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallCost {
    pub combined_cost: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePhoneCallRequest {
    pub from_number: String,
    pub to_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

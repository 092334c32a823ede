use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A batch outbound-call campaign (camelCase, dashboard-owned).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub agent_id: String,
    pub from_number: String,
    #[serde(default)]
    pub status: CampaignStatus,
    #[serde(default)]
    pub total_calls: i64,
    #[serde(default)]
    pub completed_calls: i64,
    #[serde(default)]
    pub failed_calls: i64,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Launch a campaign calling the given leads through one agent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchCallRequest {
    pub name: String,
    pub agent_id: String,
    pub from_number: String,
    pub lead_ids: Vec<i64>,
}

// Allow dead code: API response structs have fields for completeness
#![allow(dead_code)]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregate call statistics computed by the backend (camelCase). The client
/// only consumes these; bucketing and reduction happen server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsOverview {
    pub total_calls: i64,
    pub total_duration_ms: i64,
    pub average_latency_ms: Option<f64>,
    pub total_cost: Option<f64>,
    pub success_rate: Option<f64>,
    #[serde(default)]
    pub sentiment: SentimentBreakdown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    #[serde(default)]
    pub positive: i64,
    #[serde(default)]
    pub neutral: i64,
    #[serde(default)]
    pub negative: i64,
}

/// One day of call volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayBucket {
    pub date: NaiveDate,
    pub calls: i64,
    #[serde(default)]
    pub total_duration_ms: i64,
}

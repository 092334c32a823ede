use serde::{Deserialize, Serialize};

/// Dashboard settings as exposed to clients. The upstream voice API key is
/// write-only; the backend reports only whether one is configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub voice_api_key_set: bool,
    pub webhook_url: Option<String>,
    pub default_agent_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_agent_id: Option<String>,
}

//! Data models for the dashboard API.
//!
//! Wire-shape convention: records owned by the dashboard backend (users,
//! leads, campaigns, analytics, settings) are camelCase JSON; agents and
//! calls are snake_case, passed through from the upstream voice-agent API.

pub mod agent;
pub mod analytics;
pub mod call;
pub mod campaign;
pub mod lead;
pub mod settings;
pub mod user;

pub use agent::{Agent, CreateAgentRequest, UpdateAgentRequest};
pub use analytics::{AnalyticsOverview, DayBucket, SentimentBreakdown};
pub use call::{Call, CallAnalysis, CallCost, CallDirection, CreatePhoneCallRequest};
pub use campaign::{Campaign, CampaignStatus, CreateBatchCallRequest};
pub use lead::{CreateLeadRequest, Lead, LeadStatus, UpdateLeadRequest};
pub use settings::{Settings, UpdateSettingsRequest};
pub use user::{AuthUser, RegisterRequest, UserRole};

//! Dialdesk - client library for an AI phone agent dashboard backend.
//!
//! The crate centers on the authenticated session lifecycle: credentials are
//! persisted with a locally computed expiry, expired tokens are exchanged
//! through a single-flight refresh, and every API call goes through one
//! dispatcher with uniform error translation. On top of that sits a typed
//! client for the backend's agent, lead, call, campaign, analytics, and
//! settings endpoints.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dialdesk::{ApiClient, Config, CredentialStore, Session};
//! use dialdesk::auth::FileStorage;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let storage = FileStorage::open(&Config::data_dir()?)?;
//! let session = Arc::new(Session::with_config(&config, CredentialStore::new(Box::new(storage)))?);
//!
//! session.login("a@b.com", "secret").await?;
//! let client = ApiClient::new(session);
//! let _agents = client.list_agents().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{CredentialStore, Session};
pub use config::Config;

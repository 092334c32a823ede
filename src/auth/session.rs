//! Session lifecycle and token refresh coordination.
//!
//! `Session` owns the credential store and the HTTP client used for auth
//! exchanges. Refresh is single-flight: the store's write lock is held across
//! the whole refresh exchange, so concurrent callers that find an expired
//! token queue behind one network call and all observe its outcome.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::config::Config;
use crate::models::{AuthUser, RegisterRequest};

use super::credentials::CredentialStore;

/// HTTP request timeout in seconds.
/// Also bounds how long callers can queue behind an in-flight refresh.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Callback run when the session ends, whether by explicit logout or by the
/// backend rejecting the token. UI layers use this to return to the login
/// entry point.
pub type SessionEndedHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    token: String,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Extract the backend-provided failure message, falling back to a default.
fn failure_message(body: &str, default: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| default.to_string())
}

/// Authenticated session against the dashboard backend.
pub struct Session {
    http: Client,
    base_url: String,
    store: RwLock<CredentialStore>,
    session_ended: Mutex<Option<SessionEndedHook>>,
}

impl Session {
    /// Create a session against the given backend base URL.
    pub fn new(base_url: impl Into<String>, store: CredentialStore) -> Result<Self> {
        Self::with_timeout(base_url, store, REQUEST_TIMEOUT_SECS)
    }

    /// Create a session honoring a loaded [`Config`].
    pub fn with_config(config: &Config, store: CredentialStore) -> Result<Self> {
        Self::with_timeout(&config.base_url, store, config.request_timeout_secs)
    }

    fn with_timeout(
        base_url: impl Into<String>,
        store: CredentialStore,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store: RwLock::new(store),
            session_ended: Mutex::new(None),
        })
    }

    /// Register a callback for session teardown (logout or 401 rejection).
    pub fn set_session_ended_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
        if let Ok(mut guard) = self.session_ended.lock() {
            *guard = Some(Arc::new(hook));
        }
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a token is stored and still inside its validity window.
    pub async fn is_authenticated(&self) -> bool {
        self.store.read().await.is_authenticated()
    }

    /// The stored safe user, if logged in.
    pub async fn current_user(&self) -> Option<AuthUser> {
        self.store.read().await.user()
    }

    /// Authenticate with email and password, storing the returned credential.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthUser, ApiError> {
        let url = format!("{}/api/auth/login", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                message: failure_message(&body, "Login failed"),
            });
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("login response: {}", e)))?;

        let mut store = self.store.write().await;
        store
            .set_credential(&auth.token, &auth.user)
            .map_err(ApiError::Storage)?;
        debug!(user = %auth.user.username, "Logged in");
        Ok(auth.user)
    }

    /// Create an account and store the returned credential.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthUser, ApiError> {
        let url = format!("{}/api/auth/register", self.base_url);
        let response = self.http.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::RequestFailed {
                status: status.as_u16(),
                message: failure_message(&body, "Registration failed"),
            });
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("register response: {}", e)))?;

        let mut store = self.store.write().await;
        store
            .set_credential(&auth.token, &auth.user)
            .map_err(ApiError::Storage)?;
        debug!(user = %auth.user.username, "Registered");
        Ok(auth.user)
    }

    /// Fetch the current user from the backend and refresh the stored record.
    pub async fn me(&self) -> Result<AuthUser, ApiError> {
        let token = self.get_valid_token().await.ok_or(ApiError::NoToken)?;
        let url = format!("{}/api/auth/me", self.base_url);
        let response = self.http.get(&url).bearer_auth(&token).send().await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.invalidate().await;
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let me: MeResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("me response: {}", e)))?;

        let mut store = self.store.write().await;
        store.update_user(&me.user).map_err(ApiError::Storage)?;
        Ok(me.user)
    }

    /// Return a token that is valid right now, or `None` when logged out.
    ///
    /// An expired-but-present token is exchanged for a fresh one. Exactly one
    /// refresh network call is issued per expiry event no matter how many
    /// callers arrive during the window; a failed refresh clears the store,
    /// so every waiter sees the same logged-out outcome.
    pub async fn get_valid_token(&self) -> Option<String> {
        {
            let store = self.store.read().await;
            match store.token() {
                None => return None,
                Some(token) if !store.is_expired() => return Some(token),
                Some(_) => {}
            }
        }

        // Expired: serialize the exchange behind the write lock.
        let mut store = self.store.write().await;

        // A refresh in flight while we waited has already replaced or
        // cleared the credential.
        let old_token = match store.token() {
            None => return None,
            Some(token) if !store.is_expired() => return Some(token),
            Some(token) => token,
        };

        debug!("Stored token expired, refreshing");
        match self.refresh(&old_token).await {
            Ok(new_token) => {
                // The refresh response carries no user; the stored one is
                // reused. A missing user breaks the pairing invariant and is
                // treated as a failed refresh.
                let user = store.user();
                let persisted = match user {
                    Some(user) => store.set_credential(&new_token, &user).is_ok(),
                    None => false,
                };
                if persisted {
                    Some(new_token)
                } else {
                    warn!("Could not persist refreshed credential, clearing session");
                    if let Err(e) = store.clear() {
                        warn!(error = %e, "Failed to clear credential store");
                    }
                    None
                }
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                if let Err(e) = store.clear() {
                    warn!(error = %e, "Failed to clear credential store");
                }
                None
            }
        }
    }

    /// Exchange the old token for a new one. The expired-but-still-signed old
    /// token authorizes its own replacement; that is what the soft expiry
    /// buffer is for.
    async fn refresh(&self, old_token: &str) -> Result<String, ApiError> {
        let url = format!("{}/api/auth/refresh", self.base_url);
        let response = self.http.post(&url).bearer_auth(old_token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("refresh response: {}", e)))?;
        Ok(refreshed.token)
    }

    /// End the session. Notifies the backend best-effort (client-side token
    /// disposal is authoritative), clears the store, and runs the
    /// session-ended hook. Safe to call when already logged out.
    pub async fn logout(&self) {
        let token = self.store.read().await.token();
        if let Some(token) = token {
            let url = format!("{}/api/auth/logout", self.base_url);
            if let Err(e) = self.http.post(&url).bearer_auth(&token).send().await {
                debug!(error = %e, "Logout request failed, discarding token anyway");
            }
        }
        self.invalidate().await;
    }

    #[cfg(test)]
    pub(crate) async fn seed_credentials_for_tests(&self, token: &str, user: &AuthUser) {
        self.store
            .write()
            .await
            .set_credential(token, user)
            .unwrap();
    }

    /// Clear the credential and run the session-ended hook. Used by the
    /// dispatcher when the backend rejects the token with 401.
    pub(crate) async fn invalidate(&self) {
        {
            let mut store = self.store.write().await;
            if let Err(e) = store.clear() {
                warn!(error = %e, "Failed to clear credential store");
            }
        }
        // The hook runs with the lock released so a panicking hook cannot
        // poison the slot and wedge later registrations.
        let hook = self
            .session_ended
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().cloned());
        if let Some(hook) = hook {
            hook();
        }
    }
}

//! Credential store: the persisted authentication state for one session.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use tracing::warn;

use crate::models::AuthUser;

use super::storage::{MemoryStorage, Storage};

/// Storage key for the bearer token
const TOKEN_KEY: &str = "auth_token";

/// Storage key for the JSON-serialized safe user record
const USER_KEY: &str = "auth_user";

/// Storage key for the epoch-millisecond expiry instant
const EXPIRY_KEY: &str = "auth_token_expiry";

/// Backend tokens are valid for 48 hours from issue.
const TOKEN_LIFETIME_HOURS: i64 = 48;

/// Soft expiry buffer before the backend's actual expiry (5 minutes).
/// Treating the token as expired this early keeps it cryptographically valid
/// long enough to authorize its own replacement during refresh.
const EXPIRY_BUFFER_MINUTES: i64 = 5;

/// Persisted authentication state: bearer token, safe user, and the locally
/// computed expiry instant. Token and user are always set and cleared as a
/// pair. The token is opaque to this layer; expiry is derived at store time,
/// never read from the token itself.
pub struct CredentialStore {
    storage: Box<dyn Storage>,
}

impl CredentialStore {
    pub fn new(storage: Box<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Ephemeral store for tests or sessions that should not outlive the
    /// process.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// The stored bearer token, if any. Presence alone does not imply
    /// validity; see [`CredentialStore::is_authenticated`].
    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY)
    }

    /// The stored safe user record, if any. An unparsable record reads as
    /// absent.
    pub fn user(&self) -> Option<AuthUser> {
        let raw = self.storage.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Stored user record is unparsable");
                None
            }
        }
    }

    /// The stored expiry instant, if any.
    pub fn expiry(&self) -> Option<DateTime<Utc>> {
        let raw = self.storage.get(EXPIRY_KEY)?;
        let millis: i64 = raw.parse().ok()?;
        Utc.timestamp_millis_opt(millis).single()
    }

    /// Persist a token/user pair issued now, computing expiry by the
    /// 48h-minus-5min rule.
    pub fn set_credential(&mut self, token: &str, user: &AuthUser) -> Result<()> {
        self.set_credential_at(token, user, Utc::now())
    }

    /// Persist a token/user pair with an explicit issue time. The three keys
    /// go through a single [`Storage::set_all`] write, so a failure leaves the
    /// previous pair intact rather than a half-updated one.
    pub(crate) fn set_credential_at(
        &mut self,
        token: &str,
        user: &AuthUser,
        issued_at: DateTime<Utc>,
    ) -> Result<()> {
        let user_json =
            serde_json::to_string(user).context("Failed to serialize user record")?;
        let expiry = issued_at + Duration::hours(TOKEN_LIFETIME_HOURS)
            - Duration::minutes(EXPIRY_BUFFER_MINUTES);
        let expiry_millis = expiry.timestamp_millis().to_string();

        self.storage.set_all(&[
            (USER_KEY, user_json.as_str()),
            (EXPIRY_KEY, expiry_millis.as_str()),
            (TOKEN_KEY, token),
        ])
    }

    /// Replace the stored user while keeping the current token and expiry.
    /// No-op when no token is stored, preserving the token/user pairing.
    pub fn update_user(&mut self, user: &AuthUser) -> Result<()> {
        if self.token().is_none() {
            return Ok(());
        }
        let user_json =
            serde_json::to_string(user).context("Failed to serialize user record")?;
        self.storage.set(USER_KEY, &user_json)
    }

    /// Remove token, user, and expiry. Idempotent.
    pub fn clear(&mut self) -> Result<()> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)?;
        self.storage.remove(EXPIRY_KEY)?;
        Ok(())
    }

    /// True iff a token is stored and its soft expiry has not passed.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some() && !self.is_expired()
    }

    /// True iff no expiry is stored, or the expiry instant has passed.
    pub fn is_expired(&self) -> bool {
        match self.expiry() {
            Some(expiry) => Utc::now() >= expiry,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> AuthUser {
        AuthUser {
            id: 1,
            username: "alice".to_string(),
            email: "a@b.com".to_string(),
            display_name: Some("Alice".to_string()),
            role: Default::default(),
        }
    }

    #[test]
    fn test_expiry_computed_from_issue_time() {
        let mut store = CredentialStore::in_memory();
        let issued = Utc::now();
        store.set_credential_at("t1", &test_user(), issued).unwrap();

        let expected = issued + Duration::hours(48) - Duration::minutes(5);
        // Millisecond storage truncates sub-millisecond precision
        assert_eq!(
            store.expiry().unwrap().timestamp_millis(),
            expected.timestamp_millis()
        );
        assert!(!store.is_expired());
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_expired_once_window_passes() {
        let mut store = CredentialStore::in_memory();

        // Issued just inside the 48h - 5min window: still valid
        let issued = Utc::now() - Duration::hours(48) + Duration::minutes(6);
        store.set_credential_at("t1", &test_user(), issued).unwrap();
        assert!(!store.is_expired());

        // Issued just past the window: expired, but the token is still present
        let issued = Utc::now() - Duration::hours(48) + Duration::minutes(4);
        store.set_credential_at("t1", &test_user(), issued).unwrap();
        assert!(store.is_expired());
        assert!(!store.is_authenticated());
        assert_eq!(store.token().as_deref(), Some("t1"));
    }

    #[test]
    fn test_empty_store_reads_as_logged_out() {
        let store = CredentialStore::in_memory();
        assert_eq!(store.token(), None);
        assert!(store.user().is_none());
        assert!(store.expiry().is_none());
        assert!(store.is_expired());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_token_and_user_set_and_cleared_together() {
        let mut store = CredentialStore::in_memory();
        store.set_credential("t1", &test_user()).unwrap();
        assert!(store.token().is_some());
        assert!(store.user().is_some());

        store.clear().unwrap();
        assert!(store.token().is_none());
        assert!(store.user().is_none());
        assert!(store.expiry().is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut store = CredentialStore::in_memory();
        store.clear().unwrap();
        store.set_credential("t1", &test_user()).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_set_credential_overwrites_previous_pair() {
        let mut store = CredentialStore::in_memory();
        store.set_credential("t1", &test_user()).unwrap();

        let other = AuthUser {
            id: 2,
            username: "bob".to_string(),
            email: "bob@b.com".to_string(),
            display_name: None,
            role: Default::default(),
        };
        store.set_credential("t2", &other).unwrap();

        assert_eq!(store.token().as_deref(), Some("t2"));
        assert_eq!(store.user().unwrap().username, "bob");
    }

    /// Storage that rejects single-key writes, so any path that bypasses
    /// `set_all` fails loudly.
    struct AtomicOnlyStorage {
        inner: MemoryStorage,
    }

    impl Storage for AtomicOnlyStorage {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            anyhow::bail!("single-key write on credential storage")
        }

        fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<()> {
            self.inner.set_all(entries)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_set_credential_writes_all_keys_as_one_unit() {
        let mut store = CredentialStore::new(Box::new(AtomicOnlyStorage {
            inner: MemoryStorage::new(),
        }));
        store.set_credential("t1", &test_user()).unwrap();

        assert_eq!(store.token().as_deref(), Some("t1"));
        assert_eq!(store.user().unwrap().username, "alice");
        assert!(store.expiry().is_some());
    }

    #[test]
    fn test_update_user_without_token_is_noop() {
        let mut store = CredentialStore::in_memory();
        store.update_user(&test_user()).unwrap();
        assert!(store.user().is_none());
    }
}

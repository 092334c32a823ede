//! Durable key-value storage backing the credential store.
//!
//! Storage is injected into `CredentialStore` rather than accessed as a
//! process-wide singleton, so tests can run against an in-memory map while
//! applications persist credentials across restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// File name for persisted credentials inside the data directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Key-value persistence for session credentials.
///
/// All keys and values are strings; structured values (the safe user record)
/// are JSON-serialized by the caller.
pub trait Storage: Send + Sync {
    /// Read a value, or `None` if the key was never set.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, overwriting any previous one.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Write several keys as one unit. File-backed storage persists once,
    /// so a failure cannot leave some of the keys updated and others stale.
    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// JSON-file-backed storage, written through on every mutation.
pub struct FileStorage {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStorage {
    /// Open (or create) storage under the given directory.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(CREDENTIALS_FILE);
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read credentials file")?;
            serde_json::from_str(&contents)
                .context("Failed to parse credentials file")?
        } else {
            HashMap::new()
        };
        Ok(Self { path, entries })
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, contents)
            .context("Failed to write credentials file")?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), (*value).to_string());
        }
        self.persist()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_all(&mut self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get("auth_token"), None);

        storage.set("auth_token", "t1").unwrap();
        assert_eq!(storage.get("auth_token").as_deref(), Some("t1"));

        storage.set("auth_token", "t2").unwrap();
        assert_eq!(storage.get("auth_token").as_deref(), Some("t2"));

        storage.remove("auth_token").unwrap();
        assert_eq!(storage.get("auth_token"), None);

        // Removing an absent key is fine
        storage.remove("auth_token").unwrap();
    }

    #[test]
    fn test_file_storage_persists_across_reopen() {
        let dir = std::env::temp_dir().join(format!(
            "dialdesk-storage-test-{}",
            std::process::id()
        ));

        {
            let mut storage = FileStorage::open(&dir).unwrap();
            storage.set("auth_token", "t1").unwrap();
            storage.set("auth_user", r#"{"id":1}"#).unwrap();
        }

        {
            let mut storage = FileStorage::open(&dir).unwrap();
            assert_eq!(storage.get("auth_token").as_deref(), Some("t1"));
            assert_eq!(storage.get("auth_user").as_deref(), Some(r#"{"id":1}"#));

            storage.remove("auth_token").unwrap();
        }

        let storage = FileStorage::open(&dir).unwrap();
        assert_eq!(storage.get("auth_token"), None);
        assert_eq!(storage.get("auth_user").as_deref(), Some(r#"{"id":1}"#));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_storage_set_all_persists_every_key() {
        let dir = std::env::temp_dir().join(format!(
            "dialdesk-storage-batch-test-{}",
            std::process::id()
        ));

        {
            let mut storage = FileStorage::open(&dir).unwrap();
            storage
                .set_all(&[
                    ("auth_token", "t1"),
                    ("auth_user", r#"{"id":1}"#),
                    ("auth_token_expiry", "1700000000000"),
                ])
                .unwrap();
        }

        let storage = FileStorage::open(&dir).unwrap();
        assert_eq!(storage.get("auth_token").as_deref(), Some("t1"));
        assert_eq!(storage.get("auth_user").as_deref(), Some(r#"{"id":1}"#));
        assert_eq!(
            storage.get("auth_token_expiry").as_deref(),
            Some("1700000000000")
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}

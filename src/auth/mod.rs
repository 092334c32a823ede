//! Authentication: credential persistence and session lifecycle.
//!
//! This module provides:
//! - `Storage`: injectable key-value persistence (file-backed or in-memory)
//! - `CredentialStore`: token, safe user, and expiry, stored as a unit
//! - `Session`: login/register/logout plus single-flight token refresh
//!
//! Tokens expire 48 hours after issue; a 5-minute soft buffer lets the old
//! token authorize its own refresh before the backend rejects it.

pub mod credentials;
pub mod session;
pub mod storage;

pub use credentials::CredentialStore;
pub use session::{Session, SessionEndedHook};
pub use storage::{FileStorage, MemoryStorage, Storage};

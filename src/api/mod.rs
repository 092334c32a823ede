//! HTTP client layer for the dashboard backend.
//!
//! `ApiClient` dispatches authenticated JSON requests through a `Session`
//! and exposes typed wrappers for each resource. All failures are translated
//! into the `ApiError` taxonomy; only authentication-fatal ones clear the
//! session.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;

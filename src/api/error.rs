use thiserror::Error;

/// Errors surfaced by the dispatcher and session operations.
///
/// Authentication-fatal variants (`NoToken`, `Unauthorized`) mean the session
/// has already been cleared; everything else leaves the session intact so a
/// validation error does not log the user out.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No authentication token - not logged in")]
    NoToken,

    #[error("Authentication rejected - session has been cleared")]
    Unauthorized,

    #[error("Request failed with status {status}: {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential storage error: {0}")]
    Storage(anyhow::Error),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid carrying excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!(
                "{}... (truncated, {} total bytes)",
                &body[..end],
                body.len()
            )
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            _ => ApiError::RequestFailed {
                status: status.as_u16(),
                message: Self::truncate_body(body),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_maps_401_to_unauthorized() {
        let err = ApiError::from_status(reqwest::StatusCode::UNAUTHORIZED, "nope");
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[test]
    fn test_from_status_carries_status_and_body() {
        let err = ApiError::from_status(reqwest::StatusCode::UNPROCESSABLE_ENTITY, "bad phone");
        match err {
            ApiError::RequestFailed { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "bad phone");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(2000);
        let err = ApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, &body);
        match err {
            ApiError::RequestFailed { message, .. } => {
                assert!(message.contains("truncated, 2000 total bytes"));
                assert!(message.len() < 600);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

//! Error types for the site API client.
//!
//! # Design
//! `Unauthenticated` is raised locally, before any request is built, when an
//! admin-only operation runs without a stored token. `Unauthorized` and
//! `NotFound` get dedicated variants because callers branch on them; every
//! other non-2xx response lands in `Http` with the status, the server-provided
//! `message` (when the body carries one) and the raw body.

use thiserror::Error;

/// Errors returned by `Transport` and `SiteClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An auth-required operation was invoked with no token in the session.
    /// No network request was made.
    #[error("not authenticated: log in before calling this operation")]
    Unauthenticated,

    /// The server returned 401. The session token has already been cleared.
    #[error("unauthorized: {}", .message.as_deref().unwrap_or("session expired"))]
    Unauthorized { message: Option<String> },

    /// The server returned 404.
    #[error("resource not found: {}", .message.as_deref().unwrap_or("no message"))]
    NotFound { message: Option<String> },

    /// The server returned a non-2xx status other than 401 and 404.
    #[error("HTTP {status}: {}", .message.as_deref().unwrap_or(.body))]
    Http {
        status: u16,
        message: Option<String>,
        body: String,
    },

    /// Connection failure, timeout or other transport-level problem.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// An upload part could not be turned into a multipart part.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
}

impl ApiError {
    /// HTTP status carried by server-side failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::NotFound { .. } => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message the server attached to the failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { message }
            | ApiError::NotFound { message }
            | ApiError::Http { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_reported_for_server_failures_only() {
        assert_eq!(ApiError::Unauthorized { message: None }.status(), Some(401));
        assert_eq!(ApiError::NotFound { message: None }.status(), Some(404));
        let err = ApiError::Http {
            status: 422,
            message: Some("title is required".to_string()),
            body: String::new(),
        };
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.server_message(), Some("title is required"));
        assert_eq!(ApiError::Unauthenticated.status(), None);
        assert_eq!(ApiError::Transport("refused".to_string()).status(), None);
    }

    #[test]
    fn display_prefers_server_message_over_body() {
        let err = ApiError::Http {
            status: 500,
            message: Some("database offline".to_string()),
            body: r#"{"message":"database offline"}"#.to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: database offline");

        let err = ApiError::Http {
            status: 502,
            message: None,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502: bad gateway");
    }
}

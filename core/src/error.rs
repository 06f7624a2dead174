//! Error types for the Healthchecks.io API client.
//!
//! # Design
//! Three failure sources are kept apart: no response at all (`Transport`), a
//! response that was received but could not be decoded (`Decode`), and a
//! response with status >= 300 carrying the service's `{"error": ...}` body
//! (`Api`). Each variant carries the request method and URL; the two that
//! saw a response also carry the status. `message()` is the bare error text,
//! `Display` appends the request context.

use thiserror::Error;

use crate::http::HttpMethod;

/// Coarse classification of an `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Decode,
    Api,
    Serialization,
}

/// Errors returned by `HealthchecksClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was obtained.
    #[error("{message}. {method} {url}")]
    Transport {
        message: String,
        method: HttpMethod,
        url: String,
    },

    /// A body could not be decoded, either the expected payload or the error
    /// payload of a failed request. `status` is empty only when no status
    /// line was seen.
    #[error("{message}. {method} {url} >> {status}")]
    Decode {
        message: String,
        method: HttpMethod,
        url: String,
        status: String,
        status_code: Option<u16>,
    },

    /// The service answered with status >= 300 and an error message.
    #[error("{message}. {method} {url} >> {status}")]
    Api {
        message: String,
        method: HttpMethod,
        url: String,
        status: String,
        status_code: u16,
    },

    /// The outbound check could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Transport { .. } => ErrorKind::Transport,
            ApiError::Decode { .. } => ErrorKind::Decode,
            ApiError::Api { .. } => ErrorKind::Api,
            ApiError::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// The underlying error text without request context.
    pub fn message(&self) -> &str {
        match self {
            ApiError::Transport { message, .. }
            | ApiError::Decode { message, .. }
            | ApiError::Api { message, .. } => message,
            ApiError::Serialization(message) => message,
        }
    }

    pub fn method(&self) -> Option<HttpMethod> {
        match self {
            ApiError::Transport { method, .. }
            | ApiError::Decode { method, .. }
            | ApiError::Api { method, .. } => Some(*method),
            ApiError::Serialization(_) => None,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            ApiError::Transport { url, .. }
            | ApiError::Decode { url, .. }
            | ApiError::Api { url, .. } => url,
            ApiError::Serialization(_) => "",
        }
    }

    /// Response status line, e.g. `"404 Not Found"`. Empty when no response
    /// was received.
    pub fn status(&self) -> &str {
        match self {
            ApiError::Decode { status, .. } | ApiError::Api { status, .. } => status,
            ApiError::Transport { .. } | ApiError::Serialization(_) => "",
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Decode { status_code, .. } => *status_code,
            ApiError::Api { status_code, .. } => Some(*status_code),
            ApiError::Transport { .. } | ApiError::Serialization(_) => None,
        }
    }
}

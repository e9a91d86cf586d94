//! Error Types
//! 入力検証・照会・正規化のエラー

use serde::Serialize;
use thiserror::Error;

/// Message shown when the backend gave no usable detail.
pub const GENERIC_LOOKUP_MESSAGE: &str = "Price lookup failed";

// ========================================
// Validation
// ========================================

/// Raw input rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("code is required")]
    Required,
    #[error("code must be at most {max} characters (got {len})")]
    TooLong { len: usize, max: usize },
}

// ========================================
// Normalization
// ========================================

/// The backend payload broke the item contract (missing identity).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum NormalizationError {
    #[error("backend payload is missing required field `{0}`")]
    MissingField(&'static str),
}

// ========================================
// Lookup
// ========================================

/// Failure of a single lookup. Stored on the cache entry, so it is `Clone`
/// and carries rendered messages rather than the underlying client errors.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "info", rename_all = "snake_case")]
pub enum LookupError {
    /// HTTP or transport failure. `status` is absent when no response was
    /// received; `detail` is the backend's `{ detail }` message when present.
    #[error("transport error: {message}")]
    Transport {
        status: Option<u16>,
        detail: Option<String>,
        message: String,
    },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

impl LookupError {
    pub fn transport(status: Option<u16>, detail: Option<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            status,
            detail,
            message: message.into(),
        }
    }

    /// Text for the user-facing notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            _ => GENERIC_LOOKUP_MESSAGE.to_string(),
        }
    }

    /// HTTP status reported by the backend, if the failure came with one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::InvalidResponse(err.to_string());
        }
        Self::transport(err.status().map(|s| s.as_u16()), None, err.to_string())
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

// ========================================
// Config
// ========================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown backend `{0}` (expected `rest` or `graphql`)")]
    UnknownBackend(String),
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_backend_detail() {
        let err = LookupError::transport(Some(404), Some("Item not found".into()), "404 Not Found");
        assert_eq!(err.user_message(), "Item not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn user_message_falls_back_to_generic() {
        let err = LookupError::transport(None, None, "connection refused");
        assert_eq!(err.user_message(), GENERIC_LOOKUP_MESSAGE);

        let err = LookupError::InvalidResponse("missing field `HargaJual`".into());
        assert_eq!(err.user_message(), GENERIC_LOOKUP_MESSAGE);

        let err: LookupError = NormalizationError::MissingField("code").into();
        assert_eq!(err.user_message(), GENERIC_LOOKUP_MESSAGE);
        assert_eq!(err.status(), None);
    }

    #[test]
    fn transport_display_includes_message() {
        let err = LookupError::transport(Some(502), None, "HTTP 502 Bad Gateway");
        assert_eq!(err.to_string(), "transport error: HTTP 502 Bad Gateway");
    }
}

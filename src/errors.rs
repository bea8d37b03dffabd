//! Dispatch failures and their mapping onto error artifacts
//!
//! Every failure of a dispatch ends up as a [`ResponseArtifact`] with the
//! `Error` classification, so the response pane has a single layout.
//! HTTP 4xx/5xx statuses are not failures and never reach this module.

use std::sync::OnceLock;

use bytes::Bytes;
use chrono::Utc;
use regex::Regex;
use serde_json::json;

use crate::classify::{Classification, ParsedData, ResponseArtifact};
use crate::models::Backend;
use crate::network::transport::TransportError;

/// Why a dispatch did not produce a response
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The body does not parse as its declared format; nothing was sent
    #[error("{0}")]
    InvalidBody(String),
    /// The sandboxed backend refused the response under the cross-origin policy
    #[error("{0}")]
    TransportDenied(String),
    /// DNS, refused connection, timeout, invalid URL, ...
    #[error("{0}")]
    TransportFailure(String),
    /// A response arrived but its payload could not be read
    #[error("Failed to process response: {0}")]
    ProcessingFailure(String),
}

const CORS_HINT: &str = "CORS Error: The server doesn't allow requests from this origin. \
Enable CORS on the server (Access-Control-Allow-Origin) or switch to the native backend with 'b'.";

/// Browsers report a cross-origin refusal as a generic network failure. The
/// wording is the only signal available, so this is a best-effort match.
fn looks_like_cors_denial(message: &str) -> bool {
    static CORS_WORDING: OnceLock<Option<Regex>> = OnceLock::new();
    CORS_WORDING
        .get_or_init(|| Regex::new(r"(?i)cors|failed to fetch|network request failed").ok())
        .as_ref()
        .map(|re| re.is_match(message))
        .unwrap_or(false)
}

impl DispatchError {
    /// Classify a transport failure. Cross-origin denial only exists for the
    /// sandboxed backend.
    pub fn from_transport(backend: Backend, error: TransportError) -> Self {
        match error {
            TransportError::Body(message) => DispatchError::ProcessingFailure(message),
            TransportError::Network(message)
                if backend == Backend::Sandboxed && looks_like_cors_denial(&message) =>
            {
                DispatchError::TransportDenied(message)
            }
            TransportError::Network(message) => DispatchError::TransportFailure(message),
        }
    }

    /// Status shown in the response pane; `0` means no HTTP exchange happened
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::InvalidBody(_) | DispatchError::TransportDenied(_) => 0,
            DispatchError::TransportFailure(_) | DispatchError::ProcessingFailure(_) => 500,
        }
    }

    pub fn status_text(&self) -> &'static str {
        match self {
            DispatchError::InvalidBody(_) => "Invalid Body",
            DispatchError::TransportDenied(_) => "CORS Error",
            DispatchError::TransportFailure(_) | DispatchError::ProcessingFailure(_) => "Error",
        }
    }

    /// Actionable, user-facing message
    pub fn user_message(&self) -> String {
        match self {
            DispatchError::TransportDenied(_) => CORS_HINT.to_string(),
            other => other.to_string(),
        }
    }

    fn details(&self) -> &str {
        match self {
            DispatchError::InvalidBody(m)
            | DispatchError::TransportDenied(m)
            | DispatchError::TransportFailure(m)
            | DispatchError::ProcessingFailure(m) => m,
        }
    }

    /// Render the failure through the ordinary artifact shape
    pub fn into_artifact(self, elapsed_ms: u64) -> ResponseArtifact {
        let body = json!({
            "error": self.user_message(),
            "details": self.details(),
        });

        ResponseArtifact {
            classification: Classification::Error,
            raw_payload: Bytes::new(),
            parsed_data: ParsedData::Json(body),
            status_code: self.status_code(),
            status_text: self.status_text().to_string(),
            elapsed_ms,
            declared_content_type: "application/json".to_string(),
            byte_size: None,
            headers: Vec::new(),
            received_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandboxed_fetch_failure_is_denial() {
        let error = TransportError::Network("Failed to fetch (CORS: missing Access-Control-Allow-Origin)".into());
        let classified = DispatchError::from_transport(Backend::Sandboxed, error);
        assert!(matches!(classified, DispatchError::TransportDenied(_)));
        assert_eq!(classified.status_code(), 0);
        assert!(classified.user_message().contains("native backend"));
    }

    #[test]
    fn test_native_backend_never_reports_denial() {
        let error = TransportError::Network("Failed to fetch".into());
        let classified = DispatchError::from_transport(Backend::Native, error);
        assert!(matches!(classified, DispatchError::TransportFailure(_)));
        assert_eq!(classified.status_code(), 500);
    }

    #[test]
    fn test_body_read_error_is_processing_failure() {
        let error = TransportError::Body("connection reset".into());
        let classified = DispatchError::from_transport(Backend::Sandboxed, error);
        assert_eq!(classified, DispatchError::ProcessingFailure("connection reset".into()));
        assert_eq!(classified.to_string(), "Failed to process response: connection reset");
    }

    #[test]
    fn test_invalid_body_artifact() {
        let artifact = DispatchError::InvalidBody("Invalid JSON body: expected value".into()).into_artifact(3);
        assert_eq!(artifact.classification, Classification::Error);
        assert_eq!(artifact.status_code, 0);
        assert_eq!(artifact.elapsed_ms, 3);
        assert_eq!(artifact.declared_content_type, "application/json");
        assert!(!artifact.is_downloadable());
        match artifact.parsed_data {
            ParsedData::Json(body) => {
                assert_eq!(body["error"], "Invalid JSON body: expected value");
                assert_eq!(body["details"], "Invalid JSON body: expected value");
            }
            other => panic!("expected json body, got {:?}", other),
        }
    }
}

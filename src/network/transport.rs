//! Transport contract shared by the native and sandboxed backends

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::Config;
use crate::models::Backend;
use crate::network::native::NativeTransport;
use crate::network::sandboxed::SandboxedTransport;
use crate::request::RequestDescriptor;

/// Content type reported when the server declares none
pub const UNKNOWN_CONTENT_TYPE: &str = "unknown";

/// Network-level failure. HTTP error statuses are not transport errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No status was observed (DNS, refused, timeout, cross-origin refusal)
    #[error("{0}")]
    Network(String),
    /// Status and headers arrived but the body could not be read
    #[error("{0}")]
    Body(String),
}

/// A response as a backend produced it
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Reason phrase, when the backend has one
    pub status_text: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub content_type: Option<String>,
}

/// Backend-independent response, what the classifier consumes
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub content_type: String,
}

impl RawResponse {
    /// Fill in the status text from the numeric status when missing and
    /// default the content type.
    pub fn normalize(self) -> NormalizedResponse {
        let status_text = self
            .status_text
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| synthesize_status_text(self.status));

        NormalizedResponse {
            status: self.status,
            status_text,
            headers: self.headers,
            body: self.body,
            content_type: self
                .content_type
                .filter(|ct| !ct.is_empty())
                .unwrap_or_else(|| UNKNOWN_CONTENT_TYPE.to_string()),
        }
    }
}

/// Canonical reason phrase for a status, or the number itself
pub fn synthesize_status_text(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| status.to_string())
}

/// Executes request descriptors. Implementations differ only in whether a
/// cross-origin policy is enforced; request semantics are identical.
#[async_trait]
pub trait Transport: Send + Sync {
    fn backend(&self) -> Backend;

    async fn execute(&self, descriptor: &RequestDescriptor) -> Result<RawResponse, TransportError>;
}

/// Both backends, built once and picked per dispatch
#[derive(Clone)]
pub struct Transports {
    native: Arc<dyn Transport>,
    sandboxed: Arc<dyn Transport>,
}

impl Transports {
    pub fn new(native: Arc<dyn Transport>, sandboxed: Arc<dyn Transport>) -> Self {
        Transports { native, sandboxed }
    }

    pub fn from_config(config: &Config) -> Self {
        let client = crate::network::client::create_client(config.request_timeout());
        Transports {
            native: Arc::new(NativeTransport::new(client.clone())),
            sandboxed: Arc::new(SandboxedTransport::new(client, &config.sandbox_origin)),
        }
    }

    pub fn select(&self, backend: Backend) -> Arc<dyn Transport> {
        match backend {
            Backend::Native => Arc::clone(&self.native),
            Backend::Sandboxed => Arc::clone(&self.sandboxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: u16, status_text: Option<&str>, content_type: Option<&str>) -> RawResponse {
        RawResponse {
            status,
            status_text: status_text.map(str::to_string),
            headers: Vec::new(),
            body: Bytes::new(),
            content_type: content_type.map(str::to_string),
        }
    }

    #[test]
    fn test_status_text_is_synthesized() {
        assert_eq!(raw(404, None, None).normalize().status_text, "Not Found");
        assert_eq!(raw(200, Some(""), None).normalize().status_text, "OK");
        assert_eq!(raw(599, None, None).normalize().status_text, "599");
    }

    #[test]
    fn test_existing_status_text_is_kept() {
        assert_eq!(raw(200, Some("Fine"), None).normalize().status_text, "Fine");
    }

    #[test]
    fn test_missing_content_type_is_unknown() {
        assert_eq!(raw(200, None, None).normalize().content_type, UNKNOWN_CONTENT_TYPE);
        assert_eq!(
            raw(200, None, Some("image/png")).normalize().content_type,
            "image/png"
        );
    }
}

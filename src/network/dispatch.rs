//! Dispatch pipeline: build -> execute -> normalize -> classify
//!
//! Always yields an artifact. Build failures short-circuit before the
//! transport is touched; transport failures go through the error classifier.

use std::time::Instant;

use crate::app::draft::RequestDraft;
use crate::classify::ResponseArtifact;
use crate::errors::DispatchError;
use crate::network::transport::Transport;
use crate::request::{build_request, RequestDescriptor};

/// Run one full dispatch for a draft snapshot
pub async fn dispatch(transport: &dyn Transport, draft: &RequestDraft) -> ResponseArtifact {
    let start = Instant::now();

    match build_request(draft) {
        Ok(descriptor) => execute(transport, &descriptor).await,
        Err(e) => {
            tracing::warn!(error = %e, "Request build failed, nothing sent");
            e.into_artifact(elapsed_ms(start))
        }
    }
}

/// Execute an already built descriptor and classify the outcome
pub async fn execute(transport: &dyn Transport, descriptor: &RequestDescriptor) -> ResponseArtifact {
    let backend = transport.backend();
    tracing::info!(
        method = descriptor.method.as_str(),
        url = %descriptor.url,
        backend = backend.as_str(),
        "Executing request"
    );

    let start = Instant::now();
    let result = transport.execute(descriptor).await;
    let elapsed = elapsed_ms(start);

    match result {
        Ok(raw) => {
            let artifact = ResponseArtifact::from_response(raw.normalize(), elapsed);
            tracing::info!(
                status = artifact.status_code,
                classification = artifact.classification.as_str(),
                elapsed_ms = elapsed,
                "Request completed"
            );
            artifact
        }
        Err(e) => {
            let error = DispatchError::from_transport(backend, e);
            tracing::warn!(error = %error, elapsed_ms = elapsed, "Request failed");
            error.into_artifact(elapsed)
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::classify::{Classification, ParsedData};
    use crate::models::{Backend, HttpMethod};
    use crate::network::transport::{RawResponse, TransportError};
    use crate::request::RequestBody;

    /// Records what it was asked to send and replays a canned outcome
    struct RecordingTransport {
        backend: Backend,
        outcome: Result<RawResponse, TransportError>,
        calls: AtomicUsize,
        sent: Mutex<Option<RequestDescriptor>>,
    }

    impl RecordingTransport {
        fn new(backend: Backend, outcome: Result<RawResponse, TransportError>) -> Self {
            RecordingTransport {
                backend,
                outcome,
                calls: AtomicUsize::new(0),
                sent: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        fn backend(&self) -> Backend {
            self.backend
        }

        async fn execute(&self, descriptor: &RequestDescriptor) -> Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.sent.lock().unwrap() = Some(descriptor.clone());
            self.outcome.clone()
        }
    }

    fn ok(status: u16, content_type: &str, body: &'static [u8]) -> Result<RawResponse, TransportError> {
        Ok(RawResponse {
            status,
            status_text: None,
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body: Bytes::from_static(body),
            content_type: Some(content_type.to_string()),
        })
    }

    fn post_json(body: &str) -> RequestDraft {
        RequestDraft {
            method: HttpMethod::POST,
            url: "https://api.example.com/items".to_string(),
            json_body: body.to_string(),
            ..RequestDraft::default()
        }
    }

    #[tokio::test]
    async fn test_invalid_json_never_reaches_transport() {
        let transport = RecordingTransport::new(Backend::Native, ok(200, "application/json", b"{}"));
        let artifact = dispatch(&transport, &post_json("not json")).await;

        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(artifact.classification, Classification::Error);
        assert_eq!(artifact.status_code, 0);
    }

    #[tokio::test]
    async fn test_json_body_is_sent_canonical_with_content_type() {
        let transport = RecordingTransport::new(Backend::Native, ok(201, "application/json", br#"{"id":7}"#));
        let artifact = dispatch(&transport, &post_json("{\"x\":  1}")).await;

        let sent = transport.sent.lock().unwrap().clone().unwrap();
        assert_eq!(sent.headers.get("content-type"), Some("application/json"));
        let RequestBody::Json(body) = sent.body else {
            panic!("expected json body");
        };
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value, serde_json::json!({"x": 1}));

        assert_eq!(artifact.status_code, 201);
        assert_eq!(artifact.status_text, "Created");
        assert_eq!(artifact.parsed_data, ParsedData::Json(serde_json::json!({"id": 7})));
    }

    #[tokio::test]
    async fn test_http_error_status_is_a_normal_response() {
        let transport = RecordingTransport::new(Backend::Sandboxed, ok(404, "text/plain", b"missing"));
        let draft = RequestDraft {
            url: "https://api.example.com/nope".to_string(),
            ..RequestDraft::default()
        };
        let artifact = dispatch(&transport, &draft).await;

        assert_eq!(artifact.classification, Classification::Text);
        assert_eq!(artifact.status_code, 404);
        assert_eq!(artifact.status_text, "Not Found");
        assert_eq!(artifact.byte_size, Some(7));
    }

    #[tokio::test]
    async fn test_sandboxed_network_failure_becomes_cors_error() {
        let transport = RecordingTransport::new(
            Backend::Sandboxed,
            Err(TransportError::Network("Failed to fetch (CORS: no header)".into())),
        );
        let draft = RequestDraft {
            url: "https://api.example.com/items".to_string(),
            ..RequestDraft::default()
        };
        let artifact = dispatch(&transport, &draft).await;

        assert_eq!(artifact.status_code, 0);
        assert_eq!(artifact.status_text, "CORS Error");
    }

    #[tokio::test]
    async fn test_native_network_failure_is_500() {
        let transport = RecordingTransport::new(
            Backend::Native,
            Err(TransportError::Network("Connection failed: refused".into())),
        );
        let draft = RequestDraft {
            url: "http://127.0.0.1:9".to_string(),
            ..RequestDraft::default()
        };
        let artifact = dispatch(&transport, &draft).await;

        assert_eq!(artifact.status_code, 500);
        assert_eq!(artifact.status_text, "Error");
    }
}

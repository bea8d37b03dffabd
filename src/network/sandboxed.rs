//! Sandboxed backend - behaves like a browser `fetch` issued from a page
//! served at a fixed origin.
//!
//! Cross-origin requests go through the CORS protocol: non-safelisted
//! request headers trigger an `OPTIONS` preflight, and the response must
//! grant the page origin through `Access-Control-Allow-Origin`. Refusals
//! surface the way a browser reports them, as an opaque "Failed to fetch"
//! network failure with no observable status.

use async_trait::async_trait;
use reqwest::header::HeaderMap as WireHeaders;
use url::Url;

use crate::models::Backend;
use crate::network::client::{build_request, describe_error, read_response};
use crate::network::transport::{RawResponse, Transport, TransportError};
use crate::request::RequestDescriptor;

const SAFELISTED_REQUEST_HEADERS: &[&str] = &["accept", "accept-language", "content-language"];

const SIMPLE_CONTENT_TYPES: &[&str] = &[
    "application/x-www-form-urlencoded",
    "multipart/form-data",
    "text/plain",
];

const SAFELISTED_RESPONSE_HEADERS: &[&str] = &[
    "cache-control",
    "content-language",
    "content-length",
    "content-type",
    "expires",
    "last-modified",
    "pragma",
];

pub struct SandboxedTransport {
    client: reqwest::Client,
    origin: String,
}

impl SandboxedTransport {
    /// `page_origin` is the origin the emulated page is served from
    pub fn new(client: reqwest::Client, page_origin: &str) -> Self {
        let origin = Url::parse(page_origin)
            .map(|u| u.origin().ascii_serialization())
            .unwrap_or_else(|_| page_origin.trim_end_matches('/').to_string());
        SandboxedTransport { client, origin }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    async fn preflight(
        &self,
        descriptor: &RequestDescriptor,
        request_headers: &[String],
    ) -> Result<(), TransportError> {
        tracing::debug!(url = %descriptor.url, headers = ?request_headers, "Sending CORS preflight");

        let resp = self
            .client
            .request(reqwest::Method::OPTIONS, &descriptor.url)
            .header("Origin", &self.origin)
            .header("Access-Control-Request-Method", descriptor.method.as_str())
            .header("Access-Control-Request-Headers", request_headers.join(","))
            .send()
            .await
            .map_err(|e| fetch_failed(&describe_error(&e)))?;

        if !resp.status().is_success() {
            return Err(fetch_failed(&format!(
                "CORS preflight responded with status {}",
                resp.status().as_u16()
            )));
        }

        check_allow_origin(resp.headers(), &self.origin)?;

        // GET and POST are safelisted methods, so only headers need granting
        let allowed = header_list(resp.headers(), "access-control-allow-headers");
        let wildcard = allowed.iter().any(|h| h == "*");
        if let Some(denied) = request_headers
            .iter()
            .find(|name| !wildcard && !allowed.contains(name))
        {
            return Err(fetch_failed(&format!(
                "CORS preflight: request header '{}' is not allowed by Access-Control-Allow-Headers",
                denied
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for SandboxedTransport {
    fn backend(&self) -> Backend {
        Backend::Sandboxed
    }

    async fn execute(&self, descriptor: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        let target = Url::parse(&descriptor.url)
            .map_err(|e| TransportError::Network(format!("Invalid URL '{}': {}", descriptor.url, e)))?;

        if target.origin().ascii_serialization() == self.origin {
            let resp = build_request(&self.client, descriptor)
                .send()
                .await
                .map_err(|e| fetch_failed(&describe_error(&e)))?;
            return read_response(resp).await;
        }

        let unsafe_headers = non_safelisted_headers(descriptor);
        if !unsafe_headers.is_empty() {
            self.preflight(descriptor, &unsafe_headers).await?;
        }

        let resp = build_request(&self.client, descriptor)
            .header("Origin", &self.origin)
            .send()
            .await
            .map_err(|e| fetch_failed(&describe_error(&e)))?;

        check_allow_origin(resp.headers(), &self.origin)?;
        let exposed = header_list(resp.headers(), "access-control-expose-headers");

        let mut raw = read_response(resp).await?;
        raw.headers.retain(|(name, _)| is_exposed(name, &exposed));
        Ok(raw)
    }
}

fn fetch_failed(detail: &str) -> TransportError {
    TransportError::Network(format!("Failed to fetch ({})", detail))
}

/// Lowercased, sorted names of request headers that need a preflight
pub(crate) fn non_safelisted_headers(descriptor: &RequestDescriptor) -> Vec<String> {
    let mut names: Vec<String> = descriptor
        .headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .filter(|(name, value)| {
            if name == "content-type" {
                !is_simple_content_type(value)
            } else {
                !SAFELISTED_REQUEST_HEADERS.contains(&name.as_str())
            }
        })
        .map(|(name, _)| name)
        .collect();
    names.sort();
    names.dedup();
    names
}

fn is_simple_content_type(value: &str) -> bool {
    let media_type = value.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    SIMPLE_CONTENT_TYPES.contains(&media_type.as_str())
}

pub(crate) fn check_allow_origin(headers: &WireHeaders, origin: &str) -> Result<(), TransportError> {
    match headers
        .get("access-control-allow-origin")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
    {
        Some("*") => Ok(()),
        Some(allowed) if allowed == origin => Ok(()),
        Some(allowed) => Err(fetch_failed(&format!(
            "CORS: Access-Control-Allow-Origin '{}' does not match origin '{}'",
            allowed, origin
        ))),
        None => Err(fetch_failed(
            "CORS: No 'Access-Control-Allow-Origin' header is present on the requested resource",
        )),
    }
}

fn header_list(headers: &WireHeaders, name: &str) -> Vec<String> {
    headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|item| item.trim().to_ascii_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

fn is_exposed(name: &str, exposed: &[String]) -> bool {
    let name = name.to_ascii_lowercase();
    SAFELISTED_RESPONSE_HEADERS.contains(&name.as_str())
        || exposed.iter().any(|e| e == "*" || *e == name)
}

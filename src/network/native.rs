//! Unrestricted backend - talks to the network directly, no cross-origin checks

use async_trait::async_trait;

use crate::models::Backend;
use crate::network::client::{build_request, describe_error, read_response};
use crate::network::transport::{RawResponse, Transport, TransportError};
use crate::request::RequestDescriptor;

pub struct NativeTransport {
    client: reqwest::Client,
}

impl NativeTransport {
    pub fn new(client: reqwest::Client) -> Self {
        NativeTransport { client }
    }
}

#[async_trait]
impl Transport for NativeTransport {
    fn backend(&self) -> Backend {
        Backend::Native
    }

    async fn execute(&self, descriptor: &RequestDescriptor) -> Result<RawResponse, TransportError> {
        let resp = build_request(&self.client, descriptor)
            .send()
            .await
            .map_err(|e| TransportError::Network(describe_error(&e)))?;

        // Any status that made it back is a response, 4xx/5xx included
        read_response(resp).await
    }
}

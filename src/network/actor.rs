//! Network actor - runs dispatch pipelines in the Tokio async runtime

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::messages::{NetworkCommand, NetworkResponse};
use crate::network::dispatch::dispatch;
use crate::network::transport::Transports;

/// Network actor that executes dispatch commands
pub struct NetworkActor {
    transports: Transports,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<()>,
}

impl NetworkActor {
    pub fn new(transports: Transports, response_tx: mpsc::UnboundedSender<NetworkResponse>) -> Self {
        NetworkActor {
            transports,
            response_tx,
            active_requests: JoinSet::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                // Handle incoming commands
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::Dispatch { id, draft }) => {
                            let response_tx = self.response_tx.clone();
                            let transport = self.transports.select(draft.backend);

                            self.active_requests.spawn(async move {
                                let artifact = dispatch(transport.as_ref(), &draft).await;
                                tracing::debug!(id, status = artifact.status_code, "Dispatch finished");
                                let _ = response_tx.send(NetworkResponse::Settled { id, artifact });
                            });
                        }

                        Some(NetworkCommand::Shutdown) => {
                            self.active_requests.abort_all();
                            break;
                        }

                        None => break,
                    }
                }

                // Clean up completed tasks
                Some(result) = self.active_requests.join_next() => {
                    if let Err(e) = result {
                        if e.is_panic() {
                            tracing::error!(error = %e, "Dispatch task panicked");
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use bytes::Bytes;

    use crate::app::draft::RequestDraft;
    use crate::models::Backend;
    use crate::network::transport::{RawResponse, Transport, TransportError};
    use crate::request::RequestDescriptor;

    struct FixedStatus(Backend, u16);

    #[async_trait]
    impl Transport for FixedStatus {
        fn backend(&self) -> Backend {
            self.0
        }

        async fn execute(&self, _descriptor: &RequestDescriptor) -> Result<RawResponse, TransportError> {
            Ok(RawResponse {
                status: self.1,
                status_text: None,
                headers: Vec::new(),
                body: Bytes::from_static(b"ok"),
                content_type: Some("text/plain".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn test_dispatch_uses_the_drafts_backend() {
        let transports = Transports::new(
            Arc::new(FixedStatus(Backend::Native, 200)),
            Arc::new(FixedStatus(Backend::Sandboxed, 202)),
        );
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (resp_tx, mut resp_rx) = mpsc::unbounded_channel();
        tokio::spawn(NetworkActor::new(transports, resp_tx).run(cmd_rx));

        let draft = RequestDraft {
            url: "https://x.dev/a".to_string(),
            backend: Backend::Sandboxed,
            ..RequestDraft::default()
        };
        cmd_tx.send(NetworkCommand::Dispatch { id: 7, draft }).unwrap();

        let NetworkResponse::Settled { id, artifact } = resp_rx.recv().await.unwrap();
        assert_eq!(id, 7);
        assert_eq!(artifact.status_code, 202);

        cmd_tx.send(NetworkCommand::Shutdown).unwrap();
    }
}

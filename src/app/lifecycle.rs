//! Dispatch lifecycle: in-flight tracking, the elapsed-time ticker and the
//! preview resource owned by the current artifact.
//!
//! The lifecycle owns at most one [`Ticker`] and one [`PreviewHandle`]. Both
//! release themselves on drop, so replacing or disposing them can only
//! release each resource once.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::classify::ResponseArtifact;
use crate::download::extension_for;

#[derive(Debug, Clone)]
pub enum DispatchState {
    Idle,
    InFlight { id: u64, started_at: Instant },
    Settled(Arc<ResponseArtifact>),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("request #{in_flight} is still in flight")]
pub struct DispatchRejected {
    pub in_flight: u64,
}

/// Periodic wake-up while a request is in flight.
///
/// Sends `()` on the channel every `interval` until stopped or dropped.
#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Spawn on the current tokio runtime
    pub fn start(interval: Duration, tx: mpsc::UnboundedSender<()>) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if tx.send(()).is_err() {
                    break;
                }
            }
        });
        Ticker { handle }
    }

    /// Abort the tick task; no tick is sent afterwards
    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Temporary file holding a previewable payload (image or PDF) so an external
/// viewer can open it. Deleted when revoked or dropped.
#[derive(Debug)]
pub struct PreviewHandle {
    file: tempfile::NamedTempFile,
}

impl PreviewHandle {
    pub fn create(artifact: &ResponseArtifact) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("courier-preview-")
            .suffix(extension_for(&artifact.declared_content_type))
            .tempfile()?;
        file.write_all(&artifact.raw_payload)?;
        file.flush()?;
        tracing::debug!(path = %file.path().display(), "Created preview");
        Ok(PreviewHandle { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the file now, reporting failures instead of swallowing them
    pub fn revoke(self) {
        let path = self.file.path().to_path_buf();
        match self.file.close() {
            Ok(()) => tracing::debug!(path = %path.display(), "Revoked preview"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove preview"),
        }
    }
}

#[derive(Debug)]
pub struct Lifecycle {
    state: DispatchState,
    ticker: Option<Ticker>,
    preview: Option<PreviewHandle>,
    elapsed_ms: u64,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Lifecycle {
            state: DispatchState::Idle,
            ticker: None,
            preview: None,
            elapsed_ms: 0,
        }
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, DispatchState::InFlight { .. })
    }

    pub fn pending_id(&self) -> Option<u64> {
        match self.state {
            DispatchState::InFlight { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Live counter while in flight, final elapsed time once settled
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn artifact(&self) -> Option<&Arc<ResponseArtifact>> {
        match &self.state {
            DispatchState::Settled(artifact) => Some(artifact),
            _ => None,
        }
    }

    pub fn preview_path(&self) -> Option<&Path> {
        self.preview.as_ref().map(PreviewHandle::path)
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    /// Enter `InFlight`. The previous artifact and its preview are discarded.
    pub fn begin(&mut self, id: u64, now: Instant, ticker: Ticker) -> Result<(), DispatchRejected> {
        if let DispatchState::InFlight { id: in_flight, .. } = self.state {
            ticker.stop();
            return Err(DispatchRejected { in_flight });
        }

        self.replace_preview(None);
        self.state = DispatchState::InFlight { id, started_at: now };
        self.elapsed_ms = 0;
        if let Some(old) = self.ticker.replace(ticker) {
            old.stop();
        }
        Ok(())
    }

    /// Refresh the elapsed counter; `None` when nothing is in flight
    pub fn tick(&mut self, now: Instant) -> Option<u64> {
        match self.state {
            DispatchState::InFlight { started_at, .. } => {
                self.elapsed_ms = millis_between(started_at, now);
                Some(self.elapsed_ms)
            }
            _ => None,
        }
    }

    /// Store the artifact for `id`. Returns false (and drops the artifact)
    /// when `id` is not the request in flight.
    pub fn settle(&mut self, id: u64, artifact: ResponseArtifact, now: Instant) -> bool {
        let started_at = match self.state {
            DispatchState::InFlight { id: pending, started_at } if pending == id => started_at,
            _ => {
                tracing::debug!(id, "Ignoring stale response");
                return false;
            }
        };

        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
        self.elapsed_ms = millis_between(started_at, now);

        if artifact.classification.is_previewable() {
            match PreviewHandle::create(&artifact) {
                Ok(handle) => self.replace_preview(Some(handle)),
                Err(e) => tracing::warn!(error = %e, "Could not create preview"),
            }
        } else {
            self.replace_preview(None);
        }

        self.state = DispatchState::Settled(Arc::new(artifact));
        true
    }

    /// Stop the ticker and release the preview. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
        self.replace_preview(None);
    }

    fn replace_preview(&mut self, next: Option<PreviewHandle>) {
        if let Some(old) = std::mem::replace(&mut self.preview, next) {
            old.revoke();
        }
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn millis_between(start: Instant, end: Instant) -> u64 {
    end.saturating_duration_since(start).as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use crate::network::transport::RawResponse;
    use bytes::Bytes;

    fn artifact(content_type: &str, body: &'static [u8]) -> ResponseArtifact {
        let raw = RawResponse {
            status: 200,
            status_text: None,
            headers: Vec::new(),
            body: Bytes::from_static(body),
            content_type: Some(content_type.to_string()),
        };
        ResponseArtifact::from_response(raw.normalize(), 3)
    }

    fn ticker() -> (Ticker, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Ticker::start(Duration::from_millis(5), tx), rx)
    }

    #[tokio::test]
    async fn test_second_begin_is_rejected() {
        let mut lifecycle = Lifecycle::new();
        let now = Instant::now();

        let (first, _rx1) = ticker();
        lifecycle.begin(1, now, first).unwrap();

        let (second, _rx2) = ticker();
        assert_eq!(lifecycle.begin(2, now, second), Err(DispatchRejected { in_flight: 1 }));
        assert_eq!(lifecycle.pending_id(), Some(1));
    }

    #[tokio::test]
    async fn test_tick_tracks_elapsed_until_settled() {
        let mut lifecycle = Lifecycle::new();
        let start = Instant::now();
        let (t, _rx) = ticker();
        lifecycle.begin(1, start, t).unwrap();

        assert_eq!(lifecycle.tick(start + Duration::from_millis(40)), Some(40));
        assert!(lifecycle.settle(1, artifact("application/json", b"{}"), start + Duration::from_millis(55)));
        assert_eq!(lifecycle.elapsed_ms(), 55);
        assert_eq!(lifecycle.tick(start + Duration::from_millis(90)), None);
        assert_eq!(lifecycle.elapsed_ms(), 55);
        assert!(!lifecycle.is_ticking());
    }

    #[tokio::test]
    async fn test_ticker_stops_sending_after_settle() {
        let mut lifecycle = Lifecycle::new();
        let (t, mut rx) = ticker();
        lifecycle.begin(1, Instant::now(), t).unwrap();

        assert!(rx.recv().await.is_some());
        lifecycle.settle(1, artifact("text/plain", b"ok"), Instant::now());

        // Channel closes once the aborted task drops its sender
        while rx.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn test_stop_aborts_the_tick_task() {
        let (t, mut rx) = ticker();
        assert!(rx.recv().await.is_some());
        assert!(!t.is_finished());

        t.stop();
        let drained = tokio::time::timeout(Duration::from_secs(1), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }

    #[tokio::test]
    async fn test_stale_settle_is_ignored() {
        let mut lifecycle = Lifecycle::new();
        let (t, _rx) = ticker();
        lifecycle.begin(2, Instant::now(), t).unwrap();

        assert!(!lifecycle.settle(1, artifact("text/plain", b"old"), Instant::now()));
        assert!(lifecycle.is_in_flight());
        assert!(lifecycle.is_ticking());
    }

    #[tokio::test]
    async fn test_preview_created_for_images_and_revoked_on_next_dispatch() {
        let mut lifecycle = Lifecycle::new();
        let (t, _rx) = ticker();
        lifecycle.begin(1, Instant::now(), t).unwrap();
        lifecycle.settle(1, artifact("image/png", b"\x89PNG"), Instant::now());

        assert_eq!(
            lifecycle.artifact().map(|a| a.classification),
            Some(Classification::Image)
        );
        let path = lifecycle.preview_path().unwrap().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"\x89PNG");
        assert_eq!(path.extension().unwrap(), "png");

        let (t, _rx) = ticker();
        lifecycle.begin(2, Instant::now(), t).unwrap();
        assert!(lifecycle.preview_path().is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_json_has_no_preview() {
        let mut lifecycle = Lifecycle::new();
        let (t, _rx) = ticker();
        lifecycle.begin(1, Instant::now(), t).unwrap();
        lifecycle.settle(1, artifact("application/json", b"{}"), Instant::now());
        assert!(lifecycle.preview_path().is_none());
    }

    #[tokio::test]
    async fn test_dispose_is_idempotent() {
        let mut lifecycle = Lifecycle::new();
        let (t, _rx) = ticker();
        lifecycle.begin(1, Instant::now(), t).unwrap();
        lifecycle.settle(1, artifact("application/pdf", b"%PDF-1.4"), Instant::now());
        let path = lifecycle.preview_path().unwrap().to_path_buf();

        lifecycle.dispose();
        lifecycle.dispose();
        assert!(!path.exists());
        assert!(lifecycle.artifact().is_some());
    }

    #[tokio::test]
    async fn test_drop_releases_preview() {
        let path = {
            let mut lifecycle = Lifecycle::new();
            let (t, _rx) = ticker();
            lifecycle.begin(1, Instant::now(), t).unwrap();
            lifecycle.settle(1, artifact("image/gif", b"GIF89a"), Instant::now());
            lifecycle.preview_path().unwrap().to_path_buf()
        };
        assert!(!path.exists());
    }
}

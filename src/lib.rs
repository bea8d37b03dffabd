//! # Courier
//!
//! A terminal HTTP request composer.
//!
//! ## Features
//! - GET and POST with headers, query params, JSON or multipart bodies
//! - Two backends: native, and a sandboxed one that applies cross-origin rules
//! - Query params kept in sync with the URL
//! - Response classification (JSON, text, HTML, image, PDF, binary)
//! - cURL import/export
//! - Saving response payloads to disk
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine)
//! - Network Layer (Tokio runtime)

pub mod models;
pub mod params;
pub mod request;
pub mod classify;
pub mod errors;
pub mod config;
pub mod constants;
pub mod download;
pub mod ui;
pub mod curl;
pub mod messages;
pub mod app;
pub mod network;

// Re-export commonly used types
pub use models::{Backend, BodyType, FormField, HttpMethod, Header, KeyValue, QueryParam};
pub use classify::{Classification, ResponseArtifact};
pub use errors::DispatchError;
pub use request::{build_request, RequestDescriptor};
pub use curl::{parse_curl, to_curl};
pub use config::Config;
pub use messages::{UiEvent, NetworkCommand, NetworkResponse, RenderState};
pub use app::{AppState, AppActor, DraftEdit, RequestDraft};
pub use network::{NetworkActor, Transport, Transports};

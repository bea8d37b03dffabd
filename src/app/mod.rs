//! App layer - central state management and command processing
//!
//! The App actor receives UI events, network responses and lifecycle ticks,
//! updates state, and emits network commands and render state.

pub mod state;
pub mod actor;
pub mod commands;
pub mod draft;
pub mod lifecycle;

pub use state::AppState;
pub use actor::AppActor;
pub use draft::{DraftEdit, RequestDraft};

//! Render state - data structure sent from App layer to UI for rendering

use std::path::PathBuf;
use std::sync::Arc;

use crate::app::draft::RequestDraft;
use crate::classify::ResponseArtifact;
use crate::messages::ui_events::{
    Column, EditTarget, InputMode, Panel, Popup, ResponseFormat, ResponseTab,
};
use crate::models::Backend;

/// Dispatch progress as the response pane sees it
#[derive(Debug, Clone, Default)]
pub enum DispatchView {
    #[default]
    Idle,
    InFlight { elapsed_ms: u64 },
    Settled {
        artifact: Arc<ResponseArtifact>,
        preview_path: Option<PathBuf>,
    },
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    // Request
    pub draft: RequestDraft,
    /// URL with the params table folded in, when the URL is query-bearing
    pub preview_url: Option<String>,

    // UI state
    pub active_panel: Panel,
    pub input_mode: InputMode,
    pub edit_target: Option<EditTarget>,
    pub edit_buffer: String,
    pub cursor_position: usize,
    pub selected_row: usize,
    pub selected_column: Column,

    // Response
    pub dispatch: DispatchView,
    pub response_tab: ResponseTab,
    pub response_format: ResponseFormat,
    pub response_scroll: u16,

    /// One-line feedback (download saved, import failed, ...)
    pub notice: Option<String>,

    // Popups
    pub popup: Popup,
    pub curl_import_buffer: String,
    pub curl_export: String,
}

impl RenderState {
    pub fn backend(&self) -> Backend {
        self.draft.backend
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.dispatch, DispatchView::InFlight { .. })
    }
}

//! App state - pure data structure with no I/O logic

use std::path::PathBuf;
use std::time::Duration;

use crate::app::draft::{RequestDraft, RequestEditor};
use crate::app::lifecycle::{DispatchState, Lifecycle};
use crate::config::Config;
use crate::messages::render::DispatchView;
use crate::messages::ui_events::{
    Column, EditTarget, InputMode, Panel, Popup, ResponseFormat, ResponseTab,
};
use crate::messages::RenderState;

/// Main application state - pure data, no I/O
pub struct AppState {
    // Request being composed; only replaced through the draft reducer
    pub draft: RequestDraft,

    // UI state
    pub active_panel: Panel,
    pub input_mode: InputMode,
    pub edit_target: Option<EditTarget>,
    pub edit_buffer: String,
    pub cursor_position: usize,
    pub selected_row: usize,
    pub selected_column: Column,

    // Dispatch
    pub lifecycle: Lifecycle,
    pub next_request_id: u64,

    // Response view
    pub response_tab: ResponseTab,
    pub response_format: ResponseFormat,
    pub response_scroll: u16,

    pub notice: Option<String>,

    // Popups
    pub popup: Popup,
    pub curl_import_buffer: String,
    pub curl_export: String,

    // Settings
    pub download_dir: PathBuf,
    pub tick_interval: Duration,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        AppState {
            draft: RequestDraft::new(config.default_url.clone(), config.default_backend),
            active_panel: Panel::Url,
            input_mode: InputMode::Normal,
            edit_target: None,
            edit_buffer: String::new(),
            cursor_position: 0,
            selected_row: 0,
            selected_column: Column::Key,
            lifecycle: Lifecycle::new(),
            next_request_id: 1,
            response_tab: ResponseTab::Body,
            response_format: ResponseFormat::Formatted,
            response_scroll: 0,
            notice: None,
            popup: Popup::None,
            curl_import_buffer: String::new(),
            curl_export: String::new(),
            download_dir: config.download_dir.clone(),
            tick_interval: config.tick_interval(),
        }
    }

    /// Number of rows in the table the request pane currently shows
    pub fn row_count(&self) -> usize {
        match self.draft.editor() {
            RequestEditor::Headers => self.draft.headers.len(),
            RequestEditor::Params => self.draft.params.len(),
            RequestEditor::FormFields => self.draft.form_fields.len(),
            RequestEditor::JsonBody => 0,
        }
    }

    /// Current text of a table cell
    pub fn cell_text(&self, row: usize, column: Column) -> Option<String> {
        let pick = |key: &str, value: String| match column {
            Column::Key => key.to_string(),
            Column::Value => value,
        };
        match self.draft.editor() {
            RequestEditor::Headers => self.draft.headers.get(row).map(|h| pick(&h.key, h.value.clone())),
            RequestEditor::Params => self.draft.params.get(row).map(|p| pick(&p.key, p.value.clone())),
            RequestEditor::FormFields => self
                .draft
                .form_fields
                .get(row)
                .map(|f| pick(&f.key, f.value().display())),
            RequestEditor::JsonBody => None,
        }
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        let dispatch = match self.lifecycle.state() {
            DispatchState::Idle => DispatchView::Idle,
            DispatchState::InFlight { .. } => DispatchView::InFlight {
                elapsed_ms: self.lifecycle.elapsed_ms(),
            },
            DispatchState::Settled(artifact) => DispatchView::Settled {
                artifact: artifact.clone(),
                preview_path: self.lifecycle.preview_path().map(|p| p.to_path_buf()),
            },
        };

        RenderState {
            draft: self.draft.clone(),
            preview_url: self.draft.preview_url(),
            active_panel: self.active_panel,
            input_mode: self.input_mode,
            edit_target: self.edit_target,
            edit_buffer: self.edit_buffer.clone(),
            cursor_position: self.cursor_position,
            selected_row: self.selected_row,
            selected_column: self.selected_column,
            dispatch,
            response_tab: self.response_tab,
            response_format: self.response_format,
            response_scroll: self.response_scroll,
            notice: self.notice.clone(),
            popup: self.popup,
            curl_import_buffer: self.curl_import_buffer.clone(),
            curl_export: self.curl_export.clone(),
        }
    }
}

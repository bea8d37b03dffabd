//! Command handlers - business logic for processing UI events

use std::time::Instant;

use crate::app::draft::{DraftEdit, RequestEditor};
use crate::app::lifecycle::Ticker;
use crate::app::AppState;
use crate::curl;
use crate::download::save_artifact;
use crate::messages::ui_events::{Column, EditTarget, InputMode, Panel, Popup};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::{FieldKind, FormField, KeyValue};
use crate::request::build_request;

impl AppState {
    // ========================
    // Draft
    // ========================

    /// Run an edit through the draft reducer
    pub fn apply_edit(&mut self, edit: DraftEdit) {
        self.draft = std::mem::take(&mut self.draft).apply(edit);
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let rows = self.row_count();
        if self.selected_row >= rows {
            self.selected_row = rows.saturating_sub(1);
        }
    }

    // ========================
    // Navigation
    // ========================

    pub fn next_panel(&mut self) {
        self.active_panel = self.active_panel.next();
    }

    pub fn prev_panel(&mut self) {
        self.active_panel = self.active_panel.prev();
    }

    pub fn scroll_up(&mut self) {
        self.response_scroll = self.response_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.response_scroll = self.response_scroll.saturating_add(1);
    }

    // ========================
    // Input editing
    // ========================

    pub fn start_editing(&mut self) {
        let (target, text) = match self.active_panel {
            Panel::Url => (EditTarget::Url, self.draft.url.clone()),
            Panel::Request => match self.draft.editor() {
                RequestEditor::JsonBody => (EditTarget::JsonBody, self.draft.json_body.clone()),
                _ => {
                    if self.row_count() == 0 {
                        self.add_row();
                    }
                    let row = self.selected_row;
                    let column = self.selected_column;
                    match self.cell_text(row, column) {
                        Some(text) => (EditTarget::Cell { row, column }, text),
                        None => return,
                    }
                }
            },
            Panel::Response => return,
        };

        self.cursor_position = text.len();
        self.edit_buffer = text;
        self.edit_target = Some(target);
        self.input_mode = InputMode::Editing;
    }

    /// Leave editing mode, committing the buffer through the reducer
    pub fn stop_editing(&mut self) {
        let text = std::mem::take(&mut self.edit_buffer);
        match self.edit_target.take() {
            Some(EditTarget::Url) => self.apply_edit(DraftEdit::SetUrl(text)),
            Some(EditTarget::JsonBody) => self.apply_edit(DraftEdit::SetJsonBody(text)),
            Some(EditTarget::Cell { row, column }) => self.commit_cell(row, column, text),
            None => {}
        }
        self.input_mode = InputMode::Normal;
        self.cursor_position = 0;
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            let new_pos = self.edit_buffer[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.cursor_position = new_pos;
        }
    }

    pub fn move_cursor_right(&mut self) {
        let input = &self.edit_buffer;
        if self.cursor_position < input.len() {
            let new_pos = input[self.cursor_position..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(input.len());
            self.cursor_position = new_pos;
        }
    }

    pub fn enter_char(&mut self, c: char) {
        if self.cursor_position <= self.edit_buffer.len() {
            self.edit_buffer.insert(self.cursor_position, c);
            self.cursor_position += c.len_utf8();
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let prev_pos = self.edit_buffer[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.edit_buffer.remove(prev_pos);
            self.cursor_position = prev_pos;
        }
    }

    // ========================
    // Request settings
    // ========================

    pub fn cycle_method(&mut self) {
        if !self.lifecycle.is_in_flight() {
            self.apply_edit(DraftEdit::SetMethod(self.draft.method.next()));
        }
    }

    pub fn toggle_backend(&mut self) {
        let backend = self.draft.backend.toggle();
        self.apply_edit(DraftEdit::SetBackend(backend));
        self.notice = Some(format!("Backend: {}", backend.as_str()));
    }

    pub fn toggle_request_tab(&mut self) {
        self.apply_edit(DraftEdit::SetRequestTab(self.draft.request_tab.toggle()));
    }

    pub fn toggle_body_type(&mut self) {
        self.apply_edit(DraftEdit::SetBodyType(self.draft.body_type.toggle()));
    }

    // ========================
    // Row tables
    // ========================

    pub fn next_row(&mut self) {
        let rows = self.row_count();
        if rows > 0 {
            self.selected_row = (self.selected_row + 1) % rows;
        }
    }

    pub fn prev_row(&mut self) {
        let rows = self.row_count();
        if rows > 0 {
            self.selected_row = self.selected_row.checked_sub(1).unwrap_or(rows - 1);
        }
    }

    pub fn toggle_column(&mut self) {
        self.selected_column = self.selected_column.toggle();
    }

    pub fn add_row(&mut self) {
        let edit = match self.draft.editor() {
            RequestEditor::Headers => DraftEdit::SetHeaders(pushed(&self.draft.headers, KeyValue::default())),
            RequestEditor::Params => DraftEdit::SetParams(pushed(&self.draft.params, KeyValue::default())),
            RequestEditor::FormFields => {
                DraftEdit::SetFormFields(pushed(&self.draft.form_fields, FormField::default()))
            }
            RequestEditor::JsonBody => return,
        };
        self.apply_edit(edit);
        self.selected_row = self.row_count().saturating_sub(1);
    }

    pub fn delete_row(&mut self) {
        let row = self.selected_row;
        let edit = match self.draft.editor() {
            RequestEditor::Headers => DraftEdit::SetHeaders(removed(&self.draft.headers, row)),
            RequestEditor::Params => DraftEdit::SetParams(removed(&self.draft.params, row)),
            RequestEditor::FormFields => DraftEdit::SetFormFields(removed(&self.draft.form_fields, row)),
            RequestEditor::JsonBody => return,
        };
        self.apply_edit(edit);
    }

    /// Switch the selected form field between text and file; the value resets
    pub fn toggle_field_kind(&mut self) {
        if self.draft.editor() != RequestEditor::FormFields {
            return;
        }
        let mut fields = self.draft.form_fields.clone();
        if let Some(field) = fields.get_mut(self.selected_row) {
            let kind = match field.kind() {
                FieldKind::Text => FieldKind::File,
                FieldKind::File => FieldKind::Text,
            };
            *field = std::mem::take(field).with_kind(kind);
            self.apply_edit(DraftEdit::SetFormFields(fields));
        }
    }

    fn commit_cell(&mut self, row: usize, column: Column, text: String) {
        let edit = match self.draft.editor() {
            RequestEditor::Headers => DraftEdit::SetHeaders(with_cell(&self.draft.headers, row, column, text)),
            RequestEditor::Params => DraftEdit::SetParams(with_cell(&self.draft.params, row, column, text)),
            RequestEditor::FormFields => {
                let mut fields = self.draft.form_fields.clone();
                let Some(field) = fields.get_mut(row) else {
                    return;
                };
                let current = std::mem::take(field);
                *field = match column {
                    Column::Key => current.with_key(text),
                    Column::Value => current.with_value(text),
                };
                DraftEdit::SetFormFields(fields)
            }
            RequestEditor::JsonBody => return,
        };
        self.apply_edit(edit);
    }

    // ========================
    // Request sending
    // ========================

    /// Start a dispatch for the current draft. `None` when one is already in flight.
    pub fn prepare_request(&mut self, ticker: Ticker) -> Option<NetworkCommand> {
        let id = self.next_request_id;
        if let Err(e) = self.lifecycle.begin(id, Instant::now(), ticker) {
            tracing::warn!(error = %e, "Dispatch rejected");
            self.notice = Some(format!("Not sent: {}", e));
            return None;
        }

        self.next_request_id += 1;
        self.response_scroll = 0;
        self.notice = None;

        tracing::info!(
            id,
            method = self.draft.method.as_str(),
            url = %self.draft.url,
            backend = self.draft.backend.as_str(),
            "Dispatching request"
        );
        Some(NetworkCommand::Dispatch {
            id,
            draft: self.draft.clone(),
        })
    }

    // ========================
    // Response handling
    // ========================

    pub fn handle_response(&mut self, response: NetworkResponse) {
        match response {
            NetworkResponse::Settled { id, artifact } => {
                let status = artifact.status_code;
                if self.lifecycle.settle(id, artifact, Instant::now()) {
                    tracing::info!(id, status, elapsed_ms = self.lifecycle.elapsed_ms(), "Response settled");
                    self.response_scroll = 0;
                }
            }
        }
    }

    /// Refresh the elapsed counter; true when there is something new to render
    pub fn on_tick(&mut self) -> bool {
        self.lifecycle.tick(Instant::now()).is_some()
    }

    pub fn toggle_response_tab(&mut self) {
        self.response_tab = self.response_tab.toggle();
        self.response_scroll = 0;
    }

    pub fn cycle_response_format(&mut self) {
        self.response_format = self.response_format.next();
        self.response_scroll = 0;
    }

    /// Save the current artifact's raw payload into the download directory
    pub fn download(&mut self) {
        let Some(artifact) = self.lifecycle.artifact().cloned() else {
            self.notice = Some("Nothing to download yet".to_string());
            return;
        };
        self.notice = Some(match save_artifact(&artifact, &self.download_dir) {
            Ok(path) => format!("Saved {}", path.display()),
            Err(e) => {
                tracing::warn!(error = %e, "Download failed");
                format!("Download failed: {:#}", e)
            }
        });
    }

    // ========================
    // cURL import/export
    // ========================

    pub fn show_curl_import(&mut self) {
        self.popup = Popup::CurlImport;
    }

    pub fn curl_import_char(&mut self, c: char) {
        self.curl_import_buffer.push(c);
    }

    pub fn curl_import_backspace(&mut self) {
        self.curl_import_buffer.pop();
    }

    pub fn import_curl(&mut self) {
        match curl::parse_curl(&self.curl_import_buffer) {
            Ok(import) => {
                for edit in import.into_edits() {
                    self.apply_edit(edit);
                }
                self.notice = Some("Imported cURL command".to_string());
            }
            Err(e) => {
                tracing::warn!(error = %e, "cURL import failed");
                self.notice = Some(format!("cURL import failed: {}", e));
            }
        }
        self.curl_import_buffer.clear();
        self.popup = Popup::None;
    }

    pub fn cancel_curl_import(&mut self) {
        self.curl_import_buffer.clear();
        self.popup = Popup::None;
    }

    pub fn export_curl(&mut self) {
        match build_request(&self.draft) {
            Ok(descriptor) => {
                self.curl_export = curl::to_curl(&descriptor);
                self.popup = Popup::CurlExport;
            }
            Err(e) => self.notice = Some(format!("Cannot export: {}", e.user_message())),
        }
    }

    pub fn close_curl_export(&mut self) {
        self.popup = Popup::None;
    }

    // ========================
    // Help popup
    // ========================

    pub fn toggle_help(&mut self) {
        self.popup = match self.popup {
            Popup::Help => Popup::None,
            _ => Popup::Help,
        };
    }

    pub fn close_help(&mut self) {
        self.popup = Popup::None;
    }

    /// Release the ticker and preview before exit
    pub fn shutdown(&mut self) {
        self.lifecycle.dispose();
    }
}

fn pushed<T: Clone>(rows: &[T], row: T) -> Vec<T> {
    let mut rows = rows.to_vec();
    rows.push(row);
    rows
}

fn removed<T: Clone>(rows: &[T], index: usize) -> Vec<T> {
    let mut rows = rows.to_vec();
    if index < rows.len() {
        rows.remove(index);
    }
    rows
}

fn with_cell(rows: &[KeyValue], row: usize, column: Column, text: String) -> Vec<KeyValue> {
    let mut rows = rows.to_vec();
    if let Some(kv) = rows.get_mut(row) {
        match column {
            Column::Key => kv.key = text,
            Column::Value => kv.value = text,
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc;

    use crate::app::draft::RequestTab;
    use crate::classify::ResponseArtifact;
    use crate::config::Config;
    use crate::messages::render::DispatchView;
    use crate::models::{FormValue, Header, HttpMethod, QueryParam};
    use crate::network::transport::RawResponse;

    fn state() -> AppState {
        AppState::new(&Config {
            default_url: String::new(),
            ..Config::default()
        })
    }

    fn ticker() -> Ticker {
        let (tx, _rx) = mpsc::unbounded_channel();
        Ticker::start(Duration::from_millis(50), tx)
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            state.enter_char(c);
        }
    }

    fn artifact(status: u16) -> ResponseArtifact {
        let raw = RawResponse {
            status,
            status_text: None,
            headers: Vec::new(),
            body: Bytes::from_static(b"{\"ok\":true}"),
            content_type: Some("application/json".to_string()),
        };
        ResponseArtifact::from_response(raw.normalize(), 5)
    }

    #[test]
    fn test_url_edit_commits_through_param_sync() {
        let mut state = state();
        state.start_editing();
        type_text(&mut state, "https://x.dev/search?q=rust");
        state.stop_editing();

        assert_eq!(state.draft.url, "https://x.dev/search");
        assert_eq!(state.draft.params, vec![QueryParam::new("q", "rust")]);
        assert_eq!(state.draft.request_tab, RequestTab::Params);
        assert_eq!(state.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_cursor_handles_multibyte_chars() {
        let mut state = state();
        state.start_editing();
        type_text(&mut state, "hé");
        state.move_cursor_left();
        state.delete_char();
        assert_eq!(state.edit_buffer, "é");
    }

    #[test]
    fn test_header_cell_edit_replaces_whole_list() {
        let mut state = state();
        state.active_panel = Panel::Request;

        state.start_editing();
        type_text(&mut state, "Accept");
        state.stop_editing();
        state.toggle_column();
        state.start_editing();
        type_text(&mut state, "text/html");
        state.stop_editing();
        state.add_row();

        assert_eq!(
            state.draft.headers,
            vec![Header::new("Accept", "text/html"), Header::default()]
        );
        assert_eq!(state.selected_row, 1);

        state.delete_row();
        assert_eq!(state.draft.headers, vec![Header::new("Accept", "text/html")]);
        assert_eq!(state.selected_row, 0);
    }

    #[test]
    fn test_form_field_kind_toggle_resets_value() {
        let mut state = state();
        state.active_panel = Panel::Request;
        state.cycle_method();
        state.toggle_request_tab();
        state.toggle_body_type();
        assert_eq!(state.draft.editor(), RequestEditor::FormFields);

        state.selected_column = Column::Value;
        state.start_editing();
        type_text(&mut state, "alice");
        state.stop_editing();
        assert_eq!(state.draft.form_fields[0].value(), &FormValue::Text("alice".to_string()));

        state.toggle_field_kind();
        assert_eq!(state.draft.form_fields[0].kind(), FieldKind::File);
        assert!(state.draft.form_fields[0].value().is_empty());
    }

    #[test]
    fn test_json_editor_commits_body() {
        let mut state = state();
        state.active_panel = Panel::Request;
        state.cycle_method();
        state.toggle_request_tab();
        state.start_editing();
        assert_eq!(state.edit_target, Some(EditTarget::JsonBody));
        type_text(&mut state, "{\n}");
        state.stop_editing();
        assert_eq!(state.draft.json_body, "{\n}");
        assert_eq!(state.draft.method, HttpMethod::POST);
    }

    #[tokio::test]
    async fn test_second_send_while_in_flight_is_rejected() {
        let mut state = state();
        assert!(state.prepare_request(ticker()).is_some());
        assert!(state.prepare_request(ticker()).is_none());
        assert!(state.notice.is_some());
        assert_eq!(state.next_request_id, 2);
    }

    #[tokio::test]
    async fn test_stale_response_is_ignored() {
        let mut state = state();
        let Some(NetworkCommand::Dispatch { id, .. }) = state.prepare_request(ticker()) else {
            panic!("expected dispatch");
        };

        state.handle_response(NetworkResponse::Settled { id: id + 10, artifact: artifact(200) });
        assert!(state.lifecycle.is_in_flight());

        state.handle_response(NetworkResponse::Settled { id, artifact: artifact(201) });
        match state.to_render_state().dispatch {
            DispatchView::Settled { artifact, .. } => assert_eq!(artifact.status_code, 201),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_writes_into_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state();
        state.download_dir = dir.path().to_path_buf();

        state.download();
        assert_eq!(state.notice.as_deref(), Some("Nothing to download yet"));

        let Some(NetworkCommand::Dispatch { id, .. }) = state.prepare_request(ticker()) else {
            panic!("expected dispatch");
        };
        state.handle_response(NetworkResponse::Settled { id, artifact: artifact(200) });
        state.download();

        let saved = dir.path().join("response.json");
        assert_eq!(std::fs::read(saved).unwrap(), b"{\"ok\":true}");
    }

    #[test]
    fn test_curl_import_and_export() {
        let mut state = state();
        state.show_curl_import();
        for c in "curl -H 'Accept: text/plain' https://x.dev/a?x=1".chars() {
            state.curl_import_char(c);
        }
        state.import_curl();

        assert_eq!(state.popup, Popup::None);
        assert_eq!(state.draft.url, "https://x.dev/a");
        assert_eq!(state.draft.headers, vec![Header::new("Accept", "text/plain")]);

        state.export_curl();
        assert_eq!(state.popup, Popup::CurlExport);
        assert!(state.curl_export.contains("'https://x.dev/a?x=1'"));
    }

    #[test]
    fn test_export_with_invalid_json_reports_instead() {
        let mut state = state();
        state.apply_edit(DraftEdit::SetMethod(HttpMethod::POST));
        state.apply_edit(DraftEdit::SetUrl("https://x.dev/a".to_string()));
        state.apply_edit(DraftEdit::SetJsonBody("{oops".to_string()));

        state.export_curl();
        assert_eq!(state.popup, Popup::None);
        assert!(state.notice.unwrap().starts_with("Cannot export: Invalid JSON body"));
    }
}

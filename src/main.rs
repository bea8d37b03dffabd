//! Courier - actor-based terminal HTTP request composer
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - async dispatch through the selected backend

use std::io;
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use courier::app::draft::RequestEditor;
use courier::app::AppActor;
use courier::classify::ResponseArtifact;
use courier::config::Config;
use courier::constants::{APP_NAME, APP_VERSION, LOG_FILE_NAME};
use courier::messages::ui_events::{key_to_ui_event, Column, EditTarget, InputMode, Panel, Popup, ResponseTab};
use courier::messages::{DispatchView, NetworkCommand, NetworkResponse, RenderState, UiEvent};
use courier::models::{Backend, FieldKind, KeyValue};
use courier::network::{NetworkActor, Transports};
use courier::ui::{
    content_label, effective_format, format_bytes, format_label, method_color, render_tabs,
    response_body_lines, status_color,
};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();

    // Initialize logging to file; the TUI owns stdout
    if !config.log_dir.exists() {
        std::fs::create_dir_all(&config.log_dir)
            .with_context(|| format!("creating log directory {}", config.log_dir.display()))?;
    }
    let file_appender = tracing_appender::rolling::never(&config.log_dir, LOG_FILE_NAME);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    tracing::info!(
        version = APP_VERSION,
        backend = config.default_backend.as_str(),
        origin = %config.sandbox_origin,
        "Starting"
    );

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _terminal_guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let network_actor = NetworkActor::new(Transports::from_config(&config), net_resp_tx);
    tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(&config, net_cmd_tx, render_tx);
    let app_handle = tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    // Let the app actor release its resources before exit
    let _ = app_handle.await;
    tracing::info!("Stopped");

    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl ratatui::backend::Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        // Draw with current state
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(
                    key,
                    current_state.active_panel,
                    current_state.input_mode,
                    current_state.edit_target,
                    current_state.popup,
                ) {
                    let quit = matches!(event, UiEvent::Quit);
                    let _ = ui_tx.send(event);
                    if quit {
                        break;
                    }
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // Title bar
            Constraint::Length(3),  // Method + URL
            Constraint::Length(10), // Request pane
            Constraint::Min(5),     // Response
            Constraint::Length(1),  // Status bar
        ])
        .split(area);

    draw_title_bar(f, state, chunks[0]);
    draw_url_bar(f, state, chunks[1]);
    draw_request_pane(f, state, chunks[2]);
    draw_response(f, state, chunks[3]);
    draw_status_bar(f, state, chunks[4]);

    match state.popup {
        Popup::Help => draw_help_popup(f, area),
        Popup::CurlImport => draw_curl_import_popup(f, state, area),
        Popup::CurlExport => draw_curl_export_popup(f, state, area),
        Popup::None => {}
    }
}

fn border_style(focused: bool, editing: bool) -> Style {
    if focused && editing {
        Style::default().fg(Color::Yellow)
    } else if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    }
}

fn draw_title_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let backend_style = match state.backend() {
        Backend::Native => Style::default().fg(Color::Black).bg(Color::Green).bold(),
        Backend::Sandboxed => Style::default().fg(Color::Black).bg(Color::Magenta).bold(),
    };
    let line = Line::from(vec![
        Span::styled(format!(" {} ", APP_NAME), Style::default().fg(Color::Black).bg(Color::Cyan).bold()),
        Span::raw(" "),
        Span::styled(format!(" {} ", state.backend().as_str()), backend_style),
        Span::styled(" (b to switch)", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_url_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Url;
    let editing = state.edit_target == Some(EditTarget::Url);
    let method = state.draft.method.as_str();

    let loading = if state.is_loading() { " [...]" } else { "" };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(is_focused, editing))
        .title(format!(" {}{} ", method, loading))
        .title_style(Style::default().fg(method_color(method)).bold());

    if let Some(preview) = &state.preview_url {
        block = block.title_bottom(
            Line::styled(format!(" {} ", preview), Style::default().fg(Color::DarkGray)).right_aligned(),
        );
    }

    let text = if editing { state.edit_buffer.as_str() } else { state.draft.url.as_str() };
    f.render_widget(Paragraph::new(text).block(block), area);

    if editing {
        let max_x = area.x + area.width.saturating_sub(2);
        let column = cursor_column(&state.edit_buffer, state.cursor_position);
        let cursor_x = area.x.saturating_add(column).saturating_add(1).min(max_x);
        f.set_cursor_position(Position::new(cursor_x, area.y + 1));
    }
}

/// Display column of a byte offset into `text`, saturating at `u16::MAX`
fn cursor_column(text: &str, byte_offset: usize) -> u16 {
    let before = text.get(..byte_offset).unwrap_or(text);
    u16::try_from(before.chars().count()).unwrap_or(u16::MAX)
}

fn draw_request_pane(f: &mut Frame, state: &RenderState, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let editor = state.draft.editor();
    let second_tab = if state.draft.method.has_body() { "Body" } else { "Params" };
    let selected = if editor == RequestEditor::Headers { 0 } else { 1 };
    f.render_widget(render_tabs(&["Headers", second_tab], selected), parts[0]);

    match editor {
        RequestEditor::Headers => draw_key_value_rows(f, state, &state.draft.headers, " Headers ", parts[1]),
        RequestEditor::Params => draw_key_value_rows(f, state, &state.draft.params, " Query Params ", parts[1]),
        RequestEditor::JsonBody => draw_json_body(f, state, parts[1]),
        RequestEditor::FormFields => draw_form_fields(f, state, parts[1]),
    }
}

/// Text for a cell, showing the live buffer for the cell being edited
fn cell_text<'a>(state: &'a RenderState, row: usize, column: Column, value: &'a str) -> &'a str {
    match state.edit_target {
        Some(EditTarget::Cell { row: r, column: c }) if r == row && c == column => state.edit_buffer.as_str(),
        _ => value,
    }
}

fn cell_span(state: &RenderState, row: usize, column: Column, text: &str) -> Span<'static> {
    let focused = state.active_panel == Panel::Request && state.selected_row == row;
    let style = if focused && state.selected_column == column {
        if state.input_mode == InputMode::Editing {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::Yellow).bold()
        }
    } else {
        Style::default()
    };
    let shown = if text.is_empty() && !(focused && state.input_mode == InputMode::Editing) {
        match column {
            Column::Key => "<key>",
            Column::Value => "<value>",
        }
    } else {
        text
    };
    let style = if text.is_empty() { style.fg(Color::DarkGray) } else { style };
    Span::styled(shown.to_string(), style)
}

fn draw_key_value_rows(f: &mut Frame, state: &RenderState, rows: &[KeyValue], title: &str, area: Rect) {
    let is_focused = state.active_panel == Panel::Request;
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .map(|(i, kv)| {
            let marker = if kv.is_complete() { "[x] " } else { "[ ] " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::DarkGray)),
                cell_span(state, i, Column::Key, cell_text(state, i, Column::Key, &kv.key)),
                Span::raw(": "),
                cell_span(state, i, Column::Value, cell_text(state, i, Column::Value, &kv.value)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(is_focused, state.input_mode == InputMode::Editing))
            .title(format!("{}(a:add d:del e:edit ←/→:column t:tab) ", title)),
    );
    f.render_widget(list, area);
}

fn draw_form_fields(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Request;
    let items: Vec<ListItem> = state
        .draft
        .form_fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let kind = match field.kind() {
                FieldKind::Text => "text",
                FieldKind::File => "file",
            };
            let value = field.value().display();
            ListItem::new(Line::from(vec![
                Span::styled(format!("[{}] ", kind), Style::default().fg(Color::DarkGray)),
                cell_span(state, i, Column::Key, cell_text(state, i, Column::Key, &field.key)),
                Span::raw(" = "),
                cell_span(state, i, Column::Value, cell_text(state, i, Column::Value, &value)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(is_focused, state.input_mode == InputMode::Editing))
            .title(" Body: Form Data (a:add d:del k:text/file f:json) "),
    );
    f.render_widget(list, area);
}

fn draw_json_body(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Request;
    let editing = state.edit_target == Some(EditTarget::JsonBody);
    let text = if editing { state.edit_buffer.as_str() } else { state.draft.json_body.as_str() };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(is_focused, editing))
        .title(" Body: JSON (e:edit f:form data) ");
    f.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: false }), area);

    if editing {
        let before = state.edit_buffer.get(..state.cursor_position).unwrap_or(&state.edit_buffer);
        let row = u16::try_from(before.matches('\n').count()).unwrap_or(u16::MAX);
        let line = before.rsplit('\n').next().unwrap_or("");
        let col = cursor_column(line, line.len());
        let max_x = area.x + area.width.saturating_sub(2);
        let max_y = area.y + area.height.saturating_sub(2);
        f.set_cursor_position(Position::new(
            area.x.saturating_add(col).saturating_add(1).min(max_x),
            area.y.saturating_add(row).saturating_add(1).min(max_y),
        ));
    }
}

fn draw_response(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Response;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(is_focused, false));

    match &state.dispatch {
        DispatchView::Idle => {
            let hint = Paragraph::new("Press 's' to send the request")
                .style(Style::default().fg(Color::DarkGray))
                .block(block.title(" Response "));
            f.render_widget(hint, area);
        }
        DispatchView::InFlight { elapsed_ms } => {
            let loading = Paragraph::new(format!("Sending... {} ms", elapsed_ms))
                .style(Style::default().fg(Color::Yellow))
                .block(block.title(" Response "));
            f.render_widget(loading, area);
        }
        DispatchView::Settled { artifact, preview_path } => {
            let block = block
                .title(response_title(artifact))
                .title_bottom(Line::from(response_footer(state, artifact)).right_aligned());

            let lines = match state.response_tab {
                ResponseTab::Body => response_body_lines(artifact, state.response_format, preview_path.as_deref()),
                ResponseTab::Headers => header_lines(artifact),
            };
            let body = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((state.response_scroll, 0));
            f.render_widget(body, area);
        }
    }
}

fn response_title(artifact: &ResponseArtifact) -> Line<'static> {
    let color = status_color(artifact.status_code);
    let mut spans = vec![
        Span::styled(format!(" {} ", artifact.status_code), Style::default().fg(color).bold()),
        Span::styled(format!("{} ", artifact.status_text), Style::default().fg(color)),
        Span::raw(format!("• {} ms ", artifact.elapsed_ms)),
        Span::raw(format!("• {} ", content_label(&artifact.declared_content_type))),
    ];
    if let Some(size) = artifact.byte_size {
        spans.push(Span::raw(format!("• {} ", format_bytes(size))));
    }
    Line::from(spans)
}

fn response_footer(state: &RenderState, artifact: &ResponseArtifact) -> String {
    let tab = match state.response_tab {
        ResponseTab::Body => "body",
        ResponseTab::Headers => "headers",
    };
    match effective_format(artifact.classification, state.response_format) {
        Some(format) => format!(
            " {} | {} (v) | r:tab w:save ",
            tab,
            format_label(artifact.classification, format)
        ),
        None => format!(" {} | r:tab w:save ", tab),
    }
}

fn header_lines(artifact: &ResponseArtifact) -> Vec<Line<'static>> {
    if artifact.headers.is_empty() {
        return vec![Line::styled("No headers", Style::default().fg(Color::DarkGray))];
    }
    artifact
        .headers
        .iter()
        .map(|(name, value)| {
            Line::from(vec![
                Span::styled(format!("{}: ", name), Style::default().fg(Color::Cyan)),
                Span::raw(value.clone()),
            ])
        })
        .collect()
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let (text, style) = if let Some(notice) = &state.notice {
        (format!(" {} ", notice), Style::default().fg(Color::Yellow))
    } else if state.input_mode == InputMode::Editing {
        let hint = match state.edit_target {
            Some(EditTarget::Url) => " ESC:done | Enter:send | arrows:move ",
            Some(EditTarget::JsonBody) => " ESC:done | Ctrl+S:send | arrows:move ",
            _ => " ESC/Enter:done | arrows:move ",
        };
        (hint.to_string(), Style::default().fg(Color::DarkGray))
    } else {
        (
            " Tab:panel | e:edit | m:method | b:backend | s:send | i/c:cURL | ?:help | q:quit ".to_string(),
            Style::default().fg(Color::DarkGray),
        )
    };

    f.render_widget(Paragraph::new(text).style(style), area);
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 80, area);

    let help_text = r#"
 COURIER - Keyboard Shortcuts

 NAVIGATION
   Tab / Shift+Tab    Switch panels
   ↑ / ↓              Select row / scroll response

 REQUEST
   m                  Toggle GET / POST
   b                  Toggle native / sandboxed backend
   s / Ctrl+S         Send request
   e / Enter          Edit URL, cell or JSON body
   t                  Switch Headers / Params (Body for POST)
   f                  Switch JSON / form-data body
   i                  Import cURL
   c                  Export as cURL

 ROWS
   a / d              Add / delete row
   ← / →              Switch key / value column
   k                  Toggle form field text / file

 RESPONSE
   r                  Switch body / headers
   v                  Cycle view format
   w                  Save payload to the download directory

 GENERAL
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text).block(block).wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn draw_curl_import_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(80, 30, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Import cURL (Enter to import, Esc to cancel) ")
        .style(Style::default().bg(Color::Black));

    let content = if state.curl_import_buffer.is_empty() {
        "Paste cURL command here..."
    } else {
        &state.curl_import_buffer
    };

    let input = Paragraph::new(content).block(block).wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

fn draw_curl_export_popup(f: &mut Frame, state: &RenderState, area: Rect) {
    let popup_area = centered_rect(80, 50, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" cURL (any key to close) ")
        .style(Style::default().bg(Color::Black));

    let output = Paragraph::new(state.curl_export.as_str())
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(output, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_column_counts_chars_not_bytes() {
        let text = "https://例え.jp/ü";
        assert_eq!(cursor_column(text, text.len()), 15);
        assert_eq!(cursor_column("héllo", "hé".len()), 2);
    }

    #[test]
    fn test_cursor_column_saturates() {
        let long = "x".repeat(70_000);
        assert_eq!(cursor_column(&long, long.len()), u16::MAX);
    }
}

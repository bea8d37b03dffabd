//! App actor - message loop processing UI events, network responses and ticks

use tokio::sync::mpsc;

use crate::app::lifecycle::Ticker;
use crate::app::state::AppState;
use crate::config::Config;
use crate::messages::ui_events::InputMode;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
    tick_tx: mpsc::UnboundedSender<()>,
    tick_rx: mpsc::UnboundedReceiver<()>,
}

impl AppActor {
    pub fn new(
        config: &Config,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        AppActor {
            state: AppState::new(config),
            network_tx,
            render_tx,
            tick_tx,
            tick_rx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        // Send initial render state
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        self.state.shutdown();
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = net_rx.recv() => {
                    self.state.handle_response(response);
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(()) = self.tick_rx.recv() => {
                    if self.state.on_tick() {
                        let _ = self.render_tx.send(self.state.to_render_state());
                    }
                }
                else => break,
            }
        }

        self.state.shutdown();
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Panel navigation
            UiEvent::NextPanel => self.state.next_panel(),
            UiEvent::PrevPanel => self.state.prev_panel(),
            UiEvent::ScrollUp => self.state.scroll_up(),
            UiEvent::ScrollDown => self.state.scroll_down(),

            // Input editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::NewLine => self.state.enter_char('\n'),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),

            // Request actions
            UiEvent::CycleMethod => self.state.cycle_method(),
            UiEvent::ToggleBackend => self.state.toggle_backend(),
            UiEvent::ToggleRequestTab => self.state.toggle_request_tab(),
            UiEvent::ToggleBodyType => self.state.toggle_body_type(),
            UiEvent::SendRequest => {
                // Commit whatever is being edited first
                if self.state.input_mode == InputMode::Editing {
                    self.state.stop_editing();
                }
                let ticker = Ticker::start(self.state.tick_interval, self.tick_tx.clone());
                if let Some(cmd) = self.state.prepare_request(ticker) {
                    let _ = self.network_tx.send(cmd);
                }
            }

            // Row tables
            UiEvent::NextRow => self.state.next_row(),
            UiEvent::PrevRow => self.state.prev_row(),
            UiEvent::NextColumn | UiEvent::PrevColumn => self.state.toggle_column(),
            UiEvent::AddRow => self.state.add_row(),
            UiEvent::DeleteRow => self.state.delete_row(),
            UiEvent::ToggleFieldKind => self.state.toggle_field_kind(),

            // Response
            UiEvent::ToggleResponseTab => self.state.toggle_response_tab(),
            UiEvent::CycleResponseFormat => self.state.cycle_response_format(),
            UiEvent::Download => self.state.download(),

            // cURL
            UiEvent::ShowCurlImport => self.state.show_curl_import(),
            UiEvent::CurlImportChar(c) => self.state.curl_import_char(c),
            UiEvent::CurlImportBackspace => self.state.curl_import_backspace(),
            UiEvent::ImportCurl => self.state.import_curl(),
            UiEvent::CancelCurlImport => self.state.cancel_curl_import(),
            UiEvent::ExportCurl => self.state.export_curl(),
            UiEvent::CloseCurlExport => self.state.close_curl_export(),

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}

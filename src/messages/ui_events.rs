//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Panel navigation
    NextPanel,
    PrevPanel,
    ScrollUp,
    ScrollDown,

    // Input editing
    StartEditing,
    StopEditing,
    CharInput(char),
    NewLine,
    Backspace,
    CursorLeft,
    CursorRight,

    // Request actions
    SendRequest,
    CycleMethod,
    ToggleBackend,
    ToggleRequestTab,
    ToggleBodyType,

    // Row tables (headers, params, form fields)
    NextRow,
    PrevRow,
    NextColumn,
    PrevColumn,
    AddRow,
    DeleteRow,
    ToggleFieldKind,

    // Response
    ToggleResponseTab,
    CycleResponseFormat,
    Download,

    // cURL
    ShowCurlImport,
    CurlImportChar(char),
    CurlImportBackspace,
    ImportCurl,
    CancelCurlImport,
    ExportCurl,
    CloseCurlExport,

    // Popups
    ToggleHelp,
    CloseHelp,

    // System
    Quit,
}

/// Active panel in the UI (needed for context-aware event mapping)
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Panel {
    #[default]
    Url,
    Request,
    Response,
}

impl Panel {
    pub fn next(&self) -> Panel {
        match self {
            Panel::Url => Panel::Request,
            Panel::Request => Panel::Response,
            Panel::Response => Panel::Url,
        }
    }

    pub fn prev(&self) -> Panel {
        match self {
            Panel::Url => Panel::Response,
            Panel::Request => Panel::Url,
            Panel::Response => Panel::Request,
        }
    }
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// Column of a key/value row
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Column {
    #[default]
    Key,
    Value,
}

impl Column {
    pub fn toggle(&self) -> Column {
        match self {
            Column::Key => Column::Value,
            Column::Value => Column::Key,
        }
    }
}

/// What the edit buffer is bound to while editing
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EditTarget {
    Url,
    JsonBody,
    Cell { row: usize, column: Column },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ResponseTab {
    #[default]
    Body,
    Headers,
}

impl ResponseTab {
    pub fn toggle(&self) -> ResponseTab {
        match self {
            ResponseTab::Body => ResponseTab::Headers,
            ResponseTab::Headers => ResponseTab::Body,
        }
    }
}

/// How the response body is shown. Not every format applies to every
/// classification; the renderer falls back to the closest one.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ResponseFormat {
    #[default]
    Formatted,
    Raw,
    Preview,
}

impl ResponseFormat {
    pub fn next(&self) -> ResponseFormat {
        match self {
            ResponseFormat::Formatted => ResponseFormat::Raw,
            ResponseFormat::Raw => ResponseFormat::Preview,
            ResponseFormat::Preview => ResponseFormat::Formatted,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ResponseFormat::Formatted => "formatted",
            ResponseFormat::Raw => "raw",
            ResponseFormat::Preview => "preview",
        }
    }
}

/// Popup currently capturing all keys
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Popup {
    #[default]
    None,
    Help,
    CurlImport,
    CurlExport,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(
    key: KeyEvent,
    active_panel: Panel,
    input_mode: InputMode,
    edit_target: Option<EditTarget>,
    popup: Popup,
) -> Option<UiEvent> {
    use crossterm::event::KeyEventKind;

    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Global Ctrl shortcuts
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return Some(UiEvent::Quit),
            KeyCode::Char('s') => return Some(UiEvent::SendRequest),
            _ => {}
        }
    }

    match popup {
        Popup::Help => return Some(UiEvent::CloseHelp),
        Popup::CurlExport => return Some(UiEvent::CloseCurlExport),
        Popup::CurlImport => {
            return match key.code {
                KeyCode::Esc => Some(UiEvent::CancelCurlImport),
                KeyCode::Enter => Some(UiEvent::ImportCurl),
                KeyCode::Backspace => Some(UiEvent::CurlImportBackspace),
                KeyCode::Char(c) => Some(UiEvent::CurlImportChar(c)),
                _ => None,
            };
        }
        Popup::None => {}
    }

    match input_mode {
        InputMode::Normal => handle_normal_keys(key, active_panel),
        InputMode::Editing => handle_editing_keys(key, edit_target),
    }
}

fn handle_normal_keys(key: KeyEvent, active_panel: Panel) -> Option<UiEvent> {
    match key.code {
        KeyCode::Char('q') => Some(UiEvent::Quit),
        KeyCode::Char('?') => Some(UiEvent::ToggleHelp),
        KeyCode::Char('i') => Some(UiEvent::ShowCurlImport),
        KeyCode::Char('c') => Some(UiEvent::ExportCurl),
        KeyCode::Tab => Some(UiEvent::NextPanel),
        KeyCode::BackTab => Some(UiEvent::PrevPanel),
        KeyCode::Char('m') => Some(UiEvent::CycleMethod),
        KeyCode::Char('b') => Some(UiEvent::ToggleBackend),
        KeyCode::Char('s') => Some(UiEvent::SendRequest),
        KeyCode::Char('t') => Some(UiEvent::ToggleRequestTab),
        KeyCode::Char('f') => Some(UiEvent::ToggleBodyType),
        KeyCode::Char('r') => Some(UiEvent::ToggleResponseTab),
        KeyCode::Char('v') => Some(UiEvent::CycleResponseFormat),
        KeyCode::Char('w') => Some(UiEvent::Download),
        KeyCode::Char('e') | KeyCode::Enter => match active_panel {
            Panel::Url | Panel::Request => Some(UiEvent::StartEditing),
            Panel::Response => None,
        },
        KeyCode::Up => match active_panel {
            Panel::Request => Some(UiEvent::PrevRow),
            Panel::Response => Some(UiEvent::ScrollUp),
            Panel::Url => None,
        },
        KeyCode::Down => match active_panel {
            Panel::Request => Some(UiEvent::NextRow),
            Panel::Response => Some(UiEvent::ScrollDown),
            Panel::Url => None,
        },
        KeyCode::Left if active_panel == Panel::Request => Some(UiEvent::PrevColumn),
        KeyCode::Right if active_panel == Panel::Request => Some(UiEvent::NextColumn),
        KeyCode::Char('a') if active_panel == Panel::Request => Some(UiEvent::AddRow),
        KeyCode::Char('d') if active_panel == Panel::Request => Some(UiEvent::DeleteRow),
        KeyCode::Char('k') if active_panel == Panel::Request => Some(UiEvent::ToggleFieldKind),
        _ => None,
    }
}

fn handle_editing_keys(key: KeyEvent, edit_target: Option<EditTarget>) -> Option<UiEvent> {
    match key.code {
        KeyCode::Esc => Some(UiEvent::StopEditing),
        KeyCode::Left => Some(UiEvent::CursorLeft),
        KeyCode::Right => Some(UiEvent::CursorRight),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        KeyCode::Tab if edit_target == Some(EditTarget::JsonBody) => Some(UiEvent::CharInput(' ')),
        KeyCode::Enter => match edit_target {
            Some(EditTarget::Url) => Some(UiEvent::SendRequest),
            Some(EditTarget::JsonBody) => Some(UiEvent::NewLine),
            _ => Some(UiEvent::StopEditing),
        },
        _ => None,
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// HTTP Method enum
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HttpMethod {
    #[default]
    GET,
    POST,
}

impl HttpMethod {
    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
        }
    }

    pub fn next(&self) -> HttpMethod {
        match self {
            HttpMethod::GET => HttpMethod::POST,
            HttpMethod::POST => HttpMethod::GET,
        }
    }

    pub fn has_body(&self) -> bool {
        matches!(self, HttpMethod::POST)
    }
}

/// A key/value row as edited in the headers and query-param tables
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Both sides filled in; only such rows are ever sent
    pub fn is_complete(&self) -> bool {
        !self.key.is_empty() && !self.value.is_empty()
    }
}

pub type Header = KeyValue;
pub type QueryParam = KeyValue;

/// Request body editor mode (only meaningful for POST)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BodyType {
    #[default]
    Json,
    FormData,
}

impl BodyType {
    pub fn as_str(&self) -> &str {
        match self {
            BodyType::Json => "JSON",
            BodyType::FormData => "Form Data",
        }
    }

    pub fn toggle(&self) -> BodyType {
        match self {
            BodyType::Json => BodyType::FormData,
            BodyType::FormData => BodyType::Json,
        }
    }
}

/// Which transport executes the request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Direct network access, no cross-origin checks
    #[default]
    Native,
    /// Browser-like fetch that enforces CORS for a configured page origin
    Sandboxed,
}

impl Backend {
    pub fn as_str(&self) -> &str {
        match self {
            Backend::Native => "native",
            Backend::Sandboxed => "sandboxed",
        }
    }

    pub fn toggle(&self) -> Backend {
        match self {
            Backend::Native => Backend::Sandboxed,
            Backend::Sandboxed => Backend::Native,
        }
    }

    pub fn parse(s: &str) -> Option<Backend> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "unrestricted" => Some(Backend::Native),
            "sandboxed" | "browser" => Some(Backend::Sandboxed),
            _ => None,
        }
    }
}

/// Opaque reference to a file selected for upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileHandle {
    pub path: PathBuf,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileHandle { path: path.into() }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string()
    }
}

/// Form field kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    File,
}

/// Value of a multipart form field. A text payload belongs to a text field,
/// a file handle to a file field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(FileHandle),
}

impl FormValue {
    pub fn is_empty(&self) -> bool {
        match self {
            FormValue::Text(text) => text.is_empty(),
            FormValue::File(handle) => handle.path.as_os_str().is_empty(),
        }
    }

    pub fn display(&self) -> String {
        match self {
            FormValue::Text(text) => text.clone(),
            FormValue::File(handle) => handle.path.display().to_string(),
        }
    }
}

/// A multipart form row
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormField {
    pub key: String,
    value: FormValue,
}

impl FormField {
    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        FormField {
            key: key.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(key: impl Into<String>, handle: FileHandle) -> Self {
        FormField {
            key: key.into(),
            value: FormValue::File(handle),
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self.value {
            FormValue::Text(_) => FieldKind::Text,
            FormValue::File(_) => FieldKind::File,
        }
    }

    pub fn value(&self) -> &FormValue {
        &self.value
    }

    /// Switching kind always resets the value to empty text; a file field
    /// keeps holding no handle until one is assigned with `with_value`.
    pub fn with_kind(self, kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => FormField::text(self.key, ""),
            FieldKind::File => FormField {
                key: self.key,
                value: FormValue::File(FileHandle::new("")),
            },
        }
    }

    /// Replace the value, keeping the field kind
    pub fn with_value(self, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match self.kind() {
            FieldKind::Text => FormField::text(self.key, raw),
            FieldKind::File => FormField::file(self.key, FileHandle::new(raw)),
        }
    }

    pub fn with_key(self, key: impl Into<String>) -> Self {
        FormField {
            key: key.into(),
            value: self.value,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.key.is_empty() && !self.value.is_empty()
    }
}

impl Default for FormField {
    fn default() -> Self {
        FormField::text("", "")
    }
}

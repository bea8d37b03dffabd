//! Request builder - turns the editable draft into a transport-neutral descriptor

use bytes::Bytes;
use url::Url;

use crate::app::draft::RequestDraft;
use crate::errors::DispatchError;
use crate::models::{BodyType, FormField, FormValue, HttpMethod};
use crate::params::append_params;

/// Header collection with unique, ASCII-case-insensitive names.
/// Inserting an existing name replaces the value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(entry) => *entry = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One multipart form part
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MultipartPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: String,
        content: Bytes,
    },
}

impl MultipartPart {
    pub fn name(&self) -> &str {
        match self {
            MultipartPart::Text { name, .. } | MultipartPart::File { name, .. } => name,
        }
    }
}

/// Request payload
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RequestBody {
    #[default]
    None,
    /// Canonical (re-serialised) JSON text
    Json(String),
    /// Form parts; the transport picks the boundary and Content-Type
    Multipart(Vec<MultipartPart>),
}

/// Fully resolved request, ready for any transport
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

/// Build a descriptor from the current draft.
///
/// Fails with [`DispatchError::InvalidBody`] before anything touches the
/// network when a JSON body does not parse or a file part cannot be read.
pub fn build_request(draft: &RequestDraft) -> Result<RequestDescriptor, DispatchError> {
    let mut headers = HeaderMap::new();
    for header in draft.headers.iter().filter(|h| h.is_complete()) {
        headers.insert(&header.key, &header.value);
    }

    let mut url = draft.url.clone();
    if draft.method == HttpMethod::GET && draft.params.iter().any(|p| p.is_complete()) {
        let base = Url::parse(&draft.url)
            .map_err(|e| DispatchError::TransportFailure(format!("Invalid URL '{}': {}", draft.url, e)))?;
        url = append_params(base, &draft.params).to_string();
    }

    let body = match draft.method {
        HttpMethod::GET => RequestBody::None,
        HttpMethod::POST => match draft.body_type {
            BodyType::Json => {
                let value: serde_json::Value = serde_json::from_str(&draft.json_body)
                    .map_err(|e| DispatchError::InvalidBody(format!("Invalid JSON body: {}", e)))?;
                let canonical = serde_json::to_string(&value)
                    .map_err(|e| DispatchError::InvalidBody(format!("Invalid JSON body: {}", e)))?;
                headers.insert("Content-Type", "application/json");
                RequestBody::Json(canonical)
            }
            BodyType::FormData => RequestBody::Multipart(build_parts(&draft.form_fields)?),
        },
    };

    Ok(RequestDescriptor {
        method: draft.method,
        url,
        headers,
        body,
    })
}

fn build_parts(fields: &[FormField]) -> Result<Vec<MultipartPart>, DispatchError> {
    let mut parts = Vec::new();

    for field in fields.iter().filter(|f| f.is_complete()) {
        match field.value() {
            FormValue::Text(value) => parts.push(MultipartPart::Text {
                name: field.key.clone(),
                value: value.clone(),
            }),
            FormValue::File(handle) => {
                let content = std::fs::read(&handle.path).map_err(|e| {
                    DispatchError::InvalidBody(format!(
                        "Cannot read file for field '{}' ({}): {}",
                        field.key,
                        handle.path.display(),
                        e
                    ))
                })?;
                let mime = mime_guess::from_path(&handle.path)
                    .first_or_octet_stream()
                    .to_string();
                parts.push(MultipartPart::File {
                    name: field.key.clone(),
                    file_name: handle.file_name(),
                    mime,
                    content: Bytes::from(content),
                });
            }
        }
    }

    Ok(parts)
}

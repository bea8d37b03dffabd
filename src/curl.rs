//! cURL import and export
//!
//! Import turns a pasted command into draft edits so the URL goes through the
//! same param sync as typing it. Export renders a built descriptor.

use anyhow::{anyhow, bail, Result};

use crate::app::draft::DraftEdit;
use crate::models::{BodyType, FileHandle, FormField, Header, HttpMethod, QueryParam};
use crate::request::{MultipartPart, RequestBody, RequestDescriptor};

/// The parts of a cURL command the composer understands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurlImport {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<Header>,
    pub json_body: Option<String>,
    pub form_fields: Vec<FormField>,
}

impl CurlImport {
    /// Edits that load this command into a draft, in application order
    pub fn into_edits(self) -> Vec<DraftEdit> {
        let body_type = if self.form_fields.is_empty() {
            BodyType::Json
        } else {
            BodyType::FormData
        };
        let headers = if self.headers.is_empty() {
            vec![Header::default()]
        } else {
            self.headers
        };
        let form_fields = if self.form_fields.is_empty() {
            vec![FormField::default()]
        } else {
            self.form_fields
        };

        vec![
            DraftEdit::SetMethod(self.method),
            DraftEdit::SetParams(vec![QueryParam::default()]),
            DraftEdit::SetUrl(self.url),
            DraftEdit::SetHeaders(headers),
            DraftEdit::SetBodyType(body_type),
            DraftEdit::SetJsonBody(self.json_body.unwrap_or_default()),
            DraftEdit::SetFormFields(form_fields),
        ]
    }
}

/// Parse a cURL command
pub fn parse_curl(input: &str) -> Result<CurlImport> {
    let mut import = CurlImport::default();
    let mut explicit_method = false;

    // Remove line continuations and normalize
    let normalized = input.replace("\\\r\n", " ").replace("\\\n", " ");

    let mut tokens = tokenize(&normalized).into_iter().peekable();

    // Skip 'curl' command if present
    if tokens.peek().map(|s| s.as_str()) == Some("curl") {
        tokens.next();
    }

    while let Some(token) = tokens.next() {
        match token.as_str() {
            "-X" | "--request" => {
                let method = tokens.next().ok_or_else(|| anyhow!("{} needs a method", token))?;
                import.method = parse_method(&method)?;
                explicit_method = true;
            }
            "-H" | "--header" => {
                let header = tokens.next().ok_or_else(|| anyhow!("{} needs a value", token))?;
                import.headers.push(parse_header(&header)?);
            }
            "-d" | "--data" | "--data-raw" | "--data-binary" => {
                let data = tokens.next().ok_or_else(|| anyhow!("{} needs a value", token))?;
                import.json_body = Some(data);
                // Infer POST if not set
                if !explicit_method {
                    import.method = HttpMethod::POST;
                }
            }
            "-F" | "--form" => {
                let part = tokens.next().ok_or_else(|| anyhow!("{} needs a value", token))?;
                import.form_fields.push(parse_form_part(&part)?);
                if !explicit_method {
                    import.method = HttpMethod::POST;
                }
            }
            "--url" => {
                import.url = tokens.next().ok_or_else(|| anyhow!("--url needs a value"))?;
            }
            "-u" | "--user" => {
                // Credentials only travel as raw headers here
                tokens.next();
                tracing::debug!("Ignoring --user in imported cURL command");
            }
            "--compressed" | "-k" | "--insecure" | "-L" | "--location" | "-s" | "--silent"
            | "-v" | "--verbose" | "-i" | "--include" => {
                // Ignored flags
            }
            flag if flag.starts_with('-') => {
                tracing::debug!(flag, "Ignoring unknown cURL flag");
            }
            _ => {
                if import.url.is_empty() {
                    import.url = token;
                }
            }
        }
    }

    if import.url.is_empty() {
        bail!("No URL found in cURL command");
    }
    Ok(import)
}

fn parse_method(s: &str) -> Result<HttpMethod> {
    match s.to_uppercase().as_str() {
        "GET" => Ok(HttpMethod::GET),
        "POST" => Ok(HttpMethod::POST),
        _ => Err(anyhow!("Unsupported HTTP method: {}", s)),
    }
}

fn parse_header(s: &str) -> Result<Header> {
    match s.split_once(':') {
        Some((key, value)) => Ok(Header::new(key.trim(), value.trim())),
        None => Err(anyhow!("Invalid header format: {}", s)),
    }
}

/// `name=value` is a text field, `name=@path` a file field
fn parse_form_part(s: &str) -> Result<FormField> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid form part: {}", s))?;
    Ok(match value.strip_prefix('@') {
        Some(path) => FormField::file(name, FileHandle::new(path)),
        None => FormField::text(name, value),
    })
}

/// Tokenize a curl command, respecting quotes
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;
    let mut escape_next = false;

    for c in input.chars() {
        if escape_next {
            current.push(c);
            escape_next = false;
            continue;
        }

        match c {
            '\\' if !in_single_quote => {
                escape_next = true;
            }
            '\'' if !in_double_quote => {
                in_single_quote = !in_single_quote;
            }
            '"' if !in_single_quote => {
                in_double_quote = !in_double_quote;
            }
            ' ' | '\t' | '\n' | '\r' if !in_single_quote && !in_double_quote => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => {
                current.push(c);
            }
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Format a built request as a cURL command
pub fn to_curl(descriptor: &RequestDescriptor) -> String {
    let mut parts = vec!["curl".to_string()];

    if descriptor.method != HttpMethod::GET {
        parts.push(format!("-X {}", descriptor.method.as_str()));
    }

    parts.push(shell_quote(&descriptor.url));

    for (name, value) in descriptor.headers.iter() {
        parts.push(format!("-H {}", shell_quote(&format!("{}: {}", name, value))));
    }

    match &descriptor.body {
        RequestBody::None => {}
        RequestBody::Json(body) => parts.push(format!("-d {}", shell_quote(body))),
        RequestBody::Multipart(form) => {
            for part in form {
                let spec = match part {
                    MultipartPart::Text { name, value } => format!("{}={}", name, value),
                    MultipartPart::File { name, file_name, .. } => format!("{}=@{}", name, file_name),
                };
                parts.push(format!("-F {}", shell_quote(&spec)));
            }
        }
    }

    parts.join(" \\\n  ")
}

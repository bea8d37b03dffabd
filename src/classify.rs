//! Response classification - turns a declared content type and payload into
//! a render-ready artifact

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::network::transport::NormalizedResponse;

/// How the response pane renders a payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    Json,
    Html,
    Text,
    Image,
    Pdf,
    Binary,
    Error,
}

impl Classification {
    pub fn as_str(&self) -> &str {
        match self {
            Classification::Json => "json",
            Classification::Html => "html",
            Classification::Text => "text",
            Classification::Image => "image",
            Classification::Pdf => "pdf",
            Classification::Binary => "binary",
            Classification::Error => "error",
        }
    }

    /// Image and PDF payloads get a preview handle
    pub fn is_previewable(&self) -> bool {
        matches!(self, Classification::Image | Classification::Pdf)
    }
}

/// Content-type patterns, evaluated top to bottom, first substring match wins.
/// `application/json` and `text/html` sit above the generic `text/` entry.
pub const CLASSIFICATION_TABLE: &[(&str, Classification)] = &[
    ("application/json", Classification::Json),
    ("text/html", Classification::Html),
    ("text/", Classification::Text),
    ("image/", Classification::Image),
    ("application/pdf", Classification::Pdf),
];

/// Look up the classification for a declared content type
pub fn classification_for(content_type: &str) -> Classification {
    let content_type = content_type.to_ascii_lowercase();
    CLASSIFICATION_TABLE
        .iter()
        .find(|(pattern, _)| content_type.contains(pattern))
        .map(|(_, classification)| *classification)
        .unwrap_or(Classification::Binary)
}

/// Structured view of a payload
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedData {
    Json(Value),
    Text(String),
    /// Withheld (binary payloads)
    Empty,
}

impl ParsedData {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParsedData::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Output of [`classify`]
#[derive(Clone, Debug, PartialEq)]
pub struct Classified {
    pub classification: Classification,
    pub parsed_data: ParsedData,
    pub byte_size: Option<u64>,
}

/// Classify a payload. Pure: no I/O, same input gives the same output.
pub fn classify(content_type: &str, body: &[u8]) -> Classified {
    let classification = classification_for(content_type);

    let (parsed_data, byte_size) = match classification {
        Classification::Json => match serde_json::from_slice::<Value>(body) {
            Ok(json) => (ParsedData::Json(json), None),
            // Malformed JSON is still shown, as text
            Err(_) => (ParsedData::Text(String::from_utf8_lossy(body).into_owned()), None),
        },
        Classification::Html | Classification::Text => {
            let text = String::from_utf8_lossy(body).into_owned();
            let size = text.len() as u64;
            (ParsedData::Text(text), Some(size))
        }
        Classification::Image | Classification::Pdf | Classification::Binary | Classification::Error => {
            (ParsedData::Empty, Some(body.len() as u64))
        }
    };

    Classified {
        classification,
        parsed_data,
        byte_size,
    }
}

/// The immutable, classified result of one dispatch
#[derive(Clone, Debug)]
pub struct ResponseArtifact {
    pub classification: Classification,
    pub raw_payload: Bytes,
    pub parsed_data: ParsedData,
    pub status_code: u16,
    pub status_text: String,
    pub elapsed_ms: u64,
    pub declared_content_type: String,
    pub byte_size: Option<u64>,
    pub headers: Vec<(String, String)>,
    pub received_at: DateTime<Utc>,
}

impl ResponseArtifact {
    /// Classify a received response
    pub fn from_response(response: NormalizedResponse, elapsed_ms: u64) -> Self {
        let classified = classify(&response.content_type, &response.body);
        ResponseArtifact {
            classification: classified.classification,
            raw_payload: response.body,
            parsed_data: classified.parsed_data,
            status_code: response.status,
            status_text: response.status_text,
            elapsed_ms,
            declared_content_type: response.content_type,
            byte_size: classified.byte_size,
            headers: response.headers,
            received_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.classification == Classification::Error
    }

    /// Error artifacts carry no payload worth saving
    pub fn is_downloadable(&self) -> bool {
        !self.is_error()
    }

    /// Media type without parameters, e.g. `text/html` for `text/html; charset=utf-8`
    pub fn media_type(&self) -> &str {
        self.declared_content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_precedence() {
        assert_eq!(classification_for("application/json"), Classification::Json);
        assert_eq!(classification_for("application/json; charset=utf-8"), Classification::Json);
        assert_eq!(classification_for("text/html; charset=utf-8"), Classification::Html);
        assert_eq!(classification_for("text/plain"), Classification::Text);
        assert_eq!(classification_for("text/css"), Classification::Text);
        assert_eq!(classification_for("image/png"), Classification::Image);
        assert_eq!(classification_for("application/pdf"), Classification::Pdf);
        assert_eq!(classification_for("application/octet-stream"), Classification::Binary);
        assert_eq!(classification_for("unknown"), Classification::Binary);
    }

    #[test]
    fn test_matching_ignores_case() {
        assert_eq!(classification_for("Text/HTML"), Classification::Html);
        assert_eq!(classification_for("IMAGE/JPEG"), Classification::Image);
    }

    #[test]
    fn test_json_parses() {
        let classified = classify("application/json", br#"{"a": [1, 2]}"#);
        assert_eq!(classified.classification, Classification::Json);
        assert_eq!(classified.parsed_data, ParsedData::Json(json!({"a": [1, 2]})));
        assert_eq!(classified.byte_size, None);
    }

    #[test]
    fn test_malformed_json_falls_back_to_text() {
        let classified = classify("application/json", b"{not json");
        assert_eq!(classified.classification, Classification::Json);
        assert_eq!(classified.parsed_data, ParsedData::Text("{not json".to_string()));
    }

    #[test]
    fn test_text_size_is_utf8_length() {
        let classified = classify("text/plain; charset=utf-8", "héllo".as_bytes());
        assert_eq!(classified.parsed_data, ParsedData::Text("héllo".to_string()));
        assert_eq!(classified.byte_size, Some(6));
    }

    #[test]
    fn test_image_payload_is_withheld() {
        let png = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00];
        let classified = classify("image/png", &png);
        assert_eq!(classified.classification, Classification::Image);
        assert_eq!(classified.parsed_data, ParsedData::Empty);
        assert_eq!(classified.byte_size, Some(9));
        assert!(classified.classification.is_previewable());
    }

    #[test]
    fn test_empty_octet_stream_is_binary_of_size_zero() {
        let classified = classify("application/octet-stream", b"");
        assert_eq!(classified.classification, Classification::Binary);
        assert_eq!(classified.parsed_data, ParsedData::Empty);
        assert_eq!(classified.byte_size, Some(0));
        assert!(!classified.classification.is_previewable());
    }

    #[test]
    fn test_classification_is_idempotent() {
        let inputs: [(&str, &[u8]); 4] = [
            ("application/json", b"[1,2,3]"),
            ("text/html; charset=utf-8", b"<p>hi</p>"),
            ("application/pdf", b"%PDF-1.7"),
            ("application/zip", b"PK\x03\x04"),
        ];
        for (content_type, body) in inputs {
            assert_eq!(classify(content_type, body), classify(content_type, body));
        }
    }
}

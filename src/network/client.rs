//! reqwest plumbing shared by both transport backends

use std::time::Duration;

use reqwest::multipart::{Form, Part};

use crate::models::HttpMethod;
use crate::network::transport::{RawResponse, TransportError};
use crate::request::{MultipartPart, RequestBody, RequestDescriptor};

/// Build a reqwest request from a descriptor
pub(crate) fn build_request(
    client: &reqwest::Client,
    descriptor: &RequestDescriptor,
) -> reqwest::RequestBuilder {
    let mut req_builder = match descriptor.method {
        HttpMethod::GET => client.get(&descriptor.url),
        HttpMethod::POST => client.post(&descriptor.url),
    };

    for (name, value) in descriptor.headers.iter() {
        req_builder = req_builder.header(name, value);
    }

    match &descriptor.body {
        RequestBody::None => req_builder,
        RequestBody::Json(json) => req_builder.body(json.clone()),
        // reqwest sets multipart/form-data with its own boundary
        RequestBody::Multipart(parts) => req_builder.multipart(build_form(parts)),
    }
}

fn build_form(parts: &[MultipartPart]) -> Form {
    parts.iter().fold(Form::new(), |form, part| match part {
        MultipartPart::Text { name, value } => form.text(name.clone(), value.clone()),
        MultipartPart::File {
            name,
            file_name,
            mime,
            content,
        } => {
            let file_part = match Part::bytes(content.to_vec())
                .file_name(file_name.clone())
                .mime_str(mime)
            {
                Ok(part) => part,
                Err(_) => Part::bytes(content.to_vec()).file_name(file_name.clone()),
            };
            form.part(name.clone(), file_part)
        }
    })
}

/// Collect status, headers and the complete body
pub(crate) async fn read_response(resp: reqwest::Response) -> Result<RawResponse, TransportError> {
    let status = resp.status().as_u16();
    let headers: Vec<(String, String)> = resp
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = resp
        .bytes()
        .await
        .map_err(|e| TransportError::Body(format!("Error reading body: {}", e)))?;

    Ok(RawResponse {
        status,
        status_text: None,
        headers,
        body,
        content_type,
    })
}

/// Human-readable description of a send failure
pub(crate) fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timed out".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if e.is_builder() {
        format!("Invalid request: {}", e)
    } else {
        format!("Request failed: {}", e)
    }
}

/// Create an HTTP client with the given timeout
pub fn create_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("courier/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HeaderMap;

    #[test]
    fn test_build_request_carries_headers_and_json() {
        let client = create_client(Duration::from_secs(5));
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", "application/json");
        headers.insert("X-Api-Key", "secret");
        let descriptor = RequestDescriptor {
            method: HttpMethod::POST,
            url: "https://example.com/items".to_string(),
            headers,
            body: RequestBody::Json(r#"{"x":1}"#.to_string()),
        };

        let request = build_request(&client, &descriptor).build().unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.headers()["x-api-key"], "secret");
        assert_eq!(request.headers()["content-type"], "application/json");
        assert_eq!(request.body().and_then(|b| b.as_bytes()), Some(&br#"{"x":1}"#[..]));
    }

    #[test]
    fn test_multipart_sets_boundary_content_type() {
        let client = create_client(Duration::from_secs(5));
        let descriptor = RequestDescriptor {
            method: HttpMethod::POST,
            url: "https://example.com/upload".to_string(),
            headers: HeaderMap::new(),
            body: RequestBody::Multipart(vec![MultipartPart::Text {
                name: "name".to_string(),
                value: "alice".to_string(),
            }]),
        };

        let request = build_request(&client, &descriptor).build().unwrap();
        let content_type = request.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
    }
}

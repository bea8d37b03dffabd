use std::path::Path;
use std::sync::OnceLock;

use ratatui::{prelude::*, widgets::*};
use regex::Regex;

use crate::classify::{Classification, ParsedData, ResponseArtifact};
use crate::messages::ui_events::ResponseFormat;

/// Renders tabs
pub fn render_tabs<'a>(titles: &[&'a str], selected: usize) -> Tabs<'a> {
    let titles: Vec<Line> = titles.iter().map(|t| Line::from(*t)).collect();

    Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .divider("|")
}

/// Simple JSON syntax highlighting
pub fn highlight_json(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for line in text.lines() {
        let mut spans = Vec::new();
        let mut current = String::new();
        let mut in_string = false;
        let mut is_key = false;

        for c in line.chars() {
            match c {
                '"' => {
                    if in_string {
                        // End of string
                        current.push(c);
                        let color = if is_key { Color::Cyan } else { Color::Green };
                        spans.push(Span::styled(std::mem::take(&mut current), Style::default().fg(color)));
                        in_string = false;
                        is_key = false;
                    } else {
                        if !current.is_empty() {
                            spans.push(Span::raw(std::mem::take(&mut current)));
                        }
                        // Start of string; a key is followed by ':'
                        in_string = true;
                        current.push(c);
                        is_key = line[line.find('"').unwrap_or(0)..].contains("\":");
                    }
                }
                ':' if !in_string => {
                    if !current.is_empty() {
                        spans.push(Span::raw(std::mem::take(&mut current)));
                    }
                    spans.push(Span::styled(":", Style::default().fg(Color::White)));
                }
                '{' | '}' | '[' | ']' if !in_string => {
                    if !current.is_empty() {
                        spans.push(Span::raw(std::mem::take(&mut current)));
                    }
                    spans.push(Span::styled(c.to_string(), Style::default().fg(Color::Yellow)));
                }
                't' | 'r' | 'u' | 'e' | 'f' | 'a' | 'l' | 's' | 'n' if !in_string => {
                    current.push(c);
                    // Check for true, false, null
                    let trimmed = current.trim_start();
                    if trimmed == "true" || trimmed == "false" || trimmed == "null" {
                        let keyword = trimmed.to_string();
                        let indent = current.len() - keyword.len();
                        if indent > 0 {
                            spans.push(Span::raw(current[..indent].to_string()));
                        }
                        spans.push(Span::styled(keyword, Style::default().fg(Color::Magenta)));
                        current.clear();
                    }
                }
                _ => {
                    current.push(c);
                }
            }
        }

        if !current.is_empty() {
            // Color numbers
            let trimmed = current.trim().trim_end_matches(',');
            if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '.' || c == 'e' || c == 'E' || c == '+') {
                spans.push(Span::styled(current, Style::default().fg(Color::Yellow)));
            } else {
                spans.push(Span::raw(current));
            }
        }

        lines.push(Line::from(spans));
    }

    lines
}

/// Status code color: 2xx green, 3xx amber, 4xx and up red
pub fn status_color(code: u16) -> Color {
    match code {
        200..=299 => Color::Green,
        300..=399 => Color::Yellow,
        _ => Color::Red,
    }
}

/// Method color
pub fn method_color(method: &str) -> Color {
    match method {
        "GET" => Color::Green,
        "POST" => Color::Yellow,
        _ => Color::White,
    }
}

/// Human-readable size, 1024-based, at most two decimals
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut exponent = 0;
    while value >= 1024.0 && exponent < UNITS.len() - 1 {
        value /= 1024.0;
        exponent += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent])
}

/// Short label for a content type: `application/json; charset=utf-8` -> `JSON`
pub fn content_label(content_type: &str) -> String {
    let media = content_type.split(';').next().unwrap_or("").trim();
    media
        .split_once('/')
        .map(|(_, subtype)| subtype)
        .unwrap_or(media)
        .to_uppercase()
}

/// Readable text from an HTML document: scripts, styles and tags removed,
/// common entities decoded, runs of blank lines collapsed.
pub fn html_to_text(html: &str) -> String {
    static HIDDEN: OnceLock<Option<Regex>> = OnceLock::new();
    static BREAKS: OnceLock<Option<Regex>> = OnceLock::new();
    static TAGS: OnceLock<Option<Regex>> = OnceLock::new();

    let (Some(hidden), Some(breaks), Some(tags)) = (
        cached(&HIDDEN, r"(?is)<(script|style|head)\b.*?</(script|style|head)\s*>"),
        cached(&BREAKS, r"(?i)<(br|/p|/div|/h[1-6]|/li|/tr|/title)\s*/?>"),
        cached(&TAGS, r"(?s)<[^>]*>"),
    ) else {
        return html.to_string();
    };

    let text = hidden.replace_all(html, "");
    let text = breaks.replace_all(&text, "\n");
    let text = tags.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    let mut out = Vec::new();
    let mut blank = false;
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !blank && !out.is_empty() {
                out.push(String::new());
            }
            blank = true;
        } else {
            out.push(line.to_string());
            blank = false;
        }
    }
    out.join("\n").trim_end().to_string()
}

fn cached<'a>(cell: &'a OnceLock<Option<Regex>>, pattern: &str) -> Option<&'a Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

/// Formats that apply to a classification, in cycling order
pub fn formats_for(classification: Classification) -> &'static [ResponseFormat] {
    match classification {
        Classification::Json => &[ResponseFormat::Formatted, ResponseFormat::Raw],
        Classification::Html => &[ResponseFormat::Preview, ResponseFormat::Formatted],
        Classification::Image | Classification::Pdf => &[ResponseFormat::Preview, ResponseFormat::Raw],
        Classification::Text | Classification::Binary | Classification::Error => &[],
    }
}

/// The requested format if it applies, else the first one that does
pub fn effective_format(classification: Classification, requested: ResponseFormat) -> Option<ResponseFormat> {
    let formats = formats_for(classification);
    if formats.contains(&requested) {
        Some(requested)
    } else {
        formats.first().copied()
    }
}

/// Label shown for a format; HTML calls its formatted view "source"
pub fn format_label(classification: Classification, format: ResponseFormat) -> &'static str {
    match (classification, format) {
        (Classification::Html, ResponseFormat::Formatted) => "source",
        (_, ResponseFormat::Formatted) => "formatted",
        (_, ResponseFormat::Raw) => "raw",
        (_, ResponseFormat::Preview) => "preview",
    }
}

/// Lines for the response body pane
pub fn response_body_lines(
    artifact: &ResponseArtifact,
    requested: ResponseFormat,
    preview_path: Option<&Path>,
) -> Vec<Line<'static>> {
    let format = effective_format(artifact.classification, requested);
    let size = format_bytes(artifact.byte_size.unwrap_or(artifact.raw_payload.len() as u64));
    let muted = Style::default().fg(Color::DarkGray);

    match artifact.classification {
        Classification::Json | Classification::Error => match &artifact.parsed_data {
            ParsedData::Json(value) if format == Some(ResponseFormat::Raw) => {
                vec![Line::from(value.to_string())]
            }
            ParsedData::Json(value) => {
                let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                highlight_json(&pretty)
            }
            other => text_lines(other.as_text().unwrap_or_default()),
        },
        Classification::Html => {
            let source = artifact.parsed_data.as_text().unwrap_or_default();
            if format == Some(ResponseFormat::Preview) {
                text_lines(&html_to_text(source))
            } else {
                text_lines(source)
            }
        }
        Classification::Text => text_lines(artifact.parsed_data.as_text().unwrap_or_default()),
        Classification::Image | Classification::Pdf => {
            let kind = if artifact.classification == Classification::Image { "image" } else { "PDF" };
            match (format, preview_path) {
                (Some(ResponseFormat::Preview), Some(path)) => vec![
                    Line::from(format!("Preview file: {}", path.display())),
                    Line::styled("Open it with an external viewer; it is removed on the next request.", muted),
                ],
                _ => vec![Line::styled(format!("Binary {} data • {}", kind, size), muted)],
            }
        }
        Classification::Binary => vec![
            Line::styled(format!("Binary file • {}", size), muted),
            Line::from(""),
            Line::styled("Press 'w' to download", muted),
        ],
    }
}

fn text_lines(text: &str) -> Vec<Line<'static>> {
    text.lines().map(|l| Line::from(l.to_string())).collect()
}

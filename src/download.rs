//! Saving a response payload to disk

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::classify::ResponseArtifact;

/// Content-type fragment -> file extension, first match wins
const EXTENSIONS: &[(&str, &str)] = &[
    ("application/json", ".json"),
    ("text/html", ".html"),
    ("text/plain", ".txt"),
    ("text/css", ".css"),
    ("text/javascript", ".js"),
    ("application/xml", ".xml"),
    ("text/xml", ".xml"),
    ("application/pdf", ".pdf"),
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("image/webp", ".webp"),
];

pub fn extension_for(content_type: &str) -> &'static str {
    let content_type = content_type.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(pattern, _)| content_type.contains(pattern))
        .map(|(_, ext)| *ext)
        .unwrap_or(".bin")
}

/// `response<ext>` for the artifact's declared content type
pub fn file_name_for(artifact: &ResponseArtifact) -> String {
    format!("response{}", extension_for(&artifact.declared_content_type))
}

/// Write the raw payload into `dir`, returning the written path
pub fn save_artifact(artifact: &ResponseArtifact, dir: &Path) -> Result<PathBuf> {
    if !artifact.is_downloadable() {
        bail!("Nothing to download: the request failed");
    }

    if !dir.exists() {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let path = dir.join(file_name_for(artifact));
    std::fs::write(&path, &artifact.raw_payload)
        .with_context(|| format!("writing {}", path.display()))?;

    tracing::info!(path = %path.display(), bytes = artifact.raw_payload.len(), "Saved response");
    Ok(path)
}

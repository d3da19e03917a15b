//! Scratch-directory materialization of rendering artifacts.
//!
//! The rich body of a message may reference embedded inline resources by
//! content identifier (`cid:...`). Before handing the body to a display
//! surface, the coordinator writes those resources to addressable temporary
//! files and rewrites the references to point at them, then writes the
//! rewritten body itself. Artifacts are regenerated per render and are not
//! durable state.

use crate::model::{FullMessage, MessageToken};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Failure while writing rendering artifacts.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Could not create or write under the scratch directory.
    #[error("failed to write rendering artifact at {path}: {source}")]
    Io {
        /// The path that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Materialized artifacts for one rendered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Path of the rewritten rich body, when the message has one.
    pub html_path: Option<PathBuf>,
    /// Paths of the extracted inline resources.
    pub resources: Vec<PathBuf>,
}

/// Writes per-message rendering artifacts into a scratch directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create a store rooted at `root` (created lazily per message).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Materialize the rich body and inline resources for one message.
    ///
    /// Any previous artifacts for the same token are replaced. Returns
    /// `html_path: None` for messages without a rich body; resources are
    /// still not written in that case since nothing references them.
    pub fn materialize(
        &self,
        token: &MessageToken,
        message: &FullMessage,
    ) -> Result<Materialized, RenderError> {
        let Some(html) = message.html_body.as_deref() else {
            return Ok(Materialized {
                html_path: None,
                resources: Vec::new(),
            });
        };

        let dir = self.root.join(sanitize(token.as_str()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).map_err(|source| RenderError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut body = html.to_string();
        let mut resources = Vec::new();
        for resource in &message.inline_resources {
            let file_name = format!(
                "{}{}",
                sanitize(&resource.content_id),
                extension_for(&resource.media_type)
            );
            let path = dir.join(file_name);
            fs::write(&path, &resource.data).map_err(|source| RenderError::Io {
                path: path.clone(),
                source,
            })?;
            // Rewrite every reference to this content id; references to
            // unknown ids are left untouched.
            let needle = format!("cid:{}", resource.content_id);
            body = body.replace(&needle, &path.to_string_lossy());
            resources.push(path);
        }

        let html_path = dir.join("message.html");
        fs::write(&html_path, body).map_err(|source| RenderError::Io {
            path: html_path.clone(),
            source,
        })?;
        debug!(%token, resources = resources.len(), "materialized rendering artifacts");

        Ok(Materialized {
            html_path: Some(html_path),
            resources,
        })
    }

    /// Scratch root, for cleanup by the embedding application.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Replace path-hostile characters so tokens and content ids are usable as
/// file names.
fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Map a media type to a file extension hint for display surfaces.
fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/gif" => ".gif",
        "image/svg+xml" => ".svg",
        "image/webp" => ".webp",
        _ => ".bin",
    }
}

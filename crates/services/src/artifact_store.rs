//! Artifact persistence under a fixed content root.
//!
//! Every successful pipeline run lands one UTF-8 text file named
//! `{yyyyMMdd_HHmmss}_{sanitized}`. Files are never mutated or deleted; the
//! one exception is the temporary audio spool used by the voice pipeline.

use crate::filename::sanitize;
use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// Handle to the content root. Obtained through [`ArtifactStore::open`],
/// which is the single place the directory gets created.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Open (and create if absent) the content root. Idempotent.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create content directory {:?}", root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save `content` under a timestamped, sanitized name and return the path.
    ///
    /// Two saves within the same clock second with the same sanitized name
    /// collide and the later write wins. Accepted limitation; callers run
    /// sequentially within a session.
    pub fn save(&self, content: &str, requested_name: &str, required_ext: &str) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let safe = sanitize(requested_name, required_ext);
        let path = self.root.join(format!("{stamp}_{safe}"));

        fs::write(&path, content)
            .with_context(|| format!("Failed to save artifact {:?}", path))?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "artifact saved");
        Ok(path)
    }

    /// Write an uploaded audio payload to a temporary path under the root so
    /// the transcription client can read it back as a file.
    pub fn spool_temp(&self, original_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let safe = sanitize(original_name, "");
        let path = self.root.join(format!("temp_{safe}"));
        fs::write(&path, bytes)
            .with_context(|| format!("Failed to spool temporary audio {:?}", path))?;
        Ok(path)
    }

    /// Best-effort removal of a temporary spool file.
    pub fn discard_temp(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path) {
            tracing::debug!(path = %path.display(), error = %e, "temp cleanup failed");
        }
    }
}

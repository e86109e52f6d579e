//! Helpers shared by the project commands.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use uigen_core::{ErrorPayload, PreviewConfig};
use uigen_preview::{PreviewSession, PreviewState};

/// Loads a project snapshot file into a fresh session.
///
/// A missing or empty file yields an empty project.
pub async fn open_project(path: &Path, config: PreviewConfig) -> Result<PreviewSession> {
    let snapshot = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "project file missing, starting empty");
            String::new()
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read project {}", path.display()));
        }
    };

    PreviewSession::from_snapshot(&snapshot, config)
        .with_context(|| format!("invalid project snapshot {}", path.display()))
}

/// Writes `contents` to `path`, creating parent directories.
pub async fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

/// Preview outcome as shown in command reports.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PreviewSummary {
    /// `empty`, `ready`, or `failed`
    pub status: &'static str,
    /// Entry point of the rendered bundle
    pub entry: Option<String>,
    /// Error shown in the preview panel
    pub error: Option<ErrorPayload>,
}

impl PreviewSummary {
    /// Summarizes a preview state.
    #[must_use]
    pub fn from_state(state: &PreviewState) -> Self {
        let entry = if let PreviewState::Ready { entry, .. } = state {
            Some(entry.clone())
        } else {
            None
        };
        Self {
            status: state.status(),
            entry,
            error: state.error().cloned(),
        }
    }
}

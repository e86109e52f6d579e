//! Render command implementation.
//!
//! Compiles a persisted project and renders it once in a preview frame.
//! The HTML document and the linked bundle can be written to files for
//! inspection in a browser.

use super::common::{PreviewSummary, open_project, write_file};
use crate::formatters::print_output;
use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use tracing::info;
use uigen_core::PreviewConfig;
use uigen_core::cli::{ExitCode, OutputFormat};

/// Outcome of one render.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RenderReport {
    /// Project snapshot that was rendered
    pub project: String,
    /// Preview outcome
    pub preview: PreviewSummary,
    /// Linked modules in bundle order
    pub modules: Vec<String>,
    /// Hosted modules the bundle imports
    pub externals: Vec<String>,
    /// Stylesheets merged into the styling layer
    pub stylesheets: Vec<String>,
    /// Where the HTML document was written
    pub document_path: Option<String>,
    /// Where the bundle was written
    pub bundle_path: Option<String>,
}

/// Runs the render command.
///
/// Returns [`ExitCode::ERROR`] when the preview ends in a failed state.
/// Output files are only written for a ready preview.
///
/// # Errors
///
/// Returns an error if the project cannot be read or an output file cannot
/// be written.
pub async fn run(
    project: &Path,
    out: Option<&Path>,
    bundle_out: Option<&Path>,
    config: PreviewConfig,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    info!(project = %project.display(), "rendering project");
    let mut session = open_project(project, config).await?;
    let state = session.refresh().clone();

    let mut report = RenderReport {
        project: project.display().to_string(),
        preview: PreviewSummary::from_state(&state),
        modules: Vec::new(),
        externals: Vec::new(),
        stylesheets: Vec::new(),
        document_path: None,
        bundle_path: None,
    };

    if let Some(bundle) = session.renderer().bundle() {
        report.modules = bundle.modules.iter().map(|m| m.identity.to_string()).collect();
        report.externals = bundle.externals.iter().map(|e| e.name.clone()).collect();
        report.stylesheets = bundle.styles.iter().map(|s| s.path.to_string()).collect();

        if state.is_ready()
            && let Some(path) = bundle_out
        {
            write_file(path, &bundle.code).await?;
            report.bundle_path = Some(path.display().to_string());
        }
    }

    if state.is_ready()
        && let Some(path) = out
        && let Some(document) = state.document()
    {
        write_file(path, document).await?;
        report.document_path = Some(path.display().to_string());
    }

    print_output(&report, output_format)?;

    if state.is_failed() {
        return Ok(ExitCode::ERROR);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn project(dir: &TempDir, files: &serde_json::Value) -> PathBuf {
        let path = dir.path().join("project.json");
        std::fs::write(&path, files.to_string()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_render_writes_outputs() {
        let dir = TempDir::new().unwrap();
        let path = project(
            &dir,
            &serde_json::json!({"/App.jsx": "export default () => <h1>Hi</h1>;"}),
        );
        let html = dir.path().join("preview.html");
        let js = dir.path().join("bundle.js");

        let code = run(
            &path,
            Some(&html),
            Some(&js),
            PreviewConfig::default(),
            OutputFormat::Json,
        )
        .await
        .unwrap();

        assert_eq!(code, ExitCode::SUCCESS);
        assert!(std::fs::read_to_string(html).unwrap().contains("<!DOCTYPE html>"));
        assert!(std::fs::read_to_string(js).unwrap().contains("__require"));
    }

    #[tokio::test]
    async fn test_render_failure_skips_outputs() {
        let dir = TempDir::new().unwrap();
        let path = project(&dir, &serde_json::json!({"/Other.jsx": "export default 1;"}));
        let html = dir.path().join("preview.html");

        let code = run(&path, Some(&html), None, PreviewConfig::default(), OutputFormat::Text)
            .await
            .unwrap();

        assert_eq!(code, ExitCode::ERROR);
        assert!(!html.exists());
    }
}

//! Config command implementation.
//!
//! Configuration is a TOML file, by default at:
//! - Linux: `~/.config/uigen/config.toml`
//! - macOS: `~/Library/Application Support/uigen/config.toml`
//! - Windows: `%APPDATA%\uigen\config.toml`
//!
//! The global `--config` flag points every command at another file.

use super::common::write_file;
use crate::actions::ConfigAction;
use crate::formatters::print_output;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use uigen_core::PreviewConfig;
use uigen_core::cli::{ExitCode, OutputFormat};

/// Effective configuration and where it came from.
#[derive(Debug, Clone, Serialize)]
pub struct ShowResult {
    /// File the values were read from, if any
    pub source: Option<String>,
    /// Effective values
    pub config: PreviewConfig,
}

/// Result of `config init`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InitResult {
    /// Whether a file was written
    pub success: bool,
    /// What happened
    pub message: String,
    /// Target file
    pub path: String,
}

/// Runs a config action.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, no configuration
/// directory can be determined, or the file cannot be written.
pub async fn run(
    action: ConfigAction,
    config_path: Option<&Path>,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    debug!(?action, "config action");
    match action {
        ConfigAction::Show => show_config(config_path, output_format),
        ConfigAction::Init { force } => init_config(config_path, force, output_format).await,
    }
}

fn show_config(config_path: Option<&Path>, output_format: OutputFormat) -> Result<ExitCode> {
    let config =
        PreviewConfig::load_or_default(config_path).context("failed to load configuration")?;
    let source = config_path
        .map(Path::to_path_buf)
        .or_else(|| PreviewConfig::default_path().filter(|p| p.is_file()))
        .map(|p| p.display().to_string());

    print_output(&ShowResult { source, config }, output_format)?;
    Ok(ExitCode::SUCCESS)
}

async fn init_config(
    config_path: Option<&Path>,
    force: bool,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let path = target_path(config_path)?;

    if path.exists() && !force {
        let result = InitResult {
            success: false,
            message: "configuration file already exists (use --force to overwrite)".to_string(),
            path: path.display().to_string(),
        };
        print_output(&result, output_format)?;
        return Ok(ExitCode::INVALID_INPUT);
    }

    let toml = PreviewConfig::default()
        .to_toml_string()
        .context("failed to serialize default configuration")?;
    write_file(&path, &toml).await?;
    debug!(path = %path.display(), "wrote default configuration");

    let result = InitResult {
        success: true,
        message: "configuration file created with default values".to_string(),
        path: path.display().to_string(),
    };
    print_output(&result, output_format)?;
    Ok(ExitCode::SUCCESS)
}

fn target_path(config_path: Option<&Path>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path.to_path_buf()),
        None => PreviewConfig::default_path().context("failed to determine config directory"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_writes_loadable_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uigen/config.toml");

        let code = run(ConfigAction::Init { force: false }, Some(&path), OutputFormat::Text)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(PreviewConfig::load(&path).unwrap(), PreviewConfig::default());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent]\nmax_steps = 7\n").unwrap();

        let code = run(ConfigAction::Init { force: false }, Some(&path), OutputFormat::Text)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::INVALID_INPUT);
        assert_eq!(PreviewConfig::load(&path).unwrap().agent.max_steps, 7);

        let code = run(ConfigAction::Init { force: true }, Some(&path), OutputFormat::Text)
            .await
            .unwrap();
        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(PreviewConfig::load(&path).unwrap(), PreviewConfig::default());
    }

    #[tokio::test]
    async fn test_show_rejects_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent]\nmax_steps = 0\n").unwrap();

        let err = run(ConfigAction::Show, Some(&path), OutputFormat::Json).await.unwrap_err();
        assert!(err.to_string().contains("failed to load configuration"));
    }
}

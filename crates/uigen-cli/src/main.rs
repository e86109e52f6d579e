//! UIGen CLI.
//!
//! Command-line front end over a preview session: render a persisted
//! project, replay agent tool calls against it, print the tool schema, and
//! manage the configuration file.
//!
//! # Examples
//!
//! ```bash
//! # Render a project and keep the document for a browser
//! uigen render project.json --out preview.html
//!
//! # Replay a scripted agent turn and save the result
//! uigen apply project.json --calls turn.jsonl --write
//!
//! # Tool definitions for the model provider
//! uigen --format json schema
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uigen_cli::ConfigAction;
use uigen_cli::commands::{apply, config, render, schema};
use uigen_core::PreviewConfig;
use uigen_core::cli::{ExitCode, OutputFormat};

/// UIGen - live preview of generated React components.
#[derive(Parser, Debug)]
#[command(name = "uigen")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true, env = "UIGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Output format (json, text, pretty)
    #[arg(long = "format", global = true, default_value = "pretty")]
    format: String,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a project snapshot and render it in a preview frame.
    ///
    /// The snapshot is a JSON object mapping paths to file contents.
    Render {
        /// Project snapshot file
        project: PathBuf,

        /// Write the preview HTML document here
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write the linked bundle here
        #[arg(long)]
        bundle_out: Option<PathBuf>,
    },

    /// Replay agent tool calls against a project snapshot.
    ///
    /// Calls are read one JSON object per line, e.g.
    /// `{"tool":"str_replace_editor","arguments":{"command":"view","path":"/"}}`.
    Apply {
        /// Project snapshot file (missing means empty project)
        project: PathBuf,

        /// Tool call script (JSON lines)
        #[arg(long)]
        calls: PathBuf,

        /// Use the reduced step ceiling of mock mode
        #[arg(long)]
        mock: bool,

        /// Save the project back to the snapshot file
        #[arg(long)]
        write: bool,
    },

    /// Print the agent tool definitions.
    Schema,

    /// Manage the configuration file.
    Config {
        /// Configuration action
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let exit_code = match execute_command(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::INVALID_INPUT
        }
    };

    std::process::exit(exit_code.as_i32());
}

/// Initializes logging to stderr.
///
/// `--verbose` forces debug level; otherwise `RUST_LOG` applies, falling
/// back to info.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Routes commands to their handlers.
///
/// Errors returned here are usage or configuration problems and map to
/// [`ExitCode::INVALID_INPUT`].
async fn execute_command(cli: Cli) -> Result<ExitCode> {
    let output_format = cli
        .format
        .parse::<OutputFormat>()
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Render {
            project,
            out,
            bundle_out,
        } => {
            let config = load_config(config_path)?;
            render::run(
                &project,
                out.as_deref(),
                bundle_out.as_deref(),
                config,
                output_format,
            )
            .await
        }
        Commands::Apply {
            project,
            calls,
            mock,
            write,
        } => {
            let config = load_config(config_path)?;
            apply::run(&project, &calls, mock, write, config, output_format).await
        }
        Commands::Schema => schema::run(output_format),
        Commands::Config { action } => config::run(action, config_path, output_format).await,
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<PreviewConfig> {
    PreviewConfig::load_or_default(path)
        .map_err(|e| anyhow::anyhow!("failed to load configuration: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_render() {
        let cli = Cli::parse_from(["uigen", "render", "project.json", "--out", "preview.html"]);
        if let Commands::Render {
            project,
            out,
            bundle_out,
        } = cli.command
        {
            assert_eq!(project, PathBuf::from("project.json"));
            assert_eq!(out, Some(PathBuf::from("preview.html")));
            assert_eq!(bundle_out, None);
        } else {
            panic!("Expected Render command");
        }
    }

    #[test]
    fn test_cli_parsing_apply() {
        let cli = Cli::parse_from([
            "uigen",
            "apply",
            "project.json",
            "--calls",
            "turn.jsonl",
            "--mock",
            "--write",
        ]);
        if let Commands::Apply {
            calls, mock, write, ..
        } = cli.command
        {
            assert_eq!(calls, PathBuf::from("turn.jsonl"));
            assert!(mock);
            assert!(write);
        } else {
            panic!("Expected Apply command");
        }
    }

    #[test]
    fn test_cli_apply_requires_calls() {
        let result = Cli::try_parse_from(["uigen", "apply", "project.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parsing_config() {
        let cli = Cli::parse_from(["uigen", "config", "init", "--force"]);
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Init { force: true }
            }
        ));

        let cli = Cli::parse_from(["uigen", "config", "show"]);
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "uigen",
            "schema",
            "--verbose",
            "--config",
            "/tmp/uigen.toml",
            "--format",
            "json",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/uigen.toml")));
        assert_eq!(cli.format, "json");
    }

    #[test]
    fn test_cli_output_format_default() {
        let cli = Cli::parse_from(["uigen", "schema"]);
        assert_eq!(cli.format, "pretty");
        assert!(!cli.verbose);
    }
}

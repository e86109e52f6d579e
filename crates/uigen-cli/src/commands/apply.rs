//! Apply command implementation.
//!
//! Replays a scripted agent turn against a persisted project: one JSON tool
//! call per line, executed in order under the configured step ceiling.
//! Ctrl-C cancels the turn; calls that already completed keep their effect.

use super::common::{PreviewSummary, open_project, write_file};
use crate::formatters::print_output;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uigen_core::PreviewConfig;
use uigen_core::cli::{ExitCode, OutputFormat};
use uigen_tools::{CallRecord, ScriptedSource, ToolResult, TurnOutcome};

/// One executed call as shown in the report.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CallReport {
    /// Tool that was called
    pub tool: String,
    /// Result relayed to the agent
    #[serde(flatten)]
    pub result: ToolResult,
}

impl From<&CallRecord> for CallReport {
    fn from(record: &CallRecord) -> Self {
        Self {
            tool: record.call.tool.clone(),
            result: record.result.clone(),
        }
    }
}

/// Outcome of one scripted turn.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ApplyReport {
    /// `completed`, `step-limit-reached`, or `cancelled`
    pub outcome: &'static str,
    /// Calls executed
    pub steps: usize,
    /// Executed calls that failed
    pub failures: usize,
    /// Calls left in the script
    pub skipped: usize,
    /// Executed calls in order
    pub calls: Vec<CallReport>,
    /// Preview after the turn
    pub preview: PreviewSummary,
    /// Whether the project file was updated
    pub written: bool,
}

/// Runs the apply command.
///
/// Returns [`ExitCode::ERROR`] if any call failed or the preview ends in a
/// failed state.
///
/// # Errors
///
/// Returns an error if the project or the call script cannot be read or
/// parsed, or the project cannot be written back.
pub async fn run(
    project: &Path,
    calls: &Path,
    mock: bool,
    write: bool,
    config: PreviewConfig,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    let mut session = open_project(project, config).await?;

    let script = tokio::fs::read_to_string(calls)
        .await
        .with_context(|| format!("failed to read tool calls {}", calls.display()))?;
    let mut source = ScriptedSource::from_json_lines(&script)
        .with_context(|| format!("invalid tool call script {}", calls.display()))?;
    info!(calls = source.remaining(), mock, "replaying agent turn");

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling turn");
            interrupt.cancel();
        }
    });

    let outcome = session.run_turn(&mut source, cancel, mock).await;
    watcher.abort();

    // The turn is over; the frame wait no longer stalls other tasks.
    let state = session.refresh().clone();
    if write {
        let snapshot = session.snapshot().context("failed to serialize project")?;
        write_file(project, &snapshot).await?;
        info!(project = %project.display(), "project written");
    }

    let report = ApplyReport {
        outcome: outcome_name(&outcome),
        steps: outcome.steps(),
        failures: outcome.failures(),
        skipped: source.remaining(),
        calls: outcome.calls().iter().map(CallReport::from).collect(),
        preview: PreviewSummary::from_state(&state),
        written: write,
    };
    print_output(&report, output_format)?;

    if report.failures > 0 || state.is_failed() {
        return Ok(ExitCode::ERROR);
    }
    Ok(ExitCode::SUCCESS)
}

const fn outcome_name(outcome: &TurnOutcome) -> &'static str {
    match outcome {
        TurnOutcome::Completed { .. } => "completed",
        TurnOutcome::StepLimitReached { .. } => "step-limit-reached",
        TurnOutcome::Cancelled { .. } => "cancelled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_names() {
        assert_eq!(outcome_name(&TurnOutcome::Completed { calls: vec![] }), "completed");
        assert_eq!(
            outcome_name(&TurnOutcome::StepLimitReached { calls: vec![], limit: 3 }),
            "step-limit-reached"
        );
        assert_eq!(outcome_name(&TurnOutcome::Cancelled { calls: vec![] }), "cancelled");
    }

    #[test]
    fn test_call_report_flattens_result() {
        let report = CallReport {
            tool: "str_replace_editor".to_string(),
            result: ToolResult::success("File created: /App.jsx"),
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(
            json,
            r#"{"tool":"str_replace_editor","ok":true,"result":"File created: /App.jsx"}"#
        );
    }
}

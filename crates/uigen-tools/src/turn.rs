//! Agent turn runner with a hard step ceiling and cancellation.
//!
//! A turn is a strict request/response loop: the source proposes one call,
//! the executor applies it and returns a result, and only then is the source
//! asked for the next call. No two calls ever run concurrently.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use uigen_tools::{ScriptedSource, StepBudget, ToolCall, TurnRunner};
//! use uigen_vfs::FileSystem;
//!
//! # tokio_test_block(async {
//! let mut fs = FileSystem::new();
//! let mut source = ScriptedSource::new(vec![ToolCall::editor(json!({
//!     "command": "create", "path": "/App.jsx", "content": "export default () => null;"
//! }))]);
//!
//! let outcome = TurnRunner::new(StepBudget::new(40)).run(&mut source, &mut fs).await;
//! assert!(outcome.is_completed());
//! assert!(fs.is_file("/App.jsx"));
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

use crate::adapter::ToolExecutor;
use crate::types::{ToolCall, ToolResult};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio_util::sync::CancellationToken;
use uigen_core::AgentConfig;

/// Produces the agent's next tool call.
///
/// Implementations wrap a model provider. `last` is the result of the
/// previous call in this turn, or `None` for the first call. Returning
/// `None` ends the turn.
#[async_trait]
pub trait ToolCallSource: Send {
    /// Returns the next call, or `None` when the agent is done.
    async fn next_call(&mut self, last: Option<&ToolResult>) -> Option<ToolCall>;
}

/// Maximum number of tool calls in one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepBudget {
    max_steps: usize,
}

impl StepBudget {
    /// Creates a budget. A zero budget is raised to one step.
    #[must_use]
    pub const fn new(max_steps: usize) -> Self {
        Self {
            max_steps: if max_steps == 0 { 1 } else { max_steps },
        }
    }

    /// Budget from configuration; `mock` selects the reduced ceiling.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_core::AgentConfig;
    /// use uigen_tools::StepBudget;
    ///
    /// let config = AgentConfig::default();
    /// assert_eq!(StepBudget::from_config(&config, false).max_steps(), 40);
    /// assert_eq!(StepBudget::from_config(&config, true).max_steps(), 4);
    /// ```
    #[must_use]
    pub const fn from_config(config: &AgentConfig, mock: bool) -> Self {
        Self::new(config.step_limit(mock))
    }

    /// The ceiling.
    #[must_use]
    pub const fn max_steps(&self) -> usize {
        self.max_steps
    }
}

impl Default for StepBudget {
    fn default() -> Self {
        Self::new(AgentConfig::DEFAULT_MAX_STEPS)
    }
}

/// One executed call and its result.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    /// Call as received
    pub call: ToolCall,
    /// Result relayed back to the agent
    pub result: ToolResult,
}

/// How a turn ended. Every variant carries the calls that were executed;
/// their effects on the VFS are kept in all cases.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The source ran out of calls
    Completed {
        /// Executed calls
        calls: Vec<CallRecord>,
    },
    /// The step ceiling was reached
    StepLimitReached {
        /// Executed calls
        calls: Vec<CallRecord>,
        /// The ceiling that was hit
        limit: usize,
    },
    /// The turn was cancelled
    Cancelled {
        /// Executed calls
        calls: Vec<CallRecord>,
    },
}

impl TurnOutcome {
    /// Executed calls in order.
    #[must_use]
    pub fn calls(&self) -> &[CallRecord] {
        match self {
            Self::Completed { calls }
            | Self::StepLimitReached { calls, .. }
            | Self::Cancelled { calls } => calls,
        }
    }

    /// Number of executed calls.
    #[must_use]
    pub fn steps(&self) -> usize {
        self.calls().len()
    }

    /// Number of executed calls that failed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.calls().iter().filter(|c| !c.result.ok).count()
    }

    /// Returns `true` if the source finished on its own.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Returns `true` if the step ceiling ended the turn.
    #[must_use]
    pub const fn is_step_limited(&self) -> bool {
        matches!(self, Self::StepLimitReached { .. })
    }

    /// Returns `true` if the turn was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

/// Drives one agent turn.
#[derive(Debug, Clone)]
pub struct TurnRunner {
    budget: StepBudget,
    cancel: CancellationToken,
}

impl TurnRunner {
    /// Creates a runner with its own cancellation token.
    #[must_use]
    pub fn new(budget: StepBudget) -> Self {
        Self {
            budget,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses an externally owned cancellation token, e.g. one cancelled when
    /// the user sends a new prompt.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this runner's turns.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The step ceiling.
    #[must_use]
    pub const fn budget(&self) -> StepBudget {
        self.budget
    }

    /// Runs a turn to completion, ceiling, or cancellation.
    ///
    /// Waiting on the source is raced against cancellation. A call that has
    /// already been received is always executed and recorded before the
    /// runner stops.
    pub async fn run<S, E>(&self, source: &mut S, executor: &mut E) -> TurnOutcome
    where
        S: ToolCallSource + ?Sized,
        E: ToolExecutor + ?Sized,
    {
        let limit = self.budget.max_steps();
        let mut calls: Vec<CallRecord> = Vec::new();
        let mut last: Option<ToolResult> = None;

        loop {
            if self.cancel.is_cancelled() {
                tracing::info!(steps = calls.len(), "agent turn cancelled");
                return TurnOutcome::Cancelled { calls };
            }
            if calls.len() >= limit {
                tracing::warn!(limit, "agent turn reached step limit");
                return TurnOutcome::StepLimitReached { calls, limit };
            }

            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => None,
                call = source.next_call(last.as_ref()) => Some(call),
            };
            let call = match next {
                None => {
                    tracing::info!(steps = calls.len(), "agent turn cancelled");
                    return TurnOutcome::Cancelled { calls };
                }
                Some(None) => {
                    tracing::info!(steps = calls.len(), "agent turn completed");
                    return TurnOutcome::Completed { calls };
                }
                Some(Some(call)) => call,
            };

            let result = executor.execute(&call);
            tracing::debug!(
                step = calls.len() + 1,
                tool = %call.tool,
                ok = result.ok,
                "tool call executed"
            );
            last = Some(result.clone());
            calls.push(CallRecord { call, result });
        }
    }
}

/// Replays a fixed list of calls.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    calls: VecDeque<ToolCall>,
    served: usize,
}

impl ScriptedSource {
    /// Creates a source that yields `calls` in order.
    #[must_use]
    pub fn new(calls: impl IntoIterator<Item = ToolCall>) -> Self {
        Self {
            calls: calls.into_iter().collect(),
            served: 0,
        }
    }

    /// Parses one JSON tool call per line. Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns the JSON error of the first malformed line.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_tools::ScriptedSource;
    ///
    /// let text = r#"{"tool":"file_manager","arguments":{"command":"delete","path":"/a"}}
    ///
    /// {"tool":"str_replace_editor","arguments":{"command":"view","path":"/"}}"#;
    /// assert_eq!(ScriptedSource::from_json_lines(text).unwrap().remaining(), 2);
    /// ```
    pub fn from_json_lines(text: &str) -> Result<Self, serde_json::Error> {
        let calls = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str::<ToolCall>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(calls))
    }

    /// Calls not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.calls.len()
    }

    /// Calls handed out so far.
    #[must_use]
    pub const fn served(&self) -> usize {
        self.served
    }
}

#[async_trait]
impl ToolCallSource for ScriptedSource {
    async fn next_call(&mut self, _last: Option<&ToolResult>) -> Option<ToolCall> {
        let call = self.calls.pop_front()?;
        self.served += 1;
        Some(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uigen_vfs::FileSystem;

    fn create(path: &str) -> ToolCall {
        ToolCall::editor(json!({"command": "create", "path": path, "content": ""}))
    }

    #[test]
    fn test_zero_budget_is_raised() {
        assert_eq!(StepBudget::new(0).max_steps(), 1);
        assert_eq!(StepBudget::default().max_steps(), 40);
    }

    #[tokio::test]
    async fn test_completed_turn_records_calls() {
        let mut fs = FileSystem::new();
        let mut source = ScriptedSource::new(vec![create("/a.js"), create("/a.js")]);
        let outcome = TurnRunner::new(StepBudget::new(10))
            .run(&mut source, &mut fs)
            .await;

        assert!(outcome.is_completed());
        assert_eq!(outcome.steps(), 2);
        assert_eq!(outcome.failures(), 1);
    }

    #[tokio::test]
    async fn test_step_limit_stops_before_asking_again() {
        let mut fs = FileSystem::new();
        let mut source = ScriptedSource::new((0..6).map(|i| create(&format!("/f{i}.js"))));
        let outcome = TurnRunner::new(StepBudget::new(4))
            .run(&mut source, &mut fs)
            .await;

        assert!(outcome.is_step_limited());
        assert_eq!(outcome.steps(), 4);
        assert_eq!(source.served(), 4);
        assert_eq!(fs.file_count(), 4);
    }

    #[tokio::test]
    async fn test_pre_cancelled_turn_runs_nothing() {
        let mut fs = FileSystem::new();
        let mut source = ScriptedSource::new(vec![create("/a.js")]);
        let runner = TurnRunner::new(StepBudget::new(4));
        runner.cancellation_token().cancel();

        let outcome = runner.run(&mut source, &mut fs).await;
        assert!(outcome.is_cancelled());
        assert_eq!(source.served(), 0);
        assert!(fs.is_empty());
    }

    #[test]
    fn test_json_lines_error() {
        assert!(ScriptedSource::from_json_lines("{not json}").is_err());
    }
}

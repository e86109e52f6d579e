//! Integration tests for agent turns over the tool protocol.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uigen_core::AgentConfig;
use uigen_tools::{
    ScriptedSource, StepBudget, ToolCall, ToolCallSource, ToolResult, TurnRunner, execute,
};
use uigen_vfs::{FileSystem, FilesBuilder};

/// Source that yields a few calls and then waits forever, like a model
/// that stalls mid-turn.
struct StallingSource {
    calls: Vec<ToolCall>,
    seen_results: Vec<bool>,
}

#[async_trait]
impl ToolCallSource for StallingSource {
    async fn next_call(&mut self, last: Option<&ToolResult>) -> Option<ToolCall> {
        if let Some(result) = last {
            self.seen_results.push(result.ok);
        }
        if self.calls.is_empty() {
            std::future::pending::<()>().await;
        }
        Some(self.calls.remove(0))
    }
}

/// Source that keeps fixing its own mistakes based on results, like an agent
/// retrying with corrected arguments.
struct RetryingSource {
    attempts: usize,
}

#[async_trait]
impl ToolCallSource for RetryingSource {
    async fn next_call(&mut self, last: Option<&ToolResult>) -> Option<ToolCall> {
        self.attempts += 1;
        match (self.attempts, last) {
            (1, _) => Some(ToolCall::editor(
                json!({"command": "str_replace", "path": "/App.jsx", "old_str": "Hello"}),
            )),
            (2, Some(result)) if !result.ok => Some(ToolCall::editor(json!({
                "command": "str_replace",
                "path": "/App.jsx",
                "old_str": "<h1>Hello</h1>",
                "new_str": "<h1>Hi</h1>"
            }))),
            _ => None,
        }
    }
}

fn app() -> FileSystem {
    FilesBuilder::new()
        .add_file(
            "/App.jsx",
            "export default function App() {\n  return <div><h1>Hello</h1><p>Hello again</p></div>;\n}\n",
        )
        .build()
        .unwrap()
}

#[test]
fn test_ambiguous_match_leaves_content_unchanged() {
    let mut fs = app();
    let before = fs.serialize().unwrap();

    let result = execute(
        &mut fs,
        &ToolCall::editor(json!({"command": "str_replace", "path": "/App.jsx", "old_str": "Hello", "new_str": "Bye"})),
    );

    assert!(!result.ok);
    assert!(result.error.unwrap().starts_with("AmbiguousMatch"));
    assert_eq!(fs.serialize().unwrap(), before);
}

#[tokio::test]
async fn test_agent_retries_after_failed_result() {
    let mut fs = app();
    let mut source = RetryingSource { attempts: 0 };
    let outcome = TurnRunner::new(StepBudget::new(10))
        .run(&mut source, &mut fs)
        .await;

    assert!(outcome.is_completed());
    assert_eq!(outcome.steps(), 2);
    assert_eq!(outcome.failures(), 1);
    assert!(fs.read_file("/App.jsx").unwrap().contains("<h1>Hi</h1>"));
}

#[tokio::test]
async fn test_step_ceiling_keeps_completed_mutations() {
    let mut fs = FileSystem::new();
    let config = AgentConfig::default();
    let calls = (0..10).map(|i| {
        ToolCall::editor(json!({
            "command": "create",
            "path": format!("/components/C{i}.jsx"),
            "content": format!("export default () => <p>{i}</p>;")
        }))
    });
    let mut source = ScriptedSource::new(calls);

    let outcome = TurnRunner::new(StepBudget::from_config(&config, true))
        .run(&mut source, &mut fs)
        .await;

    assert!(outcome.is_step_limited());
    assert_eq!(outcome.steps(), 4);
    assert_eq!(source.remaining(), 6);
    assert_eq!(fs.file_count(), 4);
    assert!(fs.is_file("/components/C3.jsx"));
    assert!(!fs.exists("/components/C4.jsx"));
}

#[tokio::test]
async fn test_cancellation_ends_stalled_turn_and_keeps_effects() {
    let mut fs = FileSystem::new();
    let token = CancellationToken::new();
    let runner = TurnRunner::new(StepBudget::new(40)).with_cancellation(token.clone());
    let mut source = StallingSource {
        calls: vec![
            ToolCall::editor(json!({"command": "create", "path": "/App.jsx", "content": "v1"})),
            ToolCall::editor(json!({"command": "create", "path": "/App.jsx", "content": "v2"})),
        ],
        seen_results: Vec::new(),
    };

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });

    let outcome = tokio::time::timeout(Duration::from_secs(5), runner.run(&mut source, &mut fs))
        .await
        .expect("cancellation must end the turn");
    canceller.await.unwrap();

    assert!(outcome.is_cancelled());
    assert_eq!(outcome.steps(), 2);
    assert_eq!(source.seen_results, vec![true, false]);
    assert_eq!(fs.read_file("/App.jsx").unwrap(), "v1");
}

#[tokio::test]
async fn test_calls_are_sequential_results_feed_back() {
    let mut fs = FileSystem::new();
    let mut source = StallingSource {
        calls: vec![ToolCall::manager(json!({"command": "delete", "path": "/ghost"}))],
        seen_results: Vec::new(),
    };
    let runner = TurnRunner::new(StepBudget::new(1));
    let outcome = runner.run(&mut source, &mut fs).await;

    assert!(outcome.is_step_limited());
    assert_eq!(outcome.failures(), 1);
    assert!(source.seen_results.is_empty());
}

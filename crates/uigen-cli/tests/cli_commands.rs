//! Integration tests for the project commands over files on disk.

use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;
use uigen_cli::commands::{apply, render};
use uigen_core::PreviewConfig;
use uigen_core::cli::{ExitCode, OutputFormat};

fn write_calls(dir: &TempDir, calls: &[serde_json::Value]) -> PathBuf {
    let path = dir.path().join("turn.jsonl");
    let lines: Vec<String> = calls.iter().map(ToString::to_string).collect();
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

fn editor(arguments: serde_json::Value) -> serde_json::Value {
    json!({"tool": "str_replace_editor", "arguments": arguments})
}

fn read_project(path: &PathBuf) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_apply_then_render_from_empty_project() {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("project.json");
    let calls = write_calls(
        &dir,
        &[
            editor(json!({
                "command": "create",
                "path": "/components/Card.jsx",
                "content": "export default ({ title }) => <div className=\"card\">{title}</div>;",
            })),
            editor(json!({
                "command": "create",
                "path": "/App.jsx",
                "content": "import Card from '@/components/Card';\nexport default () => <Card title=\"Hi\" />;",
            })),
        ],
    );

    let code = apply::run(&project, &calls, false, true, PreviewConfig::default(), OutputFormat::Json)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);

    let saved = read_project(&project);
    assert!(saved["/App.jsx"].as_str().unwrap().contains("<Card"));
    assert!(saved["/components/Card.jsx"].is_string());

    let html = dir.path().join("preview.html");
    let code = render::run(&project, Some(&html), None, PreviewConfig::default(), OutputFormat::Json)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(std::fs::read_to_string(html).unwrap().contains("createRoot"));
}

#[tokio::test]
async fn test_apply_failed_call_sets_error_code() {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("project.json");
    std::fs::write(&project, json!({"/App.jsx": "export default () => null; // null"}).to_string()).unwrap();
    let calls = write_calls(
        &dir,
        &[editor(json!({
            "command": "str_replace",
            "path": "/App.jsx",
            "old_str": "null",
            "new_str": "<p/>",
        }))],
    );

    let code = apply::run(&project, &calls, false, true, PreviewConfig::default(), OutputFormat::Text)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::ERROR);
    // The ambiguous edit changed nothing.
    assert_eq!(read_project(&project)["/App.jsx"], "export default () => null; // null");
}

#[tokio::test]
async fn test_apply_without_write_leaves_project() {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("project.json");
    let calls = write_calls(
        &dir,
        &[editor(json!({
            "command": "create",
            "path": "/App.jsx",
            "content": "export default () => <main/>;",
        }))],
    );

    let code = apply::run(&project, &calls, false, false, PreviewConfig::default(), OutputFormat::Text)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::SUCCESS);
    assert!(!project.exists());
}

#[tokio::test]
async fn test_apply_mock_ceiling_stops_turn() {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("project.json");
    let script: Vec<serde_json::Value> = (0..6)
        .map(|i| {
            editor(json!({
                "command": "create",
                "path": format!("/C{i}.jsx"),
                "content": "export default 1;",
            }))
        })
        .collect();
    let calls = write_calls(&dir, &script);
    let config = PreviewConfig::builder().mock_max_steps(2).build();

    apply::run(&project, &calls, true, true, config, OutputFormat::Text)
        .await
        .unwrap();

    let saved = read_project(&project);
    assert!(saved["/C0.jsx"].is_string());
    assert!(saved["/C1.jsx"].is_string());
    assert!(saved.get("/C2.jsx").is_none());
}

#[tokio::test]
async fn test_malformed_script_is_an_error() {
    let dir = TempDir::new().unwrap();
    let calls = dir.path().join("turn.jsonl");
    std::fs::write(&calls, "{not json}").unwrap();

    let err = apply::run(
        &dir.path().join("project.json"),
        &calls,
        false,
        false,
        PreviewConfig::default(),
        OutputFormat::Text,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("invalid tool call script"));
}

#[tokio::test]
async fn test_render_unsupported_import_fails() {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("project.json");
    std::fs::write(
        &project,
        json!({"/App.jsx": "import pad from 'left-pad';\nexport default pad;"}).to_string(),
    )
    .unwrap();

    let code = render::run(&project, None, None, PreviewConfig::default(), OutputFormat::Pretty)
        .await
        .unwrap();
    assert_eq!(code, ExitCode::ERROR);
}

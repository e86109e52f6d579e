//! Integration tests for the project file system.
//!
//! Covers snapshot round trips, atomic failure behavior, and change
//! notification across whole editing sessions.

use std::sync::{Arc, Mutex};
use uigen_vfs::{ChangeKind, CreateOptions, FileSystem, FilesBuilder, VfsEvent};

fn project() -> FileSystem {
    FilesBuilder::new()
        .add_file(
            "/App.jsx",
            "import Card from '@/components/Card';\nexport default function App() {\n  return <Card title=\"Hi\" />;\n}\n",
        )
        .add_file(
            "/components/Card.jsx",
            "export default function Card({ title }) {\n  return <div className=\"p-4\">{title}</div>;\n}\n",
        )
        .add_file("/components/ui/Badge.tsx", "export const Badge = (p: { n: number }) => <b>{p.n}</b>;\n")
        .add_file("/styles/index.css", "body { margin: 0; }\n")
        .add_file("/empty.js", "")
        .add_dir("/assets")
        .build()
        .unwrap()
}

fn record(fs: &mut FileSystem) -> Arc<Mutex<Vec<VfsEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    fs.subscribe(Arc::new(move |event| sink.lock().unwrap().push(event.clone())));
    events
}

/// deserialize(serialize(V)) reproduces every path, content, and empty directory
#[test]
fn test_snapshot_round_trip_preserves_tree() {
    let fs = project();
    let json = fs.serialize().unwrap();
    let restored = FileSystem::deserialize(&json).unwrap();

    assert_eq!(restored, fs);
    assert_eq!(restored.read_file("/empty.js").unwrap(), "");
    assert!(restored.is_dir("/assets"));
    assert_eq!(restored.serialize().unwrap(), json);
}

/// Unicode and control characters survive the JSON encoding
#[test]
fn test_snapshot_round_trip_special_content() {
    let mut fs = FileSystem::new();
    fs.create_file("/i18n.js", "export const hi = \"héllo 👋\\n\";\n\t\"quoted\"\r\n")
        .unwrap();
    let restored = FileSystem::deserialize(&fs.serialize().unwrap()).unwrap();
    assert_eq!(restored, fs);
}

#[test]
fn test_failed_create_is_byte_identical() {
    let mut fs = project();
    let before = fs.serialize().unwrap();

    assert!(fs.create_file("/App.jsx", "overwritten").unwrap_err().is_conflict());
    assert!(fs.create_file("/components", "x").unwrap_err().is_conflict());

    assert_eq!(fs.serialize().unwrap(), before);
}

#[test]
fn test_directory_rename_leaves_no_old_paths() {
    let mut fs = project();
    fs.rename("/components", "/src/components").unwrap();

    let paths: Vec<String> = fs.files().map(|(p, _)| p.to_string()).collect();
    assert!(paths.iter().all(|p| !p.starts_with("/components")));
    assert!(paths.contains(&"/src/components/ui/Badge.tsx".to_string()));
    assert!(fs.is_dir("/src"));
    assert_eq!(fs.file_count(), 5);
}

#[test]
fn test_rename_into_missing_parent_creates_it() {
    let mut fs = project();
    fs.move_node("/empty.js", "/lib/util/empty.js").unwrap();
    assert!(fs.is_dir("/lib/util"));
    assert!(fs.is_file("/lib/util/empty.js"));
}

#[test]
fn test_rename_under_file_is_rejected_atomically() {
    let mut fs = project();
    let before = fs.clone();
    let err = fs.rename("/empty.js", "/App.jsx/empty.js").unwrap_err();
    assert!(err.is_invalid_path());
    assert_eq!(fs, before);
}

/// One notification per successful mutation, delivered after the change applies
#[test]
fn test_event_sequence_for_editing_session() {
    let mut fs = FileSystem::new();
    let events = record(&mut fs);

    fs.create_file("/App.jsx", "v1").unwrap();
    fs.update_file("/App.jsx", "v2").unwrap();
    fs.create_file_with("/components/Card.jsx", "", CreateOptions::with_parents())
        .unwrap();
    fs.rename("/components", "/ui").unwrap();
    fs.delete("/ui").unwrap();
    let _ = fs.delete("/ui");

    let kinds: Vec<ChangeKind> = events.lock().unwrap().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ChangeKind::Created,
            ChangeKind::Updated,
            ChangeKind::Created,
            ChangeKind::Renamed,
            ChangeKind::Deleted,
        ]
    );
}

/// Listeners observe the applied state, never a half-applied rename
#[test]
fn test_listener_sees_applied_state_via_shared_snapshot() {
    let mut fs = project();
    let events = record(&mut fs);
    fs.rename("/components/ui", "/ui").unwrap();

    let events = events.lock().unwrap();
    let renamed = &events[0];
    assert_eq!(renamed.kind, ChangeKind::Renamed);
    assert_eq!(renamed.paths[0].as_str(), "/components/ui");
    assert_eq!(renamed.paths[1].as_str(), "/ui");
    assert!(fs.is_file("/ui/Badge.tsx"));
}

#[test]
fn test_hydrate_replaces_project() {
    let mut fs = project();
    let events = record(&mut fs);
    fs.hydrate(r#"{"/index.jsx": "export default () => null;"}"#).unwrap();

    assert_eq!(fs.file_count(), 1);
    assert!(!fs.exists("/App.jsx"));
    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ChangeKind::Hydrated);
}

//! Flat JSON snapshots of a [`FileSystem`].
//!
//! A snapshot is a single JSON object keyed by absolute path. Files map to
//! their content and directories with no children map to `null`; directories
//! that contain something are implied by their descendants.
//!
//! ```json
//! {
//!   "/App.jsx": "export default function App() { return <div/>; }",
//!   "/assets": null
//! }
//! ```
//!
//! Hydration also accepts the node-record form
//! `{"type": "file", "content": "..."}` / `{"type": "directory"}` per entry.

use crate::types::{Result, VfsError, VfsPath};
use crate::vfs::{CreateOptions, FileSystem};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotEntry {
    Content(String),
    Record(NodeRecord),
}

#[derive(Debug, Deserialize)]
struct NodeRecord {
    #[serde(rename = "type")]
    kind: RecordKind,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RecordKind {
    File,
    Directory,
}

impl FileSystem {
    /// Serializes the tree to a flat JSON object.
    ///
    /// # Errors
    ///
    /// Returns `VfsError::InvalidSnapshot` if JSON encoding fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_vfs::FileSystem;
    ///
    /// let mut fs = FileSystem::new();
    /// fs.create_file("/App.jsx", "hi").unwrap();
    /// fs.create_dir("/assets").unwrap();
    ///
    /// let json = fs.serialize().unwrap();
    /// assert_eq!(json, r#"{"/App.jsx":"hi","/assets":null}"#);
    /// ```
    pub fn serialize(&self) -> Result<String> {
        serde_json::to_string(&self.to_snapshot()).map_err(|e| VfsError::InvalidSnapshot {
            message: e.to_string(),
        })
    }

    /// Returns the snapshot as a path-ordered map.
    #[must_use]
    pub fn to_snapshot(&self) -> BTreeMap<String, Option<String>> {
        self.nodes()
            .filter(|node| !node.path.is_root())
            .filter_map(|node| match node.content() {
                Some(content) => Some((node.path.to_string(), Some(content.to_string()))),
                None if self.list_dir(&node.path).is_ok_and(|c| c.is_empty()) => {
                    Some((node.path.to_string(), None))
                }
                None => None,
            })
            .collect()
    }

    /// Builds a file system from a snapshot.
    ///
    /// Empty or whitespace-only input (and `null`) yields an empty tree.
    ///
    /// # Errors
    ///
    /// Returns `VfsError::InvalidSnapshot` if the input is not a JSON
    /// object, an entry has an unexpected shape, a key is not a valid path,
    /// or two entries contradict each other (a file used as a directory).
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_vfs::FileSystem;
    ///
    /// let fs = FileSystem::deserialize(r#"{"/components/Card.jsx": "card"}"#).unwrap();
    /// assert!(fs.is_dir("/components"));
    ///
    /// assert!(FileSystem::deserialize("   ").unwrap().is_empty());
    /// assert!(FileSystem::deserialize("[1, 2]").is_err());
    /// ```
    pub fn deserialize(snapshot: &str) -> Result<Self> {
        if snapshot.trim().is_empty() {
            return Ok(Self::new());
        }

        let value: serde_json::Value = serde_json::from_str(snapshot).map_err(invalid)?;
        let entries: BTreeMap<String, Option<SnapshotEntry>> = match value {
            serde_json::Value::Null => return Ok(Self::new()),
            serde_json::Value::Object(_) => serde_json::from_value(value).map_err(invalid)?,
            other => {
                return Err(VfsError::InvalidSnapshot {
                    message: format!("expected a JSON object, found {}", json_type(&other)),
                });
            }
        };

        let mut fs = Self::new();
        for (key, entry) in entries {
            let path = VfsPath::new(&key).map_err(|e| VfsError::InvalidSnapshot {
                message: e.to_string(),
            })?;
            if path.is_root() {
                continue;
            }
            let outcome = match entry {
                Some(SnapshotEntry::Content(content)) => {
                    fs.create_file_with(&path, content, CreateOptions::with_parents())
                }
                Some(SnapshotEntry::Record(NodeRecord {
                    kind: RecordKind::File,
                    content,
                })) => fs.create_file_with(
                    &path,
                    content.unwrap_or_default(),
                    CreateOptions::with_parents(),
                ),
                Some(SnapshotEntry::Record(NodeRecord {
                    kind: RecordKind::Directory,
                    ..
                }))
                | None => fs.create_dir_all(&path),
            };
            outcome.map_err(|e| VfsError::InvalidSnapshot {
                message: format!("entry '{key}': {e}"),
            })?;
        }

        tracing::debug!(files = fs.file_count(), "hydrated file system from snapshot");
        Ok(fs)
    }

    /// Replaces the current tree with a snapshot, keeping subscribers.
    ///
    /// Subscribers receive a single `Hydrated` event. On error the current
    /// tree is left unchanged.
    ///
    /// # Errors
    ///
    /// See [`deserialize`](Self::deserialize).
    pub fn hydrate(&mut self, snapshot: &str) -> Result<()> {
        let fresh = Self::deserialize(snapshot)?;
        self.replace_tree(fresh);
        Ok(())
    }
}

fn invalid(error: serde_json::Error) -> VfsError {
    VfsError::InvalidSnapshot {
        message: error.to_string(),
    }
}

const fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

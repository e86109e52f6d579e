//! Agent tool protocol for the UIGen virtual file system.
//!
//! Two tools are exposed to the model:
//!
//! - `str_replace_editor`: view, create, `str_replace`, and insert
//! - `file_manager`: rename/move and delete
//!
//! Raw calls are validated into [`ToolCommand`] and executed against a
//! [`FileSystem`](uigen_vfs::FileSystem). Every call yields a [`ToolResult`];
//! errors never escape as Rust errors or panics. [`TurnRunner`] drives a whole
//! agent turn under a step ceiling with cancellation.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use uigen_tools::{ToolCall, execute};
//! use uigen_vfs::FileSystem;
//!
//! let mut fs = FileSystem::new();
//! let result = execute(&mut fs, &ToolCall::editor(json!({"command": "view", "path": "/nope"})));
//!
//! assert!(!result.ok);
//! assert!(result.error.unwrap().contains("not found"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod adapter;
pub mod error;
pub mod schema;
pub mod turn;
pub mod types;

pub use adapter::{ToolExecutor, execute, run};
pub use error::{Result, ToolError};
pub use schema::{ToolDefinition, tool_definitions};
pub use turn::{CallRecord, ScriptedSource, StepBudget, ToolCallSource, TurnOutcome, TurnRunner};
pub use types::{
    EDITOR_TOOL, EditorCommand, MANAGER_TOOL, ManagerCommand, ToolCall, ToolCommand, ToolResult,
};

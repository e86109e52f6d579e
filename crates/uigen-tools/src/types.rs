//! Tool call wire types and validated commands.
//!
//! Agents send loosely shaped JSON. [`ToolCommand::parse`] checks it once
//! and produces a closed enum, so execution never has to look at raw
//! arguments again.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use uigen_tools::{EditorCommand, ToolCall, ToolCommand};
//!
//! let call = ToolCall::editor(json!({
//!     "command": "create",
//!     "path": "/App.jsx",
//!     "file_text": "export default () => null;"
//! }));
//!
//! let command = ToolCommand::parse(&call).unwrap();
//! assert!(matches!(command, ToolCommand::Editor(EditorCommand::Create { .. })));
//! ```

use crate::error::{Result, ToolError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire name of the file editing tool.
pub const EDITOR_TOOL: &str = "str_replace_editor";

/// Wire name of the file management tool.
pub const MANAGER_TOOL: &str = "file_manager";

/// One request from the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name
    #[serde(alias = "name")]
    pub tool: String,

    /// Raw arguments as sent by the agent
    #[serde(default, alias = "args", alias = "input")]
    pub arguments: Value,
}

impl ToolCall {
    /// Creates a call to any tool.
    #[must_use]
    pub fn new(tool: impl Into<String>, arguments: Value) -> Self {
        Self {
            tool: tool.into(),
            arguments,
        }
    }

    /// Creates a call to the editor tool.
    #[must_use]
    pub fn editor(arguments: Value) -> Self {
        Self::new(EDITOR_TOOL, arguments)
    }

    /// Creates a call to the manager tool.
    #[must_use]
    pub fn manager(arguments: Value) -> Self {
        Self::new(MANAGER_TOOL, arguments)
    }
}

/// Structured outcome of a tool call, relayed back to the agent.
///
/// # Examples
///
/// ```
/// use uigen_tools::ToolResult;
///
/// let result = ToolResult::success("File created: /App.jsx");
/// let json = serde_json::to_string(&result).unwrap();
/// assert_eq!(json, r#"{"ok":true,"result":"File created: /App.jsx"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the call succeeded
    pub ok: bool,

    /// Output for the agent (confirmation, file view, or listing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,

    /// Error message when `ok` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Successful result with output.
    #[must_use]
    pub fn success(result: impl Into<String>) -> Self {
        Self {
            ok: true,
            result: Some(result.into()),
            error: None,
        }
    }

    /// Failed result with a message.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

impl From<&ToolError> for ToolResult {
    fn from(error: &ToolError) -> Self {
        Self::failure(format!("{}: {error}", error.code()))
    }
}

/// Validated editor tool command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    /// Show a file with line numbers, or list a directory
    View {
        /// Target path
        path: String,
        /// Optional 1-based inclusive line window; `None` end means EOF
        view_range: Option<(usize, Option<usize>)>,
    },
    /// Create a new file, making parent directories as needed
    Create {
        /// Target path
        path: String,
        /// Initial content
        content: String,
    },
    /// Replace the single occurrence of `old_str`
    StrReplace {
        /// Target path
        path: String,
        /// Text to find; must occur exactly once
        old_str: String,
        /// Replacement text
        new_str: String,
    },
    /// Insert text after a line (0 inserts at the top)
    Insert {
        /// Target path
        path: String,
        /// Line after which to insert
        insert_line: usize,
        /// Text to insert
        new_str: String,
    },
}

/// Validated manager tool command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerCommand {
    /// Move a file or directory
    Rename {
        /// Source path
        path: String,
        /// Destination path
        new_path: String,
    },
    /// Delete a file or directory recursively
    Delete {
        /// Target path
        path: String,
    },
}

/// A validated call to one of the two tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    /// `str_replace_editor`
    Editor(EditorCommand),
    /// `file_manager`
    Manager(ManagerCommand),
}

impl ToolCommand {
    /// Validates a raw call.
    ///
    /// Arguments may be a JSON object or a string holding one. Unknown
    /// fields are ignored.
    ///
    /// # Errors
    ///
    /// - `UnknownTool` for a tool name other than the two supported ones
    /// - `UnknownCommand` for an unsupported `command`
    /// - `MissingArgument` / `InvalidArgument` naming the offending field
    pub fn parse(call: &ToolCall) -> Result<Self> {
        if call.tool != EDITOR_TOOL && call.tool != MANAGER_TOOL {
            return Err(ToolError::UnknownTool {
                name: call.tool.clone(),
            });
        }
        let args = Args::from_value(&call.arguments)?;
        let command = args.required_str("command", &call.tool)?;

        if call.tool == EDITOR_TOOL {
            parse_editor(&args, &command).map(Self::Editor)
        } else {
            parse_manager(&args, &command).map(Self::Manager)
        }
    }

    /// Command name as it appears on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Editor(EditorCommand::View { .. }) => "view",
            Self::Editor(EditorCommand::Create { .. }) => "create",
            Self::Editor(EditorCommand::StrReplace { .. }) => "str_replace",
            Self::Editor(EditorCommand::Insert { .. }) => "insert",
            Self::Manager(ManagerCommand::Rename { .. }) => "rename",
            Self::Manager(ManagerCommand::Delete { .. }) => "delete",
        }
    }

    /// Returns `true` if executing the command can change the VFS.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        !matches!(self, Self::Editor(EditorCommand::View { .. }))
    }
}

fn parse_editor(args: &Args, command: &str) -> Result<EditorCommand> {
    match command {
        "view" => Ok(EditorCommand::View {
            path: args.required_str("path", command)?,
            view_range: args.view_range()?,
        }),
        "create" => Ok(EditorCommand::Create {
            path: args.required_str("path", command)?,
            content: args
                .optional_str("content")?
                .or(args.optional_str("file_text")?)
                .unwrap_or_default(),
        }),
        "str_replace" => Ok(EditorCommand::StrReplace {
            path: args.required_str("path", command)?,
            old_str: args.required_str("old_str", command)?,
            new_str: args.optional_str("new_str")?.unwrap_or_default(),
        }),
        "insert" => Ok(EditorCommand::Insert {
            path: args.required_str("path", command)?,
            insert_line: args.required_line("insert_line", command)?,
            new_str: args.required_str("new_str", command)?,
        }),
        other => Err(ToolError::UnknownCommand {
            tool: EDITOR_TOOL.to_string(),
            command: other.to_string(),
        }),
    }
}

fn parse_manager(args: &Args, command: &str) -> Result<ManagerCommand> {
    match command {
        "rename" | "move" => Ok(ManagerCommand::Rename {
            path: args.required_str("path", command)?,
            new_path: args.required_str("new_path", command)?,
        }),
        "delete" => Ok(ManagerCommand::Delete {
            path: args.required_str("path", command)?,
        }),
        other => Err(ToolError::UnknownCommand {
            tool: MANAGER_TOOL.to_string(),
            command: other.to_string(),
        }),
    }
}

/// Lenient view over the argument object.
struct Args(Map<String, Value>);

impl Args {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map.clone())),
            Value::String(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => Ok(Self(map)),
                _ => Err(ToolError::invalid(
                    "arguments",
                    "expected a JSON object or a string containing one",
                )),
            },
            Value::Null => Ok(Self(Map::new())),
            _ => Err(ToolError::invalid("arguments", "expected a JSON object")),
        }
    }

    fn optional_str(&self, field: &str) -> Result<Option<String>> {
        match self.0.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ToolError::invalid(field, "expected a string")),
        }
    }

    fn required_str(&self, field: &str, command: &str) -> Result<String> {
        self.optional_str(field)?
            .ok_or_else(|| ToolError::missing(field, command))
    }

    fn required_line(&self, field: &str, command: &str) -> Result<usize> {
        match self.0.get(field) {
            None | Some(Value::Null) => Err(ToolError::missing(field, command)),
            Some(value) => as_line(value)
                .ok_or_else(|| ToolError::invalid(field, "expected a non-negative integer")),
        }
    }

    fn view_range(&self) -> Result<Option<(usize, Option<usize>)>> {
        const FIELD: &str = "view_range";
        let Some(value) = self.0.get(FIELD).filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        let bad = || ToolError::invalid(FIELD, "expected [start, end] with end = -1 for EOF");

        let Some([start, end]) = value
            .as_array()
            .and_then(|items| <&[Value; 2]>::try_from(items.as_slice()).ok())
        else {
            return Err(bad());
        };
        let start = as_line(start).filter(|n| *n >= 1).ok_or_else(bad)?;
        let end = match end.as_i64() {
            Some(-1) => None,
            _ => Some(as_line(end).filter(|n| *n >= start).ok_or_else(bad)?),
        };
        Ok(Some((start, end)))
    }
}

/// Accepts integers and numeric strings.
fn as_line(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

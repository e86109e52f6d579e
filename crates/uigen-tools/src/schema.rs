//! Tool definitions handed to the model provider.
//!
//! Each definition is a name, a description, and a JSON Schema for the
//! arguments, the shape most provider APIs accept for function calling.

use crate::types::{EDITOR_TOOL, MANAGER_TOOL};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Full definition of a tool including its parameter schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name (unique identifier).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's parameters.
    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Definitions of the editor and manager tools, in that order.
///
/// # Examples
///
/// ```
/// use uigen_tools::tool_definitions;
///
/// let tools = tool_definitions();
/// assert_eq!(tools[0].name, "str_replace_editor");
/// assert_eq!(tools[1].name, "file_manager");
/// ```
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![editor_definition(), manager_definition()]
}

fn editor_definition() -> ToolDefinition {
    ToolDefinition::new(
        EDITOR_TOOL,
        "View, create, and edit files in the project. Paths are absolute, \
         rooted at '/'. The entry point is /App.jsx and must default-export a \
         React component. str_replace requires old_str to occur exactly once.",
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "enum": ["view", "create", "str_replace", "insert"],
                    "description": "Operation to perform"
                },
                "path": {
                    "type": "string",
                    "description": "Absolute path of the file or directory, e.g. /components/Button.jsx"
                },
                "content": {
                    "type": "string",
                    "description": "Full file content for create"
                },
                "old_str": {
                    "type": "string",
                    "description": "Exact text to replace; must match exactly one location"
                },
                "new_str": {
                    "type": "string",
                    "description": "Replacement text for str_replace, or text to add for insert"
                },
                "insert_line": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Line after which new_str is inserted (0 inserts at the top)"
                },
                "view_range": {
                    "type": "array",
                    "items": { "type": "integer" },
                    "minItems": 2,
                    "maxItems": 2,
                    "description": "Optional [start, end] line window for view; end -1 reads to the end"
                }
            },
            "required": ["command", "path"]
        }),
    )
}

fn manager_definition() -> ToolDefinition {
    ToolDefinition::new(
        MANAGER_TOOL,
        "Rename, move, or delete files and directories in the project. \
         Deleting a directory removes everything inside it.",
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "enum": ["rename", "delete"],
                    "description": "Operation to perform"
                },
                "path": {
                    "type": "string",
                    "description": "Absolute path of the file or directory to act on"
                },
                "new_path": {
                    "type": "string",
                    "description": "Destination path for rename"
                }
            },
            "required": ["command", "path"]
        }),
    )
}

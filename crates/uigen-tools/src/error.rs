//! Errors raised while validating or executing a tool call.
//!
//! None of these ever cross the protocol boundary as a Rust error: the
//! adapter turns each one into a failed [`ToolResult`](crate::ToolResult)
//! that the agent can read and react to.

use thiserror::Error;
use uigen_vfs::VfsError;

/// Tool-layer error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// The underlying file system operation failed.
    #[error(transparent)]
    Vfs(#[from] VfsError),

    /// `old_str` occurs more than once in the file.
    #[error("Ambiguous match: old_str occurs {occurrences} times in {path}; include more context to make it unique")]
    AmbiguousMatch {
        /// File being edited
        path: String,
        /// How many times the text occurs
        occurrences: usize,
    },

    /// `old_str` does not occur in the file.
    #[error("No match found for old_str in {path}")]
    MatchNotFound {
        /// File being edited
        path: String,
    },

    /// A required argument is absent.
    #[error("Missing required argument '{field}' for {command}")]
    MissingArgument {
        /// Argument name
        field: String,
        /// Command being validated
        command: String,
    },

    /// An argument has the wrong type or an out-of-range value.
    #[error("Invalid argument '{field}': {reason}")]
    InvalidArgument {
        /// Argument name
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// The command is not one the tool supports.
    #[error("Unknown command '{command}' for tool {tool}")]
    UnknownCommand {
        /// Tool name
        tool: String,
        /// Command as received
        command: String,
    },

    /// No tool with this name exists.
    #[error("Unknown tool '{name}'")]
    UnknownTool {
        /// Tool name as received
        name: String,
    },
}

impl ToolError {
    pub(crate) fn missing(field: &str, command: &str) -> Self {
        Self::MissingArgument {
            field: field.to_string(),
            command: command.to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if the arguments were rejected before touching the VFS.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_tools::ToolError;
    ///
    /// let err = ToolError::UnknownTool { name: "bash".to_string() };
    /// assert!(err.is_validation_error());
    /// ```
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::MissingArgument { .. }
                | Self::InvalidArgument { .. }
                | Self::UnknownCommand { .. }
                | Self::UnknownTool { .. }
        )
    }

    /// Returns `true` for `AmbiguousMatch`.
    #[must_use]
    pub const fn is_ambiguous_match(&self) -> bool {
        matches!(self, Self::AmbiguousMatch { .. })
    }

    /// Returns `true` for a missing match or a missing file.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::MatchNotFound { .. })
            || matches!(self, Self::Vfs(err) if err.is_not_found())
    }

    /// Short machine-readable code for the error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Vfs(VfsError::InvalidPath { .. }) => "InvalidPath",
            Self::Vfs(VfsError::PathConflict { .. }) => "PathConflict",
            Self::Vfs(VfsError::NotFound { .. }) | Self::MatchNotFound { .. } => "NotFound",
            Self::Vfs(VfsError::MissingParent { .. }) => "MissingParent",
            Self::Vfs(VfsError::NotDirectory { .. }) => "NotDirectory",
            Self::Vfs(VfsError::IsDirectory { .. }) => "IsDirectory",
            Self::Vfs(VfsError::InvalidSnapshot { .. }) => "InvalidSnapshot",
            Self::AmbiguousMatch { .. } => "AmbiguousMatch",
            Self::MissingArgument { .. } => "MissingArgument",
            Self::InvalidArgument { .. } => "InvalidArgument",
            Self::UnknownCommand { .. } => "UnknownCommand",
            Self::UnknownTool { .. } => "UnknownTool",
        }
    }
}

/// Result type alias for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;

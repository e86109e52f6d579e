//! Error types for the compile and render layers.
//!
//! VFS and tool-layer failures live in their own crates and never reach this
//! type: they are turned into structured tool results at the adapter
//! boundary. Everything here aborts at most one compile pass or one preview
//! frame.
//!
//! # Examples
//!
//! ```
//! use uigen_core::{Error, Result};
//!
//! fn require_entry(found: bool) -> Result<()> {
//!     if !found {
//!         return Err(Error::EntryNotFound {
//!             candidates: vec!["/App.jsx".to_string()],
//!         });
//!     }
//!     Ok(())
//! }
//!
//! let err = require_entry(false).unwrap_err();
//! assert!(err.is_resolution_error());
//! ```

use thiserror::Error;

/// Main error type for resolution, transpilation, and preview rendering.
#[derive(Error, Debug)]
pub enum Error {
    /// A relative, absolute, or aliased import did not match any file.
    #[error("Module not found: '{specifier}' imported from {importer}")]
    ModuleNotFound {
        /// Specifier as written in the source
        specifier: String,
        /// Path of the importing file
        importer: String,
    },

    /// A bare import is not on the allow-list of hosted modules.
    #[error("Unsupported module: '{specifier}' imported from {importer} is not an allowed package")]
    UnsupportedModule {
        /// Specifier as written in the source
        specifier: String,
        /// Path of the importing file
        importer: String,
    },

    /// None of the entry point candidates exists in the project.
    #[error("No entry point found (looked for {})", .candidates.join(", "))]
    EntryNotFound {
        /// Candidate paths checked, in priority order
        candidates: Vec<String>,
    },

    /// A source file could not be transpiled.
    #[error("{path}:{}: {message}", location(.line, .column))]
    TranspileError {
        /// File that failed to compile
        path: String,
        /// Description of the syntax problem
        message: String,
        /// 1-based line, when known
        line: Option<usize>,
        /// 1-based column, when known
        column: Option<usize>,
    },

    /// The preview frame reported a failure while loading or running the bundle.
    #[error("Runtime error: {message}")]
    RuntimeError {
        /// Error message
        message: String,
        /// Stack trace, when the frame supplied one
        stack: Option<String>,
    },

    /// Configuration is invalid or could not be loaded.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration problem
        message: String,
    },

    /// JSON or template serialization failed.
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Description of the serialization failure
        message: String,
        /// Underlying serde error
        #[source]
        source: Option<serde_json::Error>,
    },
}

fn location(line: &Option<usize>, column: &Option<usize>) -> String {
    match (*line, *column) {
        (Some(line), Some(column)) => format!("{line}:{column}"),
        (Some(line), None) => line.to_string(),
        _ => "?".to_string(),
    }
}

impl Error {
    /// Returns `true` for errors raised while resolving the module graph.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_core::Error;
    ///
    /// let err = Error::UnsupportedModule {
    ///     specifier: "left-pad".to_string(),
    ///     importer: "/App.jsx".to_string(),
    /// };
    /// assert!(err.is_resolution_error());
    /// ```
    #[must_use]
    pub const fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::ModuleNotFound { .. }
                | Self::UnsupportedModule { .. }
                | Self::EntryNotFound { .. }
        )
    }

    /// Returns `true` if this is a transpile error.
    #[must_use]
    pub const fn is_transpile_error(&self) -> bool {
        matches!(self, Self::TranspileError { .. })
    }

    /// Returns `true` if this is a runtime error reported by the preview frame.
    #[must_use]
    pub const fn is_runtime_error(&self) -> bool {
        matches!(self, Self::RuntimeError { .. })
    }

    /// Returns `true` if this is a configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_core::Error;
    ///
    /// let err = Error::ConfigError {
    ///     message: "max_steps must be positive".to_string(),
    /// };
    /// assert!(err.is_config_error());
    /// ```
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigError { .. })
    }

    /// Builds a transpile error without position information.
    #[must_use]
    pub fn transpile(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TranspileError {
            path: path.into(),
            message: message.into(),
            line: None,
            column: None,
        }
    }
}

/// Result type alias for compile and render operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_detection() {
        let err = Error::ModuleNotFound {
            specifier: "./Missing".to_string(),
            importer: "/App.jsx".to_string(),
        };
        assert!(err.is_resolution_error());
        assert!(!err.is_transpile_error());
    }

    #[test]
    fn test_entry_not_found_display_lists_candidates() {
        let err = Error::EntryNotFound {
            candidates: vec!["/App.jsx".to_string(), "/App.tsx".to_string()],
        };
        let display = err.to_string();
        assert!(display.contains("/App.jsx, /App.tsx"));
    }

    #[test]
    fn test_transpile_error_display_with_position() {
        let err = Error::TranspileError {
            path: "/App.jsx".to_string(),
            message: "Unterminated string literal".to_string(),
            line: Some(3),
            column: Some(14),
        };
        assert_eq!(err.to_string(), "/App.jsx:3:14: Unterminated string literal");
    }

    #[test]
    fn test_transpile_error_display_without_position() {
        let err = Error::transpile("/App.jsx", "boom");
        assert_eq!(err.to_string(), "/App.jsx:?: boom");
        assert!(err.is_transpile_error());
    }

    #[test]
    fn test_runtime_error_detection() {
        let err = Error::RuntimeError {
            message: "x is not defined".to_string(),
            stack: None,
        };
        assert!(err.is_runtime_error());
        assert!(!err.is_config_error());
    }
}

//! Structured error payloads shown in the preview panel.
//!
//! An [`ErrorPayload`] is what crosses the isolated frame boundary and what a
//! front end displays instead of a blank preview. It is plain data with a
//! stable JSON shape.
//!
//! # Examples
//!
//! ```
//! use uigen_core::{Error, ErrorKind, ErrorPayload};
//!
//! let err = Error::UnsupportedModule {
//!     specifier: "left-pad".to_string(),
//!     importer: "/App.jsx".to_string(),
//! };
//! let payload = ErrorPayload::from(&err);
//! assert_eq!(payload.kind, ErrorKind::UnsupportedModule);
//! assert_eq!(payload.path.as_deref(), Some("/App.jsx"));
//! ```

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an error shown in the preview panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Relative import did not resolve
    ModuleNotFound,
    /// Bare import not on the allow-list
    UnsupportedModule,
    /// No entry point candidate exists
    EntryNotFound,
    /// Syntax error in a source file
    TranspileError,
    /// Error thrown while loading or running the bundle
    RuntimeError,
    /// Configuration problem
    ConfigError,
    /// Serialization failure
    SerializationError,
}

impl ErrorKind {
    /// Returns the kebab-case wire name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ModuleNotFound => "module-not-found",
            Self::UnsupportedModule => "unsupported-module",
            Self::EntryNotFound => "entry-not-found",
            Self::TranspileError => "transpile-error",
            Self::RuntimeError => "runtime-error",
            Self::ConfigError => "config-error",
            Self::SerializationError => "serialization-error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable description of a compile or runtime failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Error classification
    pub kind: ErrorKind,

    /// Human readable message
    pub message: String,

    /// File the error is attributed to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// 1-based line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    /// 1-based column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,

    /// Stack trace reported by the frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorPayload {
    /// Creates a runtime error payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_core::{ErrorKind, ErrorPayload};
    ///
    /// let payload = ErrorPayload::runtime("boom", Some("at App".to_string()));
    /// assert_eq!(payload.kind, ErrorKind::RuntimeError);
    /// ```
    #[must_use]
    pub fn runtime(message: impl Into<String>, stack: Option<String>) -> Self {
        Self {
            kind: ErrorKind::RuntimeError,
            message: message.into(),
            path: None,
            line: None,
            column: None,
            stack,
        }
    }

    /// Converts the payload back into an [`Error`].
    ///
    /// Resolution and transpile kinds keep their path and position; other
    /// kinds collapse into the closest variant.
    #[must_use]
    pub fn into_error(self) -> Error {
        let path = self.path.unwrap_or_default();
        match self.kind {
            ErrorKind::ModuleNotFound => Error::ModuleNotFound {
                specifier: self.message,
                importer: path,
            },
            ErrorKind::UnsupportedModule => Error::UnsupportedModule {
                specifier: self.message,
                importer: path,
            },
            ErrorKind::EntryNotFound => Error::EntryNotFound {
                candidates: Vec::new(),
            },
            ErrorKind::TranspileError => Error::TranspileError {
                path,
                message: self.message,
                line: self.line,
                column: self.column,
            },
            ErrorKind::RuntimeError => Error::RuntimeError {
                message: self.message,
                stack: self.stack,
            },
            ErrorKind::ConfigError => Error::ConfigError {
                message: self.message,
            },
            ErrorKind::SerializationError => Error::SerializationError {
                message: self.message,
                source: None,
            },
        }
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.kind)?;
        if let Some(path) = &self.path {
            write!(f, "{path}")?;
            if let Some(line) = self.line {
                write!(f, ":{line}")?;
                if let Some(column) = self.column {
                    write!(f, ":{column}")?;
                }
            }
            write!(f, ": ")?;
        }
        f.write_str(&self.message)
    }
}

impl From<&Error> for ErrorPayload {
    fn from(error: &Error) -> Self {
        let base = |kind: ErrorKind| Self {
            kind,
            message: error.to_string(),
            path: None,
            line: None,
            column: None,
            stack: None,
        };

        match error {
            Error::ModuleNotFound { importer, .. } => Self {
                path: Some(importer.clone()),
                ..base(ErrorKind::ModuleNotFound)
            },
            Error::UnsupportedModule { importer, .. } => Self {
                path: Some(importer.clone()),
                ..base(ErrorKind::UnsupportedModule)
            },
            Error::EntryNotFound { .. } => base(ErrorKind::EntryNotFound),
            Error::TranspileError {
                path,
                message,
                line,
                column,
            } => Self {
                kind: ErrorKind::TranspileError,
                message: message.clone(),
                path: Some(path.clone()),
                line: *line,
                column: *column,
                stack: None,
            },
            Error::RuntimeError { message, stack } => Self::runtime(message.clone(), stack.clone()),
            Error::ConfigError { .. } => base(ErrorKind::ConfigError),
            Error::SerializationError { .. } => base(ErrorKind::SerializationError),
        }
    }
}

impl From<Error> for ErrorPayload {
    fn from(error: Error) -> Self {
        Self::from(&error)
    }
}

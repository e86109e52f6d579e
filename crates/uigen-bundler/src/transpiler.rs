//! Per-file compilation: JSX, TypeScript erasure, module rewriting.
//!
//! The pass pipeline depends on the file extension:
//!
//! | Extension | Passes |
//! |-----------|--------|
//! | `.jsx`, `.js`, `.mjs` | JSX, syntax check, modules |
//! | `.tsx` | JSX, types, syntax check, modules |
//! | `.ts` | types, syntax check, modules |
//! | `.json` | parsed and exported as `default` |
//!
//! Every pass keeps line numbers, so a `TranspileError` (and a runtime stack
//! frame inside the module) points at the line the author wrote.

use crate::jsx;
use crate::lexer::{LineIndex, SyntaxError, check_brackets, tokenize};
use crate::modules::{self, ModuleSource};
use crate::typescript;
use uigen_core::{Error, Result};
use uigen_vfs::VfsPath;

/// A source file compiled in isolation from the rest of the project.
///
/// Import specifiers are still unresolved: linking happens in the bundler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspiledModule {
    pub(crate) source: ModuleSource,
    uses_jsx: bool,
}

impl TranspiledModule {
    /// Import specifiers: static imports first, then dynamic imports and
    /// re-exports in order of appearance.
    #[must_use]
    pub fn specifiers(&self) -> &[String] {
        &self.source.specifiers
    }

    /// Returns `true` if the file contained JSX.
    #[must_use]
    pub const fn uses_jsx(&self) -> bool {
        self.uses_jsx
    }

    /// Returns `true` if the module has a `default` export.
    #[must_use]
    pub fn has_default_export(&self) -> bool {
        self.source.has_default_export()
    }

    /// Names of all exports, in declaration order.
    #[must_use]
    pub fn export_names(&self) -> Vec<&str> {
        self.source.exports.iter().map(|e| e.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    JavaScript,
    TypeScript { jsx: bool },
    Json,
}

impl Dialect {
    fn for_path(path: &VfsPath) -> Result<Self> {
        match path.extension() {
            Some("jsx" | "js" | "mjs") => Ok(Self::JavaScript),
            Some("tsx") => Ok(Self::TypeScript { jsx: true }),
            Some("ts" | "mts") => Ok(Self::TypeScript { jsx: false }),
            Some("json") => Ok(Self::Json),
            Some(ext) => Err(Error::transpile(
                path.as_str(),
                format!("Unsupported file type '.{ext}'"),
            )),
            None => Err(Error::transpile(path.as_str(), "File has no extension")),
        }
    }
}

/// Compiles one file.
///
/// # Errors
///
/// Returns [`Error::TranspileError`] with the file path and, when known, the
/// 1-based line and column of the problem.
///
/// # Examples
///
/// ```
/// use uigen_bundler::transpile;
/// use uigen_vfs::VfsPath;
///
/// let path = VfsPath::new("/App.jsx").unwrap();
/// let module = transpile(&path, "export default () => <h1>Hi</h1>;").unwrap();
/// assert!(module.uses_jsx());
/// assert!(module.has_default_export());
///
/// let err = transpile(&path, "const s = 'open;").unwrap_err();
/// assert!(err.is_transpile_error());
/// ```
pub fn transpile(path: &VfsPath, source: &str) -> Result<TranspiledModule> {
    let dialect = Dialect::for_path(path)?;
    if dialect == Dialect::Json {
        return json_module(path, source);
    }

    let (code, uses_jsx) = match dialect {
        Dialect::JavaScript | Dialect::TypeScript { jsx: true } => {
            let output = jsx::transform(source).map_err(|e| syntax_error(path, source, &e))?;
            (output.code, output.uses_jsx)
        }
        _ => (source.to_string(), false),
    };

    let code = if matches!(dialect, Dialect::TypeScript { .. }) {
        typescript::strip_types(&code).map_err(|e| syntax_error(path, &code, &e))?
    } else {
        code
    };

    let tokens = tokenize(&code).map_err(|e| syntax_error(path, &code, &e))?;
    check_brackets(&code, &tokens).map_err(|e| syntax_error(path, &code, &e))?;

    let module = modules::rewrite(&code).map_err(|e| syntax_error(path, &code, &e))?;
    tracing::debug!(
        path = %path,
        imports = module.specifiers.len(),
        exports = %modules::describe_exports(&module),
        uses_jsx,
        "transpiled module"
    );
    Ok(TranspiledModule {
        source: module,
        uses_jsx,
    })
}

fn json_module(path: &VfsPath, source: &str) -> Result<TranspiledModule> {
    let value: serde_json::Value =
        serde_json::from_str(source).map_err(|e| Error::TranspileError {
            path: path.to_string(),
            message: format!("Invalid JSON: {e}"),
            line: Some(e.line()),
            column: Some(e.column()),
        })?;
    let code = format!("const __json = {value};");
    Ok(TranspiledModule {
        source: ModuleSource::from_default(code, "__json"),
        uses_jsx: false,
    })
}

/// Converts a pass error at an offset of `text` into a positioned error.
fn syntax_error(path: &VfsPath, text: &str, error: &SyntaxError) -> Error {
    let (line, column) = LineIndex::new(text).position(error.offset);
    Error::TranspileError {
        path: path.to_string(),
        message: error.message.clone(),
        line: Some(line),
        column: Some(column),
    }
}

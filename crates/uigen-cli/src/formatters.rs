//! Output formatters for CLI commands.
//!
//! Every command builds a serializable report and hands it to
//! [`format_output`]; the report shape is the same in all three modes.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use uigen_core::cli::OutputFormat;

/// Formats `data` according to `format`.
///
/// # Errors
///
/// Returns an error if `data` cannot be serialized.
///
/// # Examples
///
/// ```
/// use serde::Serialize;
/// use uigen_cli::formatters::format_output;
/// use uigen_core::cli::OutputFormat;
///
/// #[derive(Serialize)]
/// struct Summary {
///     entry: String,
///     modules: usize,
/// }
///
/// let summary = Summary { entry: "/App.jsx".to_string(), modules: 3 };
/// let output = format_output(&summary, OutputFormat::Text)?;
/// assert_eq!(output, r#"{"entry":"/App.jsx","modules":3}"#);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => json::format(data),
        OutputFormat::Text => text::format(data),
        OutputFormat::Pretty => pretty::format(data),
    }
}

/// Formats `data` and writes it to stdout.
pub fn print_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<()> {
    let formatted = format_output(data, format).context("failed to format command output")?;
    println!("{formatted}");
    Ok(())
}

/// JSON output formatting.
pub mod json {
    use super::{Result, Serialize};

    /// Formats data as JSON with 2-space indentation.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Formats data as single-line JSON.
    pub fn format_compact<T: Serialize>(data: &T) -> Result<String> {
        Ok(serde_json::to_string(data)?)
    }
}

/// Plain text output formatting.
pub mod text {
    use super::{Result, Serialize, json};

    /// Formats data as one line of JSON, for piping into other tools.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        json::format_compact(data)
    }
}

/// Colored output for terminals.
pub mod pretty {
    use super::{Colorize, Result, Serialize};
    use serde_json::Value;

    /// Formats data as an indented, colored outline.
    ///
    /// Objects become `key: value` lines, arrays become `- item` lines, and
    /// null fields are left out. Multi-line strings (file views, stacks) are
    /// printed as indented blocks.
    pub fn format<T: Serialize>(data: &T) -> Result<String> {
        let value = serde_json::to_value(data)?;
        let mut out = String::new();
        match &value {
            Value::Object(_) | Value::Array(_) => write_nested(&mut out, &value, 0),
            scalar => out.push_str(&scalar_text(scalar, 0)),
        }
        Ok(out.trim_end().to_string())
    }

    fn write_nested(out: &mut String, value: &Value, indent: usize) {
        let pad = "  ".repeat(indent);
        match value {
            Value::Object(map) => {
                for (key, item) in map.iter().filter(|(_, item)| !item.is_null()) {
                    let label = key.blue().bold();
                    if is_block(item) {
                        out.push_str(&format!("{pad}{label}:\n"));
                        write_nested(out, item, indent + 1);
                    } else {
                        out.push_str(&format!("{pad}{label}: {}\n", scalar_text(item, indent + 1)));
                    }
                }
            }
            Value::Array(items) if items.is_empty() => {
                out.push_str(&format!("{pad}{}\n", "(none)".dimmed()));
            }
            Value::Array(items) => {
                for item in items {
                    if is_block(item) {
                        out.push_str(&format!("{pad}-\n"));
                        write_nested(out, item, indent + 1);
                    } else {
                        out.push_str(&format!("{pad}- {}\n", scalar_text(item, indent + 1)));
                    }
                }
            }
            scalar => out.push_str(&format!("{pad}{}\n", scalar_text(scalar, indent))),
        }
    }

    fn is_block(value: &Value) -> bool {
        match value {
            Value::Object(map) => !map.is_empty(),
            Value::Array(items) => !items.is_empty(),
            _ => false,
        }
    }

    fn scalar_text(value: &Value, indent: usize) -> String {
        match value {
            Value::Null => "null".dimmed().to_string(),
            Value::Bool(true) => "true".green().to_string(),
            Value::Bool(false) => "false".red().to_string(),
            Value::Number(n) => n.to_string().cyan().to_string(),
            Value::String(s) if s.contains('\n') => {
                let pad = "  ".repeat(indent);
                let body: Vec<String> = s.lines().map(|line| format!("{pad}{line}")).collect();
                format!("\n{}", body.join("\n"))
            }
            Value::String(s) => s.green().to_string(),
            Value::Object(_) => "{}".to_string(),
            Value::Array(_) => "[]".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Report {
        status: String,
        modules: Vec<String>,
        error: Option<String>,
        failures: usize,
    }

    fn report() -> Report {
        Report {
            status: "ready".to_string(),
            modules: vec!["/App.jsx".to_string(), "/Card.jsx".to_string()],
            error: None,
            failures: 0,
        }
    }

    #[test]
    fn test_json_format() {
        let output = format_output(&report(), OutputFormat::Json).unwrap();
        assert!(output.contains("\"status\": \"ready\""));
        assert!(output.contains("\"error\": null"));
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_text_format_is_one_line() {
        let output = format_output(&report(), OutputFormat::Text).unwrap();
        assert!(!output.contains('\n'));
        assert!(output.contains("\"modules\":[\"/App.jsx\",\"/Card.jsx\"]"));
    }

    #[test]
    fn test_pretty_format_outline() {
        colored::control::set_override(false);
        let output = format_output(&report(), OutputFormat::Pretty).unwrap();
        assert!(output.contains("status: ready"));
        assert!(output.contains("modules:\n  - /App.jsx\n  - /Card.jsx"));
        assert!(output.contains("failures: 0"));
        assert!(!output.contains("error"));
    }

    #[test]
    fn test_pretty_format_multiline_string() {
        colored::control::set_override(false);
        let value = serde_json::json!({"result": "1\tone\n2\ttwo"});
        let output = pretty::format(&value).unwrap();
        assert_eq!(output, "result: \n  1\tone\n  2\ttwo");
    }

    #[test]
    fn test_pretty_format_empty_list() {
        colored::control::set_override(false);
        let value = serde_json::json!({"calls": []});
        assert_eq!(pretty::format(&value).unwrap(), "calls: []");
    }
}

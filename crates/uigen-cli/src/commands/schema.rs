//! Schema command implementation.
//!
//! Prints the agent tool definitions in the shape provider APIs accept for
//! function calling.

use crate::formatters::print_output;
use anyhow::Result;
use uigen_core::cli::{ExitCode, OutputFormat};
use uigen_tools::tool_definitions;

/// Runs the schema command.
///
/// # Errors
///
/// Returns an error if the definitions cannot be formatted.
pub fn run(output_format: OutputFormat) -> Result<ExitCode> {
    print_output(&tool_definitions(), output_format)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_succeeds_in_every_format() {
        for format in [OutputFormat::Json, OutputFormat::Text, OutputFormat::Pretty] {
            assert_eq!(run(format).unwrap(), ExitCode::SUCCESS);
        }
    }
}

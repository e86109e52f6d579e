//! Command implementations for the `uigen` CLI.
//!
//! Each command reads its inputs, runs the preview pipeline, and prints a
//! report in the requested output format. Commands return an [`ExitCode`]
//! for outcomes the user should see in the status (a failed preview, a
//! failed tool call) and an error for unusable input.
//!
//! [`ExitCode`]: uigen_core::cli::ExitCode

pub mod apply;
pub mod common;
pub mod config;
pub mod render;
pub mod schema;

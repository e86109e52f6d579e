//! Core types, errors, and configuration for the UIGen preview pipeline.
//!
//! This crate provides the foundational types shared by the resolver,
//! bundler, preview renderer, and CLI crates of the workspace.
//!
//! # Architecture
//!
//! The core consists of:
//! - The compile/render error hierarchy ([`Error`]) with contextual information
//! - A serializable [`ErrorPayload`] used by the preview panel and the
//!   isolated frame boundary
//! - The allow-list of externally hosted modules ([`ExternalModules`])
//! - Configuration types ([`PreviewConfig`])
//! - Output format and exit code types for command line front ends ([`cli`])

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod cli;
mod config;
mod error;
mod externals;
mod payload;

pub use config::{AgentConfig, ErrorPolicy, FrameSettings, PreviewConfig, PreviewConfigBuilder};
pub use error::{Error, Result};
pub use externals::{ENTRY_CANDIDATES, ExternalModule, ExternalModules};
pub use payload::{ErrorKind, ErrorPayload};

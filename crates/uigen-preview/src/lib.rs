//! Live preview for UIGen projects.
//!
//! This crate closes the loop of the pipeline: agent tool calls mutate the
//! project, the change marks the session dirty, a refresh recompiles the
//! project, and the bundle is loaded into a fresh isolated frame.
//!
//! # Architecture
//!
//! - [`document`]: the HTML document a frame displays (Handlebars)
//! - [`frame`]: the isolated frame, one OS thread per frame, JSON messages only
//! - [`renderer`]: compile results to [`PreviewState`], error policy, stats
//! - [`session`]: the owned project tree wired to tools, bundler, and renderer
//!
//! # Examples
//!
//! ```
//! use uigen_core::{ErrorKind, PreviewConfig};
//! use uigen_preview::PreviewSession;
//!
//! let snapshot = r#"{"/App.jsx": "import pad from 'left-pad';\nexport default pad;"}"#;
//! let mut session = PreviewSession::from_snapshot(snapshot, PreviewConfig::default()).unwrap();
//!
//! let state = session.refresh();
//! assert_eq!(state.error().unwrap().kind, ErrorKind::UnsupportedModule);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod document;
pub mod frame;
pub mod renderer;
pub mod session;

pub use frame::{FrameMessage, HostMessage, LoadRequest, PreviewFrame};
pub use renderer::{PreviewRenderer, PreviewState, RendererStats};
pub use session::PreviewSession;

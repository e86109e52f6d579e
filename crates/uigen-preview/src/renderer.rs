//! Preview renderer: compile results in, preview state out.
//!
//! Every call to [`PreviewRenderer::render`] tears down the current frame and
//! starts a fresh one, so nothing a generated component did survives a
//! recompile. Failures never escape as Rust errors; they become
//! [`PreviewState::Failed`] with a structured payload.
//!
//! # Examples
//!
//! ```
//! use uigen_bundler::Bundler;
//! use uigen_core::{ExternalModules, FrameSettings};
//! use uigen_preview::PreviewRenderer;
//! use uigen_vfs::FilesBuilder;
//!
//! let fs = FilesBuilder::new()
//!     .add_file("/App.jsx", "export default () => <h1>Hi</h1>;")
//!     .build()
//!     .unwrap();
//! let externals = ExternalModules::default();
//! let bundle = Bundler::new(externals.clone()).bundle(&fs);
//!
//! let mut renderer = PreviewRenderer::new(FrameSettings::default(), externals);
//! assert!(renderer.render(bundle).is_ready());
//! ```

use crate::frame::{FrameMessage, LoadRequest, PreviewFrame};
use serde::Serialize;
use uigen_bundler::Bundle;
use uigen_core::{ErrorPayload, ErrorPolicy, ExternalModules, FrameSettings, Result};
use uuid::Uuid;

/// What the preview panel shows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum PreviewState {
    /// Nothing compiled yet
    #[default]
    Empty,
    /// A document is loaded in the frame
    Ready {
        /// HTML document shown in the frame
        document: String,
        /// Entry point of the bundle
        entry: String,
        /// Frame the document belongs to
        frame_id: Uuid,
    },
    /// The last compile pass or the running document failed
    Failed {
        /// What went wrong
        error: ErrorPayload,
        /// Previous document, kept only under the keep-last-good policy
        last_good: Option<String>,
    },
}

impl PreviewState {
    /// Returns `true` if a document is loaded.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Returns `true` if the preview is showing an error.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Current error, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&ErrorPayload> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Document to display: the ready one, or the last good one next to an
    /// error.
    #[must_use]
    pub fn document(&self) -> Option<&str> {
        match self {
            Self::Ready { document, .. } => Some(document),
            Self::Failed { last_good, .. } => last_good.as_deref(),
            Self::Empty => None,
        }
    }

    /// Short status name (`empty`, `ready`, `failed`).
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Ready { .. } => "ready",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Counters kept by a [`PreviewRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RendererStats {
    /// Compile results handed to the renderer
    pub renders: u64,
    /// Renders that ended in an error
    pub failures: u64,
    /// Frames that missed their deadline
    pub timeouts: u64,
    /// Errors reported by running documents
    pub runtime_errors: u64,
}

/// Owns the current frame and the preview state.
#[derive(Debug)]
pub struct PreviewRenderer {
    settings: FrameSettings,
    externals: ExternalModules,
    frame: Option<PreviewFrame>,
    bundle: Option<Bundle>,
    state: PreviewState,
    stats: RendererStats,
}

impl PreviewRenderer {
    /// Creates a renderer with no frame running.
    #[must_use]
    pub fn new(settings: FrameSettings, externals: ExternalModules) -> Self {
        Self {
            settings,
            externals,
            frame: None,
            bundle: None,
            state: PreviewState::Empty,
            stats: RendererStats::default(),
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &PreviewState {
        &self.state
    }

    /// Counters since creation.
    #[must_use]
    pub const fn stats(&self) -> RendererStats {
        self.stats
    }

    /// Frame settings in use.
    #[must_use]
    pub const fn settings(&self) -> &FrameSettings {
        &self.settings
    }

    /// Bundle loaded in the current frame.
    #[must_use]
    pub const fn bundle(&self) -> Option<&Bundle> {
        self.bundle.as_ref()
    }

    /// Shows the outcome of a compile pass.
    ///
    /// The previous frame is always torn down first. A failed compile or a
    /// frame that rejects the bundle moves the state to
    /// [`PreviewState::Failed`].
    pub fn render(&mut self, compiled: Result<Bundle>) -> &PreviewState {
        self.stats.renders += 1;
        self.teardown();

        let bundle = match compiled {
            Ok(bundle) => bundle,
            Err(error) => {
                tracing::info!(%error, "compile pass failed");
                return self.fail(ErrorPayload::from(&error));
            }
        };

        let mut frame = match PreviewFrame::spawn(&self.settings) {
            Ok(frame) => frame,
            Err(error) => return self.fail(ErrorPayload::from(&error)),
        };
        let request = self.load_request(&bundle);
        let reply = frame.load(request);
        if frame.is_abandoned() {
            self.stats.timeouts += 1;
        }

        match reply {
            FrameMessage::Ready { frame_id, document } => {
                tracing::info!(frame = %frame_id, entry = %bundle.entry, "preview ready");
                self.state = PreviewState::Ready {
                    document,
                    entry: bundle.entry.to_string(),
                    frame_id,
                };
                self.frame = Some(frame);
                self.bundle = Some(bundle);
                &self.state
            }
            FrameMessage::Error { error, .. } => {
                drop(frame);
                self.fail(error)
            }
        }
    }

    /// Relays an error report posted by the running document.
    ///
    /// The report passes through the frame, which turns it into a payload.
    /// Stack frames pointing into the bundle are mapped back to the project
    /// file and line when possible.
    pub fn relay_runtime_error(&mut self, report: &str) -> &PreviewState {
        self.stats.runtime_errors += 1;
        let mut payload = match self.frame.as_mut() {
            Some(frame) => frame.report_runtime_error(report),
            None => ErrorPayload::runtime(
                "Runtime error reported with no preview frame running",
                None,
            ),
        };
        if let Some(bundle) = &self.bundle {
            locate(bundle, &mut payload);
        }
        tracing::warn!(error = %payload, "preview runtime error");
        self.fail(payload)
    }

    /// Stops the frame and returns to [`PreviewState::Empty`].
    pub fn reset(&mut self) {
        self.teardown();
        self.state = PreviewState::Empty;
    }

    fn load_request(&self, bundle: &Bundle) -> LoadRequest {
        let mut imports: std::collections::BTreeMap<String, String> = bundle
            .externals
            .iter()
            .map(|m| (m.name.clone(), m.url.clone()))
            .collect();
        for name in [ExternalModules::FRAMEWORK, ExternalModules::MOUNT] {
            if let Some(module) = self.externals.get(name) {
                imports.insert(module.name, module.url);
            }
        }
        LoadRequest {
            entry: bundle.entry.to_string(),
            code: bundle.code.clone(),
            has_default_export: bundle.has_default_export,
            stylesheet: bundle.stylesheet(),
            imports,
        }
    }

    fn teardown(&mut self) {
        self.frame = None;
        self.bundle = None;
    }

    fn fail(&mut self, error: ErrorPayload) -> &PreviewState {
        self.stats.failures += 1;
        let last_good = match self.settings.error_policy {
            ErrorPolicy::ShowError => None,
            ErrorPolicy::KeepLastGood => self.state.document().map(ToString::to_string),
        };
        self.frame = None;
        self.state = PreviewState::Failed { error, last_good };
        &self.state
    }
}

/// Points a runtime payload at the project line of its first bundle frame.
fn locate(bundle: &Bundle, payload: &mut ErrorPayload) {
    if payload.path.is_some() {
        return;
    }
    let Some(stack) = payload.stack.as_deref() else {
        return;
    };
    let found = stack.lines().filter(|l| l.contains("blob:")).find_map(|frame| {
        let (line, column) = trailing_position(frame)?;
        let (path, source_line) = bundle.source_location(line)?;
        Some((path.to_string(), source_line, column))
    });
    if let Some((path, line, column)) = found {
        payload.path = Some(path);
        payload.line = Some(line);
        payload.column = Some(column);
    }
}

/// Parses the `:line:column` suffix of a stack frame such as
/// `at App (blob:null/abc:42:7)`.
fn trailing_position(frame: &str) -> Option<(usize, usize)> {
    let frame = frame.trim_end().trim_end_matches(')');
    let mut parts = frame.rsplitn(3, ':');
    let column = parts.next()?.parse().ok()?;
    let line = parts.next()?.parse().ok()?;
    parts.next()?;
    Some((line, column))
}

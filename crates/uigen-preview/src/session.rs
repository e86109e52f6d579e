//! One preview session: project tree, agent tools, compiler, and renderer.
//!
//! The session owns its [`FileSystem`] and hands it explicitly to the tool
//! adapter and the bundler. A VFS subscription marks the session dirty on
//! every successful mutation; [`PreviewSession::refresh`] recompiles only
//! when something changed since the last pass.
//!
//! # Examples
//!
//! ```
//! use serde_json::json;
//! use uigen_core::PreviewConfig;
//! use uigen_preview::PreviewSession;
//! use uigen_tools::ToolCall;
//!
//! let mut session = PreviewSession::new(PreviewConfig::default());
//! let result = session.apply(&ToolCall::editor(json!({
//!     "command": "create",
//!     "path": "/App.jsx",
//!     "content": "export default function App() { return <h1>Hello</h1>; }",
//! })));
//! assert!(result.ok);
//!
//! assert!(session.is_dirty());
//! assert!(session.refresh().is_ready());
//! assert!(!session.is_dirty());
//! ```

use crate::renderer::{PreviewRenderer, PreviewState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use uigen_bundler::{Bundle, Bundler, TranspileCache};
use uigen_core::{Error, PreviewConfig, Result};
use uigen_tools::{
    StepBudget, ToolCall, ToolCallSource, ToolResult, TurnOutcome, TurnRunner, execute,
};
use uigen_vfs::{FileSystem, VfsError};

/// Modules kept in the session's transpile cache.
const CACHE_CAPACITY: usize = 512;

/// A live preview over an in-memory project.
#[derive(Debug)]
pub struct PreviewSession {
    fs: FileSystem,
    config: PreviewConfig,
    bundler: Bundler,
    renderer: PreviewRenderer,
    dirty: Arc<AtomicBool>,
}

impl PreviewSession {
    /// Creates a session over an empty project.
    #[must_use]
    pub fn new(config: PreviewConfig) -> Self {
        Self::with_files(FileSystem::new(), config)
    }

    /// Creates a session over an existing tree.
    #[must_use]
    pub fn with_files(mut fs: FileSystem, config: PreviewConfig) -> Self {
        let dirty = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&dirty);
        fs.subscribe(Arc::new(move |event| {
            tracing::trace!(kind = ?event.kind, paths = event.paths.len(), "project changed");
            flag.store(true, Ordering::Release);
        }));

        let bundler = Bundler::new(config.externals.clone())
            .with_cache(Arc::new(TranspileCache::new(CACHE_CAPACITY)));
        let renderer = PreviewRenderer::new(config.preview.clone(), config.externals.clone());
        Self {
            fs,
            config,
            bundler,
            renderer,
            dirty,
        }
    }

    /// Hydrates a session from a persisted snapshot. An empty snapshot
    /// yields an empty project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationError`] if the snapshot is malformed.
    pub fn from_snapshot(snapshot: &str, config: PreviewConfig) -> Result<Self> {
        let fs = FileSystem::deserialize(snapshot).map_err(snapshot_error)?;
        tracing::info!(files = fs.file_count(), "session hydrated from snapshot");
        Ok(Self::with_files(fs, config))
    }

    /// Serializes the project for persistence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationError`] if encoding fails.
    pub fn snapshot(&self) -> Result<String> {
        self.fs.serialize().map_err(snapshot_error)
    }

    /// Replaces the project with a snapshot, keeping the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationError`] if the snapshot is malformed;
    /// the project is left unchanged.
    pub fn hydrate(&mut self, snapshot: &str) -> Result<()> {
        self.fs.hydrate(snapshot).map_err(snapshot_error)
    }

    /// Project tree.
    #[must_use]
    pub const fn fs(&self) -> &FileSystem {
        &self.fs
    }

    /// Configuration the session was created with.
    #[must_use]
    pub const fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Renderer holding the preview state.
    #[must_use]
    pub const fn renderer(&self) -> &PreviewRenderer {
        &self.renderer
    }

    /// Current preview state, without recompiling.
    #[must_use]
    pub const fn state(&self) -> &PreviewState {
        self.renderer.state()
    }

    /// Returns `true` if the project changed since the last compile pass.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Runs one tool call against the project.
    pub fn apply(&mut self, call: &ToolCall) -> ToolResult {
        execute(&mut self.fs, call)
    }

    /// Runs one agent turn.
    ///
    /// The step ceiling comes from the agent configuration; `mock` selects
    /// the reduced ceiling. Calls completed before a cancellation or the
    /// ceiling keep their effect. The preview is left dirty: call
    /// [`refresh`](Self::refresh) afterwards, outside the async executor if
    /// the frame may block.
    pub async fn run_turn<S>(
        &mut self,
        source: &mut S,
        cancel: CancellationToken,
        mock: bool,
    ) -> TurnOutcome
    where
        S: ToolCallSource + ?Sized,
    {
        let budget = StepBudget::from_config(&self.config.agent, mock);
        let runner = TurnRunner::new(budget).with_cancellation(cancel);
        let outcome = runner.run(source, &mut self.fs).await;
        tracing::info!(
            steps = outcome.steps(),
            failures = outcome.failures(),
            completed = outcome.is_completed(),
            "agent turn finished"
        );
        outcome
    }

    /// Compiles the project without touching the preview.
    ///
    /// # Errors
    ///
    /// Returns the resolution or transpile error of the pass.
    pub fn compile(&self) -> Result<Bundle> {
        self.bundler.bundle(&self.fs)
    }

    /// Recompiles and re-renders if the project changed.
    pub fn refresh(&mut self) -> &PreviewState {
        if self.dirty.swap(false, Ordering::AcqRel) {
            let compiled = self.bundler.bundle(&self.fs);
            self.renderer.render(compiled)
        } else {
            self.renderer.state()
        }
    }

    /// Recompiles and re-renders unconditionally.
    pub fn rebuild(&mut self) -> &PreviewState {
        self.dirty.store(true, Ordering::Release);
        self.refresh()
    }

    /// Relays an error report posted by the running document.
    pub fn relay_runtime_error(&mut self, report: &str) -> &PreviewState {
        self.renderer.relay_runtime_error(report)
    }
}

#[allow(clippy::needless_pass_by_value)]
fn snapshot_error(error: VfsError) -> Error {
    Error::SerializationError {
        message: error.to_string(),
        source: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uigen_core::ErrorKind;
    use uigen_tools::ScriptedSource;

    fn create(path: &str, content: &str) -> ToolCall {
        ToolCall::editor(json!({"command": "create", "path": path, "content": content}))
    }

    #[test]
    fn test_empty_project_reports_missing_entry() {
        let mut session = PreviewSession::new(PreviewConfig::default());
        let state = session.refresh();
        assert_eq!(state.error().unwrap().kind, ErrorKind::EntryNotFound);
    }

    #[test]
    fn test_refresh_only_when_dirty() {
        let mut session = PreviewSession::new(PreviewConfig::default());
        session.apply(&create("/App.jsx", "export default () => <p/>;"));
        session.refresh();
        session.refresh();
        assert_eq!(session.renderer().stats().renders, 1);

        // A failed call does not mutate, so nothing is recompiled.
        let result = session.apply(&create("/App.jsx", "again"));
        assert!(!result.ok);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_str_replace_triggers_recompile() {
        let mut session = PreviewSession::new(PreviewConfig::default());
        session.apply(&create("/App.jsx", "export default () => <p>One</p>;"));
        session.refresh();
        session.apply(&ToolCall::editor(json!({
            "command": "str_replace", "path": "/App.jsx", "old_str": "One", "new_str": "Two"
        })));
        let document = session.refresh().document().unwrap().to_string();
        assert!(document.contains("Two"));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut session = PreviewSession::new(PreviewConfig::default());
        session.apply(&create("/App.jsx", "export default () => null;"));
        session.apply(&create("/components/Card.jsx", "export default () => null;"));
        let snapshot = session.snapshot().unwrap();

        let restored = PreviewSession::from_snapshot(&snapshot, PreviewConfig::default()).unwrap();
        assert_eq!(restored.fs(), session.fs());
        assert!(restored.is_dirty());

        let err = PreviewSession::from_snapshot("[1]", PreviewConfig::default()).unwrap_err();
        assert!(matches!(err, Error::SerializationError { .. }));
    }

    #[test]
    fn test_hydrate_marks_dirty() {
        let mut session = PreviewSession::new(PreviewConfig::default());
        session.refresh();
        session
            .hydrate(r#"{"/App.jsx": "export default () => null;"}"#)
            .unwrap();
        assert!(session.is_dirty());
        assert!(session.refresh().is_ready());
    }

    #[tokio::test]
    async fn test_turn_respects_mock_ceiling() {
        let config = PreviewConfig::builder().mock_max_steps(2).build();
        let mut session = PreviewSession::new(config);
        let mut source = ScriptedSource::new(vec![
            create("/App.jsx", "import A from './A';\nexport default A;"),
            create("/A.jsx", "export default () => <p/>;"),
            create("/B.jsx", "export default 1;"),
        ]);

        let outcome = session.run_turn(&mut source, CancellationToken::new(), true).await;
        assert!(outcome.is_step_limited());
        assert_eq!(outcome.steps(), 2);
        assert!(!session.fs().exists("/B.jsx"));
        assert!(session.state().is_ready());
    }

    #[tokio::test]
    async fn test_cancelled_turn_keeps_completed_calls() {
        let mut session = PreviewSession::new(PreviewConfig::default());
        session.apply(&create("/App.jsx", "export default 1;"));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut source = ScriptedSource::new(vec![create("/B.jsx", "")]);

        let outcome = session.run_turn(&mut source, cancel, false).await;
        assert!(outcome.is_cancelled());
        assert!(session.fs().is_file("/App.jsx"));
        assert!(!session.fs().exists("/B.jsx"));
    }
}

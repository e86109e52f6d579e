//! The isolated preview frame.
//!
//! Each frame runs on its own OS thread and shares no memory with the host.
//! The host and the frame talk only through JSON-encoded strings on a pair
//! of channels:
//!
//! | Direction | Message | Meaning |
//! |-----------|---------|---------|
//! | host → frame | `load` | build the document for a bundle |
//! | host → frame | `runtime-error` | a report posted by the running document |
//! | host → frame | `shutdown` | stop the frame thread |
//! | frame → host | `ready` | the document is ready to display |
//! | frame → host | `error` | a structured [`ErrorPayload`] |
//!
//! A panic inside the frame is caught and reported as an `error` message.
//! A frame that does not answer within the configured timeout is abandoned:
//! the host stops waiting for it and never joins its thread.

use crate::document::{DocumentContext, DocumentRenderer};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use uigen_core::{Error, ErrorPayload, ExternalModules, FrameSettings, Result};
use uuid::Uuid;

/// Everything the frame needs to build a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    /// Entry path, used as the document title
    pub entry: String,
    /// Linked bundle
    pub code: String,
    /// Whether the entry exports a component as `default`
    pub has_default_export: bool,
    /// Collected project CSS
    #[serde(default)]
    pub stylesheet: String,
    /// Bare name to URL mapping for the document's import map
    #[serde(default)]
    pub imports: BTreeMap<String, String>,
}

/// Messages from the host to the frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HostMessage {
    /// Build the document for a bundle
    Load(LoadRequest),
    /// Raw JSON report posted by the running document
    RuntimeError {
        /// The report as received
        report: String,
    },
    /// Stop the frame
    Shutdown,
}

/// Messages from the frame to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum FrameMessage {
    /// The document is ready
    Ready {
        /// Frame that built the document
        frame_id: Uuid,
        /// Complete HTML document
        document: String,
    },
    /// Loading or running failed
    Error {
        /// Frame that reported the error
        frame_id: Uuid,
        /// What went wrong
        error: ErrorPayload,
    },
}

/// Report posted by the document's error shim.
#[derive(Debug, Deserialize)]
struct RuntimeReport {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    stack: Option<String>,
}

const REPORT_TYPE: &str = "uigen:error";

/// Host side handle of a running frame.
///
/// Dropping the handle shuts the frame down.
#[derive(Debug)]
pub struct PreviewFrame {
    id: Uuid,
    to_frame: Sender<String>,
    from_frame: Receiver<String>,
    handle: Option<JoinHandle<()>>,
    timeout: Duration,
    abandoned: bool,
}

impl PreviewFrame {
    /// Starts a frame thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RuntimeError`] if the thread cannot be started and a
    /// serialization error if the document template is invalid.
    pub fn spawn(settings: &FrameSettings) -> Result<Self> {
        let id = Uuid::new_v4();
        let documents = DocumentRenderer::new()?;
        let (to_frame, inbox) = mpsc::channel::<String>();
        let (outbox, from_frame) = mpsc::channel::<String>();
        let worker = Worker {
            id,
            settings: settings.clone(),
            documents,
        };

        let handle = thread::Builder::new()
            .name(format!("preview-frame-{}", id.simple()))
            .spawn(move || worker.run(&inbox, &outbox))
            .map_err(|e| Error::RuntimeError {
                message: format!("Failed to start preview frame: {e}"),
                stack: None,
            })?;

        tracing::debug!(frame = %id, "preview frame started");
        Ok(Self {
            id,
            to_frame,
            from_frame,
            handle: Some(handle),
            timeout: settings.frame_timeout(),
            abandoned: false,
        })
    }

    /// Frame identifier, also written into the document.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Returns `true` once the frame missed a deadline.
    #[must_use]
    pub const fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    /// Asks the frame to build the document for `request`.
    ///
    /// Always returns a message: transport failures and timeouts are
    /// reported as [`FrameMessage::Error`].
    pub fn load(&mut self, request: LoadRequest) -> FrameMessage {
        self.exchange(&HostMessage::Load(request))
    }

    /// Forwards a report posted by the running document and returns the
    /// payload the frame made of it.
    pub fn report_runtime_error(&mut self, report: &str) -> ErrorPayload {
        match self.exchange(&HostMessage::RuntimeError {
            report: report.to_string(),
        }) {
            FrameMessage::Error { error, .. } => error,
            FrameMessage::Ready { .. } => {
                ErrorPayload::runtime(
                    "Preview frame answered an error report with a document",
                    None,
                )
            }
        }
    }

    fn exchange(&mut self, message: &HostMessage) -> FrameMessage {
        let fail = |id, message: String| FrameMessage::Error {
            frame_id: id,
            error: ErrorPayload::runtime(message, None),
        };
        if self.abandoned {
            return fail(self.id, "Preview frame is unresponsive".to_string());
        }

        let raw = match serde_json::to_string(message) {
            Ok(raw) => raw,
            Err(e) => {
                return FrameMessage::Error {
                    frame_id: self.id,
                    error: ErrorPayload::from(Error::SerializationError {
                        message: format!("Failed to encode frame message: {e}"),
                        source: Some(e),
                    }),
                };
            }
        };
        if self.to_frame.send(raw).is_err() {
            return fail(self.id, "Preview frame is not running".to_string());
        }

        match self.from_frame.recv_timeout(self.timeout) {
            Ok(reply) => serde_json::from_str(&reply).unwrap_or_else(|e| {
                fail(self.id, format!("Malformed reply from preview frame: {e}"))
            }),
            Err(RecvTimeoutError::Timeout) => {
                self.abandoned = true;
                tracing::warn!(
                    frame = %self.id,
                    timeout_ms = self.timeout.as_millis(),
                    "preview frame timed out"
                );
                fail(
                    self.id,
                    format!(
                        "Preview frame did not respond within {} ms",
                        self.timeout.as_millis()
                    ),
                )
            }
            Err(RecvTimeoutError::Disconnected) => {
                fail(self.id, "Preview frame stopped unexpectedly".to_string())
            }
        }
    }

    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Ok(raw) = serde_json::to_string(&HostMessage::Shutdown) {
            let _ = self.to_frame.send(raw);
        }
        if self.abandoned {
            tracing::debug!(frame = %self.id, "abandoning unresponsive preview frame");
            return;
        }
        if handle.join().is_err() {
            tracing::warn!(frame = %self.id, "preview frame thread panicked");
        }
        tracing::debug!(frame = %self.id, "preview frame stopped");
    }
}

impl Drop for PreviewFrame {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State owned by the frame thread.
struct Worker {
    id: Uuid,
    settings: FrameSettings,
    documents: DocumentRenderer<'static>,
}

impl Worker {
    fn run(&self, inbox: &Receiver<String>, outbox: &Sender<String>) {
        while let Ok(raw) = inbox.recv() {
            let reply = match serde_json::from_str::<HostMessage>(&raw) {
                Ok(HostMessage::Shutdown) => break,
                Ok(HostMessage::Load(request)) => self.guarded(|| self.load(&request)),
                Ok(HostMessage::RuntimeError { report }) => FrameMessage::Error {
                    frame_id: self.id,
                    error: parse_report(&report),
                },
                Err(e) => self.error(ErrorPayload::runtime(
                    format!("Malformed message from host: {e}"),
                    None,
                )),
            };
            let Ok(reply) = serde_json::to_string(&reply) else {
                break;
            };
            if outbox.send(reply).is_err() {
                break;
            }
        }
    }

    fn guarded(&self, work: impl FnOnce() -> FrameMessage) -> FrameMessage {
        catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|panic| {
            let message = panic_message(panic.as_ref());
            tracing::error!(frame = %self.id, %message, "preview frame panicked");
            self.error(ErrorPayload::runtime(
                format!("Preview frame crashed: {message}"),
                None,
            ))
        })
    }

    fn load(&self, request: &LoadRequest) -> FrameMessage {
        if request.code.len() > self.settings.max_bundle_bytes {
            return self.error(ErrorPayload::runtime(
                format!(
                    "Bundle is {} bytes, larger than the {} byte limit",
                    request.code.len(),
                    self.settings.max_bundle_bytes
                ),
                None,
            ));
        }
        if !request.has_default_export {
            return self.error(ErrorPayload {
                path: Some(request.entry.clone()),
                ..ErrorPayload::runtime(
                    format!(
                        "Entry module {} has no default export to render",
                        request.entry
                    ),
                    None,
                )
            });
        }
        for required in [ExternalModules::FRAMEWORK, ExternalModules::MOUNT] {
            if !request.imports.contains_key(required) {
                return self.error(ErrorPayload::runtime(
                    format!("Cannot mount the preview: '{required}' is not an allowed package"),
                    None,
                ));
            }
        }

        let context = DocumentContext::builder(&request.entry, &request.code)
            .frame_id(self.id.to_string())
            .styling_url(&self.settings.styling_url)
            .stylesheet(&request.stylesheet)
            .imports(request.imports.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .build();
        match self.documents.render(&context) {
            Ok(document) => {
                tracing::debug!(frame = %self.id, bytes = document.len(), "preview document ready");
                FrameMessage::Ready {
                    frame_id: self.id,
                    document,
                }
            }
            Err(e) => self.error(ErrorPayload::from(&e)),
        }
    }

    const fn error(&self, error: ErrorPayload) -> FrameMessage {
        FrameMessage::Error {
            frame_id: self.id,
            error,
        }
    }
}

/// Turns a document report into a runtime error payload.
fn parse_report(report: &str) -> ErrorPayload {
    match serde_json::from_str::<RuntimeReport>(report) {
        Ok(report) if report.kind == REPORT_TYPE => ErrorPayload::runtime(
            report.message.unwrap_or_else(|| "Unknown error".to_string()),
            report.stack.filter(|s| !s.is_empty()),
        ),
        Ok(report) => {
            ErrorPayload::runtime(format!("Unexpected report type '{}'", report.kind), None)
        }
        Err(e) => ErrorPayload::runtime(format!("Malformed runtime error report: {e}"), None),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

//! Change notifications for the virtual file system.
//!
//! Every successful mutation dispatches exactly one [`VfsEvent`] to all
//! subscribers after the change has been applied. Failed mutations dispatch
//! nothing.

use crate::types::VfsPath;
use std::fmt;
use std::sync::Arc;

/// What kind of mutation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// File or directory created
    Created,
    /// File content replaced
    Updated,
    /// Node and its subtree removed
    Deleted,
    /// Node moved to a new path
    Renamed,
    /// Tree reset to an empty root
    Cleared,
    /// Tree replaced from a snapshot
    Hydrated,
}

/// A single change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsEvent {
    /// Mutation kind
    pub kind: ChangeKind,
    /// Paths touched by the mutation.
    ///
    /// For renames this is `[from, to]`. For recursive deletes it lists the
    /// removed node followed by its descendants.
    pub paths: Vec<VfsPath>,
}

impl VfsEvent {
    pub(crate) const fn new(kind: ChangeKind, paths: Vec<VfsPath>) -> Self {
        Self { kind, paths }
    }
}

/// Callback invoked on every change.
pub type Listener = Arc<dyn Fn(&VfsEvent) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl Subscribers {
    pub(crate) fn add(&mut self, listener: Listener) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn notify(&self, event: &VfsEvent) {
        tracing::trace!(kind = ?event.kind, paths = event.paths.len(), "vfs change");
        for (_, listener) in &self.listeners {
            listener(event);
        }
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.listeners.len())
            .finish()
    }
}

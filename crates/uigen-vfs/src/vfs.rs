//! In-memory project file system.
//!
//! The tree is rooted at `/` and stored as a `BTreeMap` from path to node, so
//! iteration is always in path order. Directories keep the paths of their
//! immediate children.
//!
//! # Examples
//!
//! ```
//! use uigen_vfs::{CreateOptions, FileSystem};
//!
//! let mut fs = FileSystem::new();
//! fs.create_file("/App.jsx", "export default () => null;").unwrap();
//! fs.create_file_with("/components/Button.jsx", "", CreateOptions::with_parents()).unwrap();
//!
//! assert!(fs.is_dir("/components"));
//! assert_eq!(fs.file_count(), 2);
//! ```

use crate::events::{ChangeKind, Listener, SubscriptionId, Subscribers, VfsEvent};
use crate::types::{DirEntry, EntryType, FileNode, NodeKind, Result, VfsError, VfsPath};
use std::collections::BTreeMap;

type Tree = BTreeMap<VfsPath, FileNode>;

/// Options for node creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Create missing parent directories instead of failing
    pub create_parents: bool,
}

impl CreateOptions {
    /// Options that create missing parent directories.
    #[must_use]
    pub const fn with_parents() -> Self {
        Self {
            create_parents: true,
        }
    }
}

/// The project's in-memory file tree.
///
/// All mutation goes through the methods below. Each successful mutation
/// notifies subscribers exactly once, after the change is applied. A failed
/// mutation leaves the tree untouched and notifies nobody.
///
/// Cloning copies the tree but not the subscribers.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use uigen_vfs::{ChangeKind, FileSystem};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let mut fs = FileSystem::new();
/// let sink = Arc::clone(&seen);
/// fs.subscribe(Arc::new(move |event| sink.lock().unwrap().push(event.kind)));
///
/// fs.create_file("/App.jsx", "").unwrap();
/// assert_eq!(*seen.lock().unwrap(), vec![ChangeKind::Created]);
/// ```
#[derive(Debug)]
pub struct FileSystem {
    nodes: Tree,
    subscribers: Subscribers,
}

impl FileSystem {
    /// Creates a file system containing only the root directory.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Tree::new();
        nodes.insert(VfsPath::root(), FileNode::directory(VfsPath::root()));
        Self {
            nodes,
            subscribers: Subscribers::default(),
        }
    }

    /// Creates a file. The parent directory must already exist.
    ///
    /// # Errors
    ///
    /// - `PathConflict` if a node exists at `path`
    /// - `MissingParent` if the parent directory does not exist
    /// - `InvalidPath` if the path is malformed or an ancestor is a file
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_vfs::FileSystem;
    ///
    /// let mut fs = FileSystem::new();
    /// fs.create_file("/App.jsx", "a").unwrap();
    /// assert!(fs.create_file("/App.jsx", "b").unwrap_err().is_conflict());
    /// assert!(fs.create_file("/lib/x.js", "").unwrap_err().is_missing_parent());
    /// assert_eq!(fs.read_file("/App.jsx").unwrap(), "a");
    /// ```
    pub fn create_file(&mut self, path: impl AsRef<str>, content: impl Into<String>) -> Result<()> {
        self.create_file_with(path, content, CreateOptions::default())
    }

    /// Creates a file with explicit options.
    ///
    /// # Errors
    ///
    /// Same as [`create_file`](Self::create_file), except that missing
    /// parents are created when `options.create_parents` is set.
    pub fn create_file_with(
        &mut self,
        path: impl AsRef<str>,
        content: impl Into<String>,
        options: CreateOptions,
    ) -> Result<()> {
        let path = VfsPath::new(path)?;
        self.ensure_vacant(&path)?;
        let mut created = self.plan_parents(&path, options.create_parents)?;

        for dir in &created {
            insert_node(&mut self.nodes, FileNode::directory(dir.clone()));
        }
        insert_node(&mut self.nodes, FileNode::file(path.clone(), content.into()));
        created.push(path);

        self.subscribers
            .notify(&VfsEvent::new(ChangeKind::Created, created));
        Ok(())
    }

    /// Creates an empty directory. The parent must already exist.
    ///
    /// # Errors
    ///
    /// - `PathConflict` if a node exists at `path`
    /// - `MissingParent` if the parent directory does not exist
    /// - `InvalidPath` if the path is malformed or the parent is a file
    pub fn create_dir(&mut self, path: impl AsRef<str>) -> Result<()> {
        let path = VfsPath::new(path)?;
        self.ensure_vacant(&path)?;
        self.plan_parents(&path, false)?;

        insert_node(&mut self.nodes, FileNode::directory(path.clone()));
        self.subscribers
            .notify(&VfsEvent::new(ChangeKind::Created, vec![path]));
        Ok(())
    }

    /// Creates a directory and any missing ancestors.
    ///
    /// An existing directory at `path` is not an error and produces no event.
    ///
    /// # Errors
    ///
    /// - `PathConflict` if a file exists at `path`
    /// - `InvalidPath` if the path is malformed or an ancestor is a file
    pub fn create_dir_all(&mut self, path: impl AsRef<str>) -> Result<()> {
        let path = VfsPath::new(path)?;
        match self.nodes.get(&path) {
            Some(node) if node.is_dir() => return Ok(()),
            Some(_) => return Err(conflict(&path)),
            None => {}
        }
        let mut created = self.plan_parents(&path, true)?;
        created.push(path);
        for dir in &created {
            insert_node(&mut self.nodes, FileNode::directory(dir.clone()));
        }
        self.subscribers
            .notify(&VfsEvent::new(ChangeKind::Created, created));
        Ok(())
    }

    /// Reads a file's content.
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing exists at `path`
    /// - `IsDirectory` if `path` is a directory
    /// - `InvalidPath` if the path is malformed
    pub fn read_file(&self, path: impl AsRef<str>) -> Result<&str> {
        let path = VfsPath::new(path)?;
        match self.nodes.get(&path) {
            Some(FileNode {
                kind: NodeKind::File { content },
                ..
            }) => Ok(content),
            Some(_) => Err(VfsError::IsDirectory {
                path: path.to_string(),
            }),
            None => Err(VfsError::not_found(&path)),
        }
    }

    /// Replaces the content of an existing file.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the file does not exist (update never creates)
    /// - `IsDirectory` if `path` is a directory
    /// - `InvalidPath` if the path is malformed
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_vfs::FileSystem;
    ///
    /// let mut fs = FileSystem::new();
    /// assert!(fs.update_file("/App.jsx", "x").unwrap_err().is_not_found());
    /// ```
    pub fn update_file(&mut self, path: impl AsRef<str>, content: impl Into<String>) -> Result<()> {
        let path = VfsPath::new(path)?;
        match self.nodes.get_mut(&path) {
            Some(FileNode {
                kind: NodeKind::File { content: existing },
                ..
            }) => *existing = content.into(),
            Some(_) => {
                return Err(VfsError::IsDirectory {
                    path: path.to_string(),
                });
            }
            None => return Err(VfsError::not_found(&path)),
        }
        self.subscribers
            .notify(&VfsEvent::new(ChangeKind::Updated, vec![path]));
        Ok(())
    }

    /// Deletes a file, or a directory with all of its descendants.
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing exists at `path`
    /// - `InvalidPath` for the root or a malformed path
    pub fn delete(&mut self, path: impl AsRef<str>) -> Result<()> {
        let path = VfsPath::new(path)?;
        if path.is_root() {
            return Err(VfsError::invalid("/", "cannot delete the root directory"));
        }
        if !self.nodes.contains_key(&path) {
            return Err(VfsError::not_found(&path));
        }

        let mut removed = vec![path.clone()];
        removed.extend(self.descendants(&path));
        for gone in &removed {
            self.nodes.remove(gone);
        }
        detach(&mut self.nodes, &path);

        self.subscribers
            .notify(&VfsEvent::new(ChangeKind::Deleted, removed));
        Ok(())
    }

    /// Moves a file or directory to a new path.
    ///
    /// Every descendant path of a moved directory is rewritten in one step.
    /// Missing parents of the destination are created.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the source does not exist
    /// - `PathConflict` if the destination exists
    /// - `InvalidPath` for the root, for moving a directory into its own
    ///   subtree, or when a destination ancestor is a file
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_vfs::{CreateOptions, FileSystem};
    ///
    /// let mut fs = FileSystem::new();
    /// fs.create_file_with("/ui/Card.jsx", "card", CreateOptions::with_parents()).unwrap();
    /// fs.rename("/ui", "/components/ui").unwrap();
    ///
    /// assert_eq!(fs.read_file("/components/ui/Card.jsx").unwrap(), "card");
    /// assert!(!fs.exists("/ui"));
    /// ```
    pub fn rename(&mut self, from: impl AsRef<str>, to: impl AsRef<str>) -> Result<()> {
        let from = VfsPath::new(from)?;
        let to = VfsPath::new(to)?;

        if from.is_root() || to.is_root() {
            return Err(VfsError::invalid("/", "cannot rename the root directory"));
        }
        if !self.nodes.contains_key(&from) {
            return Err(VfsError::not_found(&from));
        }
        self.ensure_vacant(&to)?;
        if to.is_descendant_of(&from) {
            return Err(VfsError::invalid(
                to.as_str(),
                format!("cannot move {from} into itself"),
            ));
        }
        let parents = self.plan_parents(&to, true)?;

        let mut staged = self.nodes.clone();
        detach(&mut staged, &from);

        let mut moved = vec![from.clone()];
        moved.extend(self.descendants(&from));
        let relocated: Vec<FileNode> = moved
            .iter()
            .filter_map(|old| staged.remove(old))
            .map(|mut node| {
                node.path = node.path.rebase(&from, &to);
                if let NodeKind::Directory { children } = &mut node.kind {
                    *children = children.iter().map(|c| c.rebase(&from, &to)).collect();
                }
                node
            })
            .collect();

        for dir in parents {
            insert_node(&mut staged, FileNode::directory(dir));
        }
        for node in relocated {
            staged.insert(node.path.clone(), node);
        }
        attach(&mut staged, &to);
        self.nodes = staged;

        self.subscribers
            .notify(&VfsEvent::new(ChangeKind::Renamed, vec![from, to]));
        Ok(())
    }

    /// Alias for [`rename`](Self::rename).
    ///
    /// # Errors
    ///
    /// See [`rename`](Self::rename).
    pub fn move_node(&mut self, from: impl AsRef<str>, to: impl AsRef<str>) -> Result<()> {
        self.rename(from, to)
    }

    /// Lists the immediate children of a directory in name order.
    ///
    /// # Errors
    ///
    /// - `NotFound` if nothing exists at `path`
    /// - `NotDirectory` if `path` is a file
    pub fn list_dir(&self, path: impl AsRef<str>) -> Result<Vec<DirEntry>> {
        let path = VfsPath::new(path)?;
        let Some(node) = self.nodes.get(&path) else {
            return Err(VfsError::not_found(&path));
        };
        let NodeKind::Directory { children } = &node.kind else {
            return Err(VfsError::NotDirectory {
                path: path.to_string(),
            });
        };

        let mut entries: Vec<DirEntry> = children
            .iter()
            .filter_map(|child| self.nodes.get(child))
            .map(|child| DirEntry {
                path: child.path.clone(),
                name: child.path.file_name().to_string(),
                entry_type: if child.is_dir() {
                    EntryType::Directory
                } else {
                    EntryType::File
                },
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Returns `true` if a node exists at `path`. Invalid paths never exist.
    #[must_use]
    pub fn exists(&self, path: impl AsRef<str>) -> bool {
        self.node(path).is_some()
    }

    /// Returns `true` if a file exists at `path`.
    #[must_use]
    pub fn is_file(&self, path: impl AsRef<str>) -> bool {
        self.node(path).is_some_and(FileNode::is_file)
    }

    /// Returns `true` if a directory exists at `path`.
    #[must_use]
    pub fn is_dir(&self, path: impl AsRef<str>) -> bool {
        self.node(path).is_some_and(FileNode::is_dir)
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, path: impl AsRef<str>) -> Option<&FileNode> {
        VfsPath::new(path).ok().and_then(|p| self.nodes.get(&p))
    }

    /// Number of files (directories excluded).
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.nodes.values().filter(|n| n.is_file()).count()
    }

    /// Returns `true` if the tree holds nothing but the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Iterates over `(path, content)` of every file in path order.
    pub fn files(&self) -> impl Iterator<Item = (&VfsPath, &str)> {
        self.nodes.values().filter_map(|node| match &node.kind {
            NodeKind::File { content } => Some((&node.path, content.as_str())),
            NodeKind::Directory { .. } => None,
        })
    }

    /// Iterates over every node, root included, in path order.
    pub fn nodes(&self) -> impl Iterator<Item = &FileNode> {
        self.nodes.values()
    }

    /// Removes everything except the root directory.
    pub fn clear(&mut self) {
        self.nodes.retain(|path, _| path.is_root());
        if let Some(root) = self.nodes.get_mut(&VfsPath::root()) {
            root.kind = NodeKind::Directory {
                children: std::collections::BTreeSet::new(),
            };
        }
        self.subscribers
            .notify(&VfsEvent::new(ChangeKind::Cleared, vec![VfsPath::root()]));
    }

    /// Registers a change listener.
    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.subscribers.add(listener)
    }

    /// Removes a change listener. Returns `false` if it was already removed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Replaces the whole tree and announces it as a single `Hydrated` event.
    pub(crate) fn replace_tree(&mut self, other: Self) {
        self.nodes = other.nodes;
        let paths = self.files().map(|(path, _)| path.clone()).collect();
        self.subscribers
            .notify(&VfsEvent::new(ChangeKind::Hydrated, paths));
    }

    fn ensure_vacant(&self, path: &VfsPath) -> Result<()> {
        if self.nodes.contains_key(path) {
            Err(conflict(path))
        } else {
            Ok(())
        }
    }

    /// Checks the ancestors of `path` and returns the directories that must
    /// be created, outermost first.
    fn plan_parents(&self, path: &VfsPath, create_parents: bool) -> Result<Vec<VfsPath>> {
        let mut missing = Vec::new();
        for ancestor in path.ancestors() {
            match self.nodes.get(&ancestor) {
                Some(node) if node.is_dir() => break,
                Some(_) => {
                    return Err(VfsError::invalid(
                        path.as_str(),
                        format!("{ancestor} is a file"),
                    ));
                }
                None if create_parents => missing.push(ancestor),
                None => {
                    return Err(VfsError::MissingParent {
                        path: path.to_string(),
                        parent: ancestor.to_string(),
                    });
                }
            }
        }
        missing.reverse();
        Ok(missing)
    }

    fn descendants(&self, path: &VfsPath) -> Vec<VfsPath> {
        self.nodes
            .keys()
            .filter(|candidate| candidate.is_descendant_of(path))
            .cloned()
            .collect()
    }
}

fn conflict(path: &VfsPath) -> VfsError {
    VfsError::PathConflict {
        path: path.to_string(),
    }
}

fn insert_node(nodes: &mut Tree, node: FileNode) {
    let path = node.path.clone();
    nodes.insert(path.clone(), node);
    attach(nodes, &path);
}

fn attach(nodes: &mut Tree, path: &VfsPath) {
    if let Some(parent) = path.parent()
        && let Some(FileNode {
            kind: NodeKind::Directory { children },
            ..
        }) = nodes.get_mut(&parent)
    {
        children.insert(path.clone());
    }
}

fn detach(nodes: &mut Tree, path: &VfsPath) {
    if let Some(parent) = path.parent()
        && let Some(FileNode {
            kind: NodeKind::Directory { children },
            ..
        }) = nodes.get_mut(&parent)
    {
        children.remove(path);
    }
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for FileSystem {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            subscribers: Subscribers::default(),
        }
    }
}

impl PartialEq for FileSystem {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Eq for FileSystem {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(fs: &mut FileSystem) -> Arc<Mutex<Vec<VfsEvent>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        fs.subscribe(Arc::new(move |event| sink.lock().unwrap().push(event.clone())));
        events
    }

    fn sample() -> FileSystem {
        let mut fs = FileSystem::new();
        let parents = CreateOptions::with_parents();
        fs.create_file("/App.jsx", "app").unwrap();
        fs.create_file_with("/components/Button.jsx", "button", parents).unwrap();
        fs.create_file_with("/components/ui/Card.jsx", "card", parents).unwrap();
        fs
    }

    #[test]
    fn test_new_has_only_root() {
        let fs = FileSystem::new();
        assert!(fs.is_dir("/"));
        assert!(fs.is_empty());
        assert_eq!(fs.file_count(), 0);
    }

    #[test]
    fn test_create_and_read() {
        let mut fs = FileSystem::new();
        fs.create_file("/App.jsx", "").unwrap();
        assert_eq!(fs.read_file("/App.jsx").unwrap(), "");
        assert!(fs.is_file("//App.jsx/"));
    }

    #[test]
    fn test_create_conflict_leaves_content() {
        let mut fs = sample();
        let before = fs.clone();
        let err = fs.create_file("/App.jsx", "other").unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(fs, before);
    }

    #[test]
    fn test_create_directory_path_conflicts() {
        let mut fs = sample();
        assert!(fs.create_file("/components", "x").unwrap_err().is_conflict());
        assert!(fs.create_file("/", "x").unwrap_err().is_conflict());
    }

    #[test]
    fn test_create_under_file_is_invalid() {
        let mut fs = sample();
        let err = fs.create_file("/App.jsx/inner.js", "").unwrap_err();
        assert!(err.is_invalid_path());
        let err = fs
            .create_file_with("/App.jsx/a/b.js", "", CreateOptions::with_parents())
            .unwrap_err();
        assert!(err.is_invalid_path());
        assert!(!fs.exists("/App.jsx/a"));
    }

    #[test]
    fn test_missing_parent_names_immediate_parent() {
        let mut fs = FileSystem::new();
        match fs.create_file("/a/b/c.js", "").unwrap_err() {
            VfsError::MissingParent { parent, .. } => assert_eq!(parent, "/a/b"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_create_with_parents_emits_one_event() {
        let mut fs = FileSystem::new();
        let events = recorder(&mut fs);
        fs.create_file_with("/a/b/c.js", "", CreateOptions::with_parents())
            .unwrap();
        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        let paths: Vec<&str> = events[0].paths.iter().map(VfsPath::as_str).collect();
        assert_eq!(paths, vec!["/a", "/a/b", "/a/b/c.js"]);
    }

    #[test]
    fn test_create_dir_rules() {
        let mut fs = FileSystem::new();
        fs.create_dir("/lib").unwrap();
        assert!(fs.create_dir("/lib").unwrap_err().is_conflict());
        assert!(fs.create_dir("/x/y").unwrap_err().is_missing_parent());
        fs.create_dir_all("/x/y").unwrap();
        fs.create_dir_all("/x/y").unwrap();
        assert!(fs.is_dir("/x"));
    }

    #[test]
    fn test_update_requires_existing_file() {
        let mut fs = sample();
        fs.update_file("/App.jsx", "new").unwrap();
        assert_eq!(fs.read_file("/App.jsx").unwrap(), "new");
        assert!(fs.update_file("/nope.jsx", "x").unwrap_err().is_not_found());
        assert!(fs.update_file("/components", "x").unwrap_err().is_directory());
    }

    #[test]
    fn test_read_directory_is_error() {
        let fs = sample();
        assert!(fs.read_file("/components").unwrap_err().is_directory());
    }

    #[test]
    fn test_delete_directory_is_recursive() {
        let mut fs = sample();
        let events = recorder(&mut fs);
        fs.delete("/components").unwrap();

        assert!(!fs.exists("/components/ui/Card.jsx"));
        assert!(!fs.exists("/components/ui"));
        assert_eq!(fs.file_count(), 1);
        assert_eq!(fs.list_dir("/").unwrap().len(), 1);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::Deleted);
        assert_eq!(events[0].paths.len(), 4);
    }

    #[test]
    fn test_delete_does_not_touch_sibling_prefix() {
        let mut fs = FileSystem::new();
        fs.create_file("/a.jsx", "").unwrap();
        fs.create_file_with("/a/b.jsx", "", CreateOptions::with_parents())
            .unwrap();
        fs.delete("/a").unwrap();
        assert!(fs.exists("/a.jsx"));
    }

    #[test]
    fn test_delete_root_and_missing() {
        let mut fs = sample();
        assert!(fs.delete("/").unwrap_err().is_invalid_path());
        assert!(fs.delete("/ghost").unwrap_err().is_not_found());
    }

    #[test]
    fn test_rename_file() {
        let mut fs = sample();
        fs.rename("/App.jsx", "/Main.jsx").unwrap();
        assert_eq!(fs.read_file("/Main.jsx").unwrap(), "app");
        assert!(!fs.exists("/App.jsx"));
        let names: Vec<String> = fs.list_dir("/").unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["Main.jsx", "components"]);
    }

    #[test]
    fn test_rename_directory_rewrites_descendants() {
        let mut fs = sample();
        fs.rename("/components", "/src/widgets").unwrap();

        assert_eq!(fs.read_file("/src/widgets/ui/Card.jsx").unwrap(), "card");
        assert_eq!(fs.read_file("/src/widgets/Button.jsx").unwrap(), "button");
        assert!(!fs.exists("/components"));
        assert!(!fs.exists("/components/ui/Card.jsx"));

        let listing = fs.list_dir("/src/widgets/ui").unwrap();
        assert_eq!(listing[0].path.as_str(), "/src/widgets/ui/Card.jsx");
    }

    #[test]
    fn test_rename_conflict_is_atomic() {
        let mut fs = sample();
        let before = fs.clone();
        let events = recorder(&mut fs);

        assert!(fs.rename("/App.jsx", "/components/Button.jsx").unwrap_err().is_conflict());
        assert!(fs.rename("/components", "/components/ui/inner").unwrap_err().is_invalid_path());
        assert!(fs.rename("/ghost", "/x").unwrap_err().is_not_found());
        assert!(fs.rename("/App.jsx", "/App.jsx").unwrap_err().is_conflict());

        assert_eq!(fs, before);
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_list_dir_errors() {
        let fs = sample();
        assert!(fs.list_dir("/App.jsx").unwrap_err().is_not_directory());
        assert!(fs.list_dir("/nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_list_dir_marks_types() {
        let fs = sample();
        let entries = fs.list_dir("/components").unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Button.jsx");
        assert_eq!(entries[0].entry_type, EntryType::File);
        assert_eq!(entries[1].entry_type, EntryType::Directory);
    }

    #[test]
    fn test_files_in_path_order() {
        let fs = sample();
        let paths: Vec<&str> = fs.files().map(|(p, _)| p.as_str()).collect();
        assert_eq!(
            paths,
            vec!["/App.jsx", "/components/Button.jsx", "/components/ui/Card.jsx"]
        );
    }

    #[test]
    fn test_clear() {
        let mut fs = sample();
        let events = recorder(&mut fs);
        fs.clear();
        assert!(fs.is_empty());
        assert!(fs.list_dir("/").unwrap().is_empty());
        assert_eq!(events.lock().unwrap()[0].kind, ChangeKind::Cleared);
    }

    #[test]
    fn test_failed_mutation_emits_nothing() {
        let mut fs = sample();
        let events = recorder(&mut fs);
        let _ = fs.create_file("/App.jsx", "");
        let _ = fs.update_file("/nope", "");
        let _ = fs.delete("/nope");
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut fs = FileSystem::new();
        let events = Arc::new(Mutex::new(0_usize));
        let sink = Arc::clone(&events);
        let id = fs.subscribe(Arc::new(move |_| *sink.lock().unwrap() += 1));

        fs.create_file("/a.js", "").unwrap();
        assert!(fs.unsubscribe(id));
        assert!(!fs.unsubscribe(id));
        fs.create_file("/b.js", "").unwrap();
        assert_eq!(*events.lock().unwrap(), 1);
    }

    #[test]
    fn test_clone_drops_subscribers() {
        let mut fs = FileSystem::new();
        fs.subscribe(Arc::new(|_| {}));
        let copy = fs.clone();
        assert_eq!(fs.subscriber_count(), 1);
        assert_eq!(copy.subscriber_count(), 0);
        assert_eq!(copy, fs);
    }
}

//! Core types for the virtual file system.
//!
//! This module defines strong types for VFS paths, nodes, and errors.
//!
//! # Examples
//!
//! ```
//! use uigen_vfs::VfsPath;
//!
//! let path = VfsPath::new("/components//Button.jsx/").unwrap();
//! assert_eq!(path.as_str(), "/components/Button.jsx");
//! assert_eq!(path.parent().unwrap().as_str(), "/components");
//! ```

use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during VFS operations.
///
/// All variants carry the offending path and expose `is_xxx()` helpers
/// for classification.
///
/// # Examples
///
/// ```
/// use uigen_vfs::VfsError;
///
/// let error = VfsError::NotFound {
///     path: "/missing.jsx".to_string(),
/// };
///
/// assert!(error.is_not_found());
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VfsError {
    /// Path is malformed or the operation is not allowed on it
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath {
        /// The offending path
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// A node already exists at the destination
    #[error("Path already exists: {path}")]
    PathConflict {
        /// The existing path
        path: String,
    },

    /// No node exists at the path
    #[error("File not found: {path}")]
    NotFound {
        /// The missing path
        path: String,
    },

    /// The parent directory does not exist
    #[error("Parent directory does not exist: {parent}")]
    MissingParent {
        /// Path that was being created
        path: String,
        /// The missing parent
        parent: String,
    },

    /// Path exists but is a file where a directory was required
    #[error("Not a directory: {path}")]
    NotDirectory {
        /// The file path
        path: String,
    },

    /// Path exists but is a directory where a file was required
    #[error("Is a directory: {path}")]
    IsDirectory {
        /// The directory path
        path: String,
    },

    /// A serialized snapshot could not be hydrated
    #[error("Invalid snapshot: {message}")]
    InvalidSnapshot {
        /// Description of the problem
        message: String,
    },
}

impl VfsError {
    pub(crate) fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(path: &VfsPath) -> Self {
        Self::NotFound {
            path: path.to_string(),
        }
    }

    /// Returns `true` if this is a not-found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a path conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::PathConflict { .. })
    }

    /// Returns `true` if this is an invalid path error.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_vfs::VfsPath;
    ///
    /// let error = VfsPath::new("relative/path").unwrap_err();
    /// assert!(error.is_invalid_path());
    /// ```
    #[must_use]
    pub const fn is_invalid_path(&self) -> bool {
        matches!(self, Self::InvalidPath { .. })
    }

    /// Returns `true` if this is a missing-parent error.
    #[must_use]
    pub const fn is_missing_parent(&self) -> bool {
        matches!(self, Self::MissingParent { .. })
    }

    /// Returns `true` if this is a not-a-directory error.
    #[must_use]
    pub const fn is_not_directory(&self) -> bool {
        matches!(self, Self::NotDirectory { .. })
    }

    /// Returns `true` if this is an is-a-directory error.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self, Self::IsDirectory { .. })
    }
}

/// A validated, normalized virtual file system path.
///
/// `VfsPath` always uses Unix conventions:
/// - Absolute (starts with '/')
/// - No empty or `.` segments, no trailing slash (except root)
/// - No parent references (`..`)
///
/// Ordering is byte-wise on the normalized string, so every directory sorts
/// directly before its descendants.
///
/// # Examples
///
/// ```
/// use uigen_vfs::VfsPath;
///
/// assert!(VfsPath::new("relative/path").is_err());
/// assert!(VfsPath::new("/parent/../escape").is_err());
/// assert_eq!(VfsPath::new("/a/./b").unwrap().as_str(), "/a/b");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VfsPath(String);

impl VfsPath {
    /// Creates a new `VfsPath`, normalizing separators.
    ///
    /// # Errors
    ///
    /// Returns `VfsError::InvalidPath` if the path is empty, relative,
    /// contains a NUL byte, or contains a `..` segment.
    pub fn new(path: impl AsRef<str>) -> Result<Self> {
        let raw = path.as_ref();

        if raw.trim().is_empty() {
            return Err(VfsError::invalid(raw, "path is empty"));
        }
        if raw.contains('\0') {
            return Err(VfsError::invalid(raw, "path contains a NUL byte"));
        }
        if !raw.starts_with('/') {
            return Err(VfsError::invalid(raw, "path must be absolute"));
        }

        let mut segments = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(VfsError::invalid(raw, "path must not contain '..'")),
                other => segments.push(other),
            }
        }

        Ok(Self(format!("/{}", segments.join("/"))))
    }

    /// Returns the root path `/`.
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Returns the path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for `/`.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Returns the parent directory, or `None` for root.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_vfs::VfsPath;
    ///
    /// let path = VfsPath::new("/App.jsx")?;
    /// assert!(path.parent().unwrap().is_root());
    /// assert!(VfsPath::root().parent().is_none());
    /// # Ok::<(), uigen_vfs::VfsError>(())
    /// ```
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        self.0.rfind('/').map(|pos| {
            if pos == 0 {
                Self::root()
            } else {
                Self(self.0[..pos].to_string())
            }
        })
    }

    /// Returns the final segment, or `""` for root.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rfind('/').map_or("", |pos| &self.0[pos + 1..])
    }

    /// Returns the extension of the final segment without the dot.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_vfs::VfsPath;
    ///
    /// assert_eq!(VfsPath::new("/App.tsx")?.extension(), Some("tsx"));
    /// assert_eq!(VfsPath::new("/components")?.extension(), None);
    /// # Ok::<(), uigen_vfs::VfsError>(())
    /// ```
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(pos) => Some(&name[pos + 1..]),
        }
    }

    /// Appends a single segment.
    ///
    /// # Errors
    ///
    /// Returns `VfsError::InvalidPath` if the segment is empty or contains
    /// `/` or is `..`.
    pub fn join(&self, segment: &str) -> Result<Self> {
        if segment.is_empty() || segment.contains('/') || segment == ".." || segment == "." {
            return Err(VfsError::invalid(segment, "invalid path segment"));
        }
        if self.is_root() {
            Ok(Self(format!("/{segment}")))
        } else {
            Ok(Self(format!("{}/{segment}", self.0)))
        }
    }

    /// Returns `true` if `self` lies strictly below `ancestor`.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_vfs::VfsPath;
    ///
    /// let dir = VfsPath::new("/a")?;
    /// assert!(VfsPath::new("/a/b.jsx")?.is_descendant_of(&dir));
    /// assert!(!VfsPath::new("/ab.jsx")?.is_descendant_of(&dir));
    /// assert!(!dir.is_descendant_of(&dir));
    /// # Ok::<(), uigen_vfs::VfsError>(())
    /// ```
    #[must_use]
    pub fn is_descendant_of(&self, ancestor: &Self) -> bool {
        if ancestor.is_root() {
            return !self.is_root();
        }
        self.0.len() > ancestor.0.len()
            && self.0.starts_with(&ancestor.0)
            && self.0.as_bytes()[ancestor.0.len()] == b'/'
    }

    /// Moves this path from under `from` to under `to`.
    ///
    /// `self` must be `from` or one of its descendants.
    pub(crate) fn rebase(&self, from: &Self, to: &Self) -> Self {
        if self == from {
            return to.clone();
        }
        let suffix = if from.is_root() {
            &self.0[1..]
        } else {
            &self.0[from.0.len() + 1..]
        };
        if to.is_root() {
            Self(format!("/{suffix}"))
        } else {
            Self(format!("{}/{suffix}", to.0))
        }
    }

    /// Ancestors from the parent up to root, nearest first.
    pub(crate) fn ancestors(&self) -> impl Iterator<Item = Self> {
        std::iter::successors(self.parent(), Self::parent)
    }
}

impl fmt::Display for VfsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VfsPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for VfsPath {
    type Error = VfsError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

/// Kind of node plus its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A file with text content (possibly empty)
    File {
        /// File content
        content: String,
    },
    /// A directory and the paths of its immediate children
    Directory {
        /// Immediate children
        children: BTreeSet<VfsPath>,
    },
}

/// One file or directory in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// Normalized absolute path
    pub path: VfsPath,
    /// File or directory payload
    pub kind: NodeKind,
}

impl FileNode {
    pub(crate) const fn file(path: VfsPath, content: String) -> Self {
        Self {
            path,
            kind: NodeKind::File { content },
        }
    }

    pub(crate) const fn directory(path: VfsPath) -> Self {
        Self {
            path,
            kind: NodeKind::Directory {
                children: BTreeSet::new(),
            },
        }
    }

    /// Returns `true` for files.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    /// Returns `true` for directories.
    #[must_use]
    pub const fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    /// File content, or `None` for directories.
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { content } => Some(content),
            NodeKind::Directory { .. } => None,
        }
    }
}

/// Entry type reported by directory listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// One immediate child returned by `list_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Full path of the child
    pub path: VfsPath,
    /// Final segment of the path
    pub name: String,
    /// File or directory
    pub entry_type: EntryType,
}

/// Type alias for VFS operation results.
pub type Result<T> = std::result::Result<T, VfsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vfs_path_normalizes_slashes() {
        let path = VfsPath::new("//components///ui//Button.jsx/").unwrap();
        assert_eq!(path.as_str(), "/components/ui/Button.jsx");
    }

    #[test]
    fn test_vfs_path_root_forms() {
        assert!(VfsPath::new("/").unwrap().is_root());
        assert!(VfsPath::new("///").unwrap().is_root());
        assert!(VfsPath::new("/.").unwrap().is_root());
    }

    #[test]
    fn test_vfs_path_rejects_bad_input() {
        assert!(VfsPath::new("").unwrap_err().is_invalid_path());
        assert!(VfsPath::new("App.jsx").unwrap_err().is_invalid_path());
        assert!(VfsPath::new("/a/../b").unwrap_err().is_invalid_path());
        assert!(VfsPath::new("/a\0b").unwrap_err().is_invalid_path());
    }

    #[test]
    fn test_vfs_path_dotted_names_are_not_parent_refs() {
        let path = VfsPath::new("/a/..b/c...jsx").unwrap();
        assert_eq!(path.as_str(), "/a/..b/c...jsx");
    }

    #[test]
    fn test_vfs_path_parent_chain() {
        let path = VfsPath::new("/a/b/c.jsx").unwrap();
        let ancestors: Vec<String> = path.ancestors().map(|p| p.to_string()).collect();
        assert_eq!(ancestors, vec!["/a/b", "/a", "/"]);
    }

    #[test]
    fn test_vfs_path_file_name_and_extension() {
        let path = VfsPath::new("/lib/utils.test.ts").unwrap();
        assert_eq!(path.file_name(), "utils.test.ts");
        assert_eq!(path.extension(), Some("ts"));
        assert_eq!(VfsPath::new("/.env").unwrap().extension(), None);
        assert_eq!(VfsPath::root().file_name(), "");
    }

    #[test]
    fn test_vfs_path_join() {
        let root = VfsPath::root();
        assert_eq!(root.join("App.jsx").unwrap().as_str(), "/App.jsx");
        let dir = VfsPath::new("/components").unwrap();
        assert_eq!(dir.join("Card.jsx").unwrap().as_str(), "/components/Card.jsx");
        assert!(dir.join("a/b").is_err());
        assert!(dir.join("..").is_err());
    }

    #[test]
    fn test_vfs_path_rebase() {
        let from = VfsPath::new("/a").unwrap();
        let to = VfsPath::new("/z/y").unwrap();
        let child = VfsPath::new("/a/b/c.jsx").unwrap();
        assert_eq!(child.rebase(&from, &to).as_str(), "/z/y/b/c.jsx");
        assert_eq!(from.rebase(&from, &to), to);
    }

    #[test]
    fn test_vfs_path_ordering_groups_subtrees() {
        let mut paths = vec![
            VfsPath::new("/a.jsx").unwrap(),
            VfsPath::new("/a/b.jsx").unwrap(),
            VfsPath::new("/a").unwrap(),
        ];
        paths.sort();
        assert_eq!(paths[0].as_str(), "/a");
        assert_eq!(paths[1].as_str(), "/a.jsx");
        assert_eq!(paths[2].as_str(), "/a/b.jsx");
    }

    #[test]
    fn test_file_node_accessors() {
        let node = FileNode::file(VfsPath::new("/x.js").unwrap(), String::new());
        assert!(node.is_file());
        assert_eq!(node.content(), Some(""));

        let dir = FileNode::directory(VfsPath::root());
        assert!(dir.is_dir());
        assert_eq!(dir.content(), None);
    }

    #[test]
    fn test_vfs_error_classification() {
        let error = VfsError::PathConflict {
            path: "/a".to_string(),
        };
        assert!(error.is_conflict());
        assert!(!error.is_not_found());

        let error = VfsError::MissingParent {
            path: "/a/b".to_string(),
            parent: "/a".to_string(),
        };
        assert!(error.is_missing_parent());
        assert!(error.to_string().contains("/a"));
    }
}

//! In-memory virtual file system for generated UI projects.
//!
//! Every file the agent writes lives here; nothing touches the host disk.
//! The tree is rooted at `/`, mutated only through [`FileSystem`] methods,
//! serialized to a flat JSON object at persistence boundaries, and observed
//! by subscribers that recompile the preview on change.
//!
//! # Examples
//!
//! ```
//! use uigen_vfs::{FileSystem, VfsPath};
//!
//! let mut fs = FileSystem::new();
//! fs.create_file("/App.jsx", "export default () => <h1>Hi</h1>;").unwrap();
//!
//! let snapshot = fs.serialize().unwrap();
//! let restored = FileSystem::deserialize(&snapshot).unwrap();
//! assert_eq!(restored.read_file("/App.jsx").unwrap(), fs.read_file("/App.jsx").unwrap());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod builder;
pub mod events;
mod snapshot;
pub mod types;
pub mod vfs;

pub use builder::FilesBuilder;
pub use events::{ChangeKind, Listener, SubscriptionId, VfsEvent};
pub use types::{DirEntry, EntryType, FileNode, NodeKind, Result, VfsError, VfsPath};
pub use vfs::{CreateOptions, FileSystem};

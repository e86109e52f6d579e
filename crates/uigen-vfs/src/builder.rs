//! Builder pattern for constructing project file systems.
//!
//! Provides a fluent API for seeding a [`FileSystem`] in tests, fixtures,
//! and the CLI. Parent directories are created automatically.
//!
//! # Examples
//!
//! ```
//! use uigen_vfs::FilesBuilder;
//!
//! let fs = FilesBuilder::new()
//!     .add_file("/App.jsx", "export default () => null;")
//!     .add_file("/components/Card.jsx", "export const Card = () => null;")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(fs.file_count(), 2);
//! ```

use crate::types::{Result, VfsError};
use crate::vfs::{CreateOptions, FileSystem};

/// Builder for [`FileSystem`] instances.
///
/// Errors are collected while building and the first one is returned from
/// [`build`](Self::build).
#[derive(Debug, Default)]
pub struct FilesBuilder {
    fs: FileSystem,
    errors: Vec<VfsError>,
}

impl FilesBuilder {
    /// Creates a builder over an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, creating missing parent directories.
    #[must_use]
    pub fn add_file(mut self, path: impl AsRef<str>, content: impl Into<String>) -> Self {
        if let Err(e) = self
            .fs
            .create_file_with(path, content, CreateOptions::with_parents())
        {
            self.errors.push(e);
        }
        self
    }

    /// Adds several files.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_vfs::FilesBuilder;
    ///
    /// let fs = FilesBuilder::new()
    ///     .add_files([("/a.js", "1"), ("/b.js", "2")])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(fs.file_count(), 2);
    /// ```
    #[must_use]
    pub fn add_files<P, C>(mut self, files: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: AsRef<str>,
        C: Into<String>,
    {
        for (path, content) in files {
            self = self.add_file(path, content);
        }
        self
    }

    /// Adds an empty directory, creating missing ancestors.
    #[must_use]
    pub fn add_dir(mut self, path: impl AsRef<str>) -> Self {
        if let Err(e) = self.fs.create_dir_all(path) {
            self.errors.push(e);
        }
        self
    }

    /// Builds the file system.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered while adding entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use uigen_vfs::FilesBuilder;
    ///
    /// let result = FilesBuilder::new()
    ///     .add_file("/App.jsx", "")
    ///     .add_file("/App.jsx", "again")
    ///     .build();
    /// assert!(result.unwrap_err().is_conflict());
    /// ```
    pub fn build(self) -> Result<FileSystem> {
        match self.errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.fs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_builder() {
        let fs = FilesBuilder::new().build().unwrap();
        assert!(fs.is_empty());
    }

    #[test]
    fn test_first_error_wins() {
        let err = FilesBuilder::new()
            .add_file("relative.js", "")
            .add_file("/a.js", "")
            .add_file("/a.js", "")
            .build()
            .unwrap_err();
        assert!(err.is_invalid_path());
    }

    #[test]
    fn test_add_dir() {
        let fs = FilesBuilder::new().add_dir("/assets/icons").build().unwrap();
        assert!(fs.is_dir("/assets/icons"));
        assert_eq!(fs.file_count(), 0);
    }
}

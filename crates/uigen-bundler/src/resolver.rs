//! Module resolution over the virtual file system.
//!
//! The resolver maps an import specifier, as written in a source file, to a
//! [`ModuleIdentity`]: a project file, a stylesheet, or an allow-listed
//! hosted module. It never touches the disk or the network.
//!
//! # Examples
//!
//! ```
//! use uigen_bundler::{ModuleIdentity, Resolver};
//! use uigen_core::ExternalModules;
//! use uigen_vfs::FilesBuilder;
//!
//! let fs = FilesBuilder::new()
//!     .add_file("/App.jsx", "")
//!     .add_file("/components/Button.tsx", "")
//!     .build()
//!     .unwrap();
//! let externals = ExternalModules::default();
//! let resolver = Resolver::new(&fs, &externals);
//!
//! let entry = resolver.find_entry().unwrap();
//! assert_eq!(entry.as_str(), "/App.jsx");
//!
//! let button = resolver.resolve("./components/Button", &entry).unwrap();
//! assert_eq!(button.key(), "/components/Button.tsx");
//!
//! let react = resolver.resolve("react", &entry).unwrap();
//! assert!(matches!(react, ModuleIdentity::External(_)));
//! ```

use std::fmt;
use uigen_core::{ENTRY_CANDIDATES, Error, ExternalModule, ExternalModules, Result};
use uigen_vfs::{FileSystem, VfsPath};

/// Extensions tried, in priority order, when a specifier has none.
pub const EXTENSIONS: [&str; 4] = [".jsx", ".tsx", ".js", ".ts"];

/// Prefix of project-root aliased imports (`@/components/Button`).
const ALIAS_PREFIX: &str = "@/";

/// What an import specifier resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleIdentity {
    /// A script file in the project
    Local(VfsPath),
    /// A stylesheet in the project; its content joins the styling layer
    Style(VfsPath),
    /// An allow-listed hosted module
    External(ExternalModule),
}

impl ModuleIdentity {
    /// Stable identifier used as the module registry key in the bundle.
    ///
    /// Project files use their path, hosted modules their bare name.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Local(path) | Self::Style(path) => path.as_str(),
            Self::External(module) => &module.name,
        }
    }

    /// Project path, for local scripts and stylesheets.
    #[must_use]
    pub const fn path(&self) -> Option<&VfsPath> {
        match self {
            Self::Local(path) | Self::Style(path) => Some(path),
            Self::External(_) => None,
        }
    }

    /// Returns `true` for hosted modules.
    #[must_use]
    pub const fn is_external(&self) -> bool {
        matches!(self, Self::External(_))
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External(module) => write!(f, "{} ({})", module.name, module.url),
            _ => f.write_str(self.key()),
        }
    }
}

/// Resolves specifiers against one VFS snapshot and allow-list.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    fs: &'a FileSystem,
    externals: &'a ExternalModules,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver over `fs`.
    #[must_use]
    pub const fn new(fs: &'a FileSystem, externals: &'a ExternalModules) -> Self {
        Self { fs, externals }
    }

    /// Picks the first existing entry candidate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntryNotFound`] listing the candidates when none is a
    /// file.
    pub fn find_entry(&self) -> Result<VfsPath> {
        ENTRY_CANDIDATES
            .iter()
            .find(|candidate| self.fs.is_file(candidate))
            .and_then(|candidate| VfsPath::new(candidate).ok())
            .ok_or_else(|| Error::EntryNotFound {
                candidates: ENTRY_CANDIDATES.iter().map(ToString::to_string).collect(),
            })
    }

    /// Resolves `specifier` as imported from `importer`.
    ///
    /// # Errors
    ///
    /// - [`Error::ModuleNotFound`] for project specifiers with no matching
    ///   file, including ones that climb above the root
    /// - [`Error::UnsupportedModule`] for bare specifiers outside the
    ///   allow-list
    pub fn resolve(&self, specifier: &str, importer: &VfsPath) -> Result<ModuleIdentity> {
        let not_found = || Error::ModuleNotFound {
            specifier: specifier.to_string(),
            importer: importer.to_string(),
        };

        let target = if specifier.starts_with("./") || specifier.starts_with("../") {
            let base = importer.parent().unwrap_or_else(VfsPath::root);
            join_relative(&base, specifier).ok_or_else(not_found)?
        } else if specifier.starts_with('/') {
            join_relative(&VfsPath::root(), &specifier[1..]).ok_or_else(not_found)?
        } else if let Some(rest) = specifier.strip_prefix(ALIAS_PREFIX) {
            join_relative(&VfsPath::root(), rest).ok_or_else(not_found)?
        } else {
            return self
                .externals
                .get(specifier)
                .map(ModuleIdentity::External)
                .ok_or_else(|| Error::UnsupportedModule {
                    specifier: specifier.to_string(),
                    importer: importer.to_string(),
                });
        };

        let path = self.find_file(&target).ok_or_else(not_found)?;
        tracing::trace!(specifier, importer = %importer, resolved = %path, "resolved import");
        if path.extension() == Some("css") {
            Ok(ModuleIdentity::Style(path))
        } else {
            Ok(ModuleIdentity::Local(path))
        }
    }

    /// Exact file, then extension probing, then directory index probing.
    fn find_file(&self, target: &str) -> Option<VfsPath> {
        let file = |candidate: String| {
            self.fs
                .is_file(&candidate)
                .then(|| VfsPath::new(&candidate).ok())
                .flatten()
        };

        if let Some(found) = file(target.to_string()) {
            return Some(found);
        }
        let trimmed = target.trim_end_matches('/');
        if let Some(found) = EXTENSIONS.iter().find_map(|ext| file(format!("{trimmed}{ext}"))) {
            return Some(found);
        }
        EXTENSIONS
            .iter()
            .find_map(|ext| file(format!("{trimmed}/index{ext}")))
    }
}

/// Joins `rest` onto `base`, folding `.` and `..` segments. Returns `None`
/// when the result would climb above the root.
fn join_relative(base: &VfsPath, rest: &str) -> Option<String> {
    let mut segments: Vec<&str> = base.as_str().split('/').filter(|s| !s.is_empty()).collect();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            segment => segments.push(segment),
        }
    }
    Some(format!("/{}", segments.join("/")))
}

//! Module resolution, transpilation, and bundling for UIGen previews.
//!
//! A compile pass turns the current [`FileSystem`](uigen_vfs::FileSystem)
//! into one executable ES module:
//!
//! 1. [`Resolver`] picks the entry point and maps import specifiers to
//!    project files, stylesheets, or allow-listed hosted modules
//! 2. [`transpile`] compiles each file: JSX to factory calls, TypeScript
//!    type erasure, and ES module syntax to registry calls
//! 3. [`Bundler`] walks the graph depth-first and links the modules,
//!    dependencies first, into a [`Bundle`]
//!
//! Compilation is purely syntactic. It catches the errors a preview author
//! most often makes (unterminated literals, unbalanced brackets, mismatched
//! JSX tags, bad import clauses) and reports them with file and position;
//! everything else surfaces when the bundle runs.
//!
//! # Examples
//!
//! ```
//! use uigen_bundler::Bundler;
//! use uigen_core::{Error, ExternalModules};
//! use uigen_vfs::FilesBuilder;
//!
//! let fs = FilesBuilder::new()
//!     .add_file("/App.jsx", "import pad from 'left-pad';\nexport default () => pad;")
//!     .build()
//!     .unwrap();
//!
//! let err = Bundler::new(ExternalModules::default()).bundle(&fs).unwrap_err();
//! assert!(matches!(err, Error::UnsupportedModule { .. }));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

mod bundler;
mod cache;
mod jsx;
mod lexer;
mod modules;
mod resolver;
mod scope;
mod transpiler;
mod typescript;

pub use bundler::{Bundle, Bundler, ResolvedModule, Stylesheet};
pub use cache::{CacheKey, CacheStats, TranspileCache};
pub use resolver::{EXTENSIONS, ModuleIdentity, Resolver};
pub use transpiler::{TranspiledModule, transpile};

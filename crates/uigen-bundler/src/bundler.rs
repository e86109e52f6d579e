//! Module graph traversal and bundle linking.
//!
//! The bundler walks the import graph depth-first from the entry point,
//! compiles every project module once, and links the results into a single
//! ES module:
//!
//! ```text
//! import * as __ext_0 from "https://esm.sh/react@19.1.0";   // hoisted externals
//! const __modules = new Map(); ...                          // registry runtime
//! const __jsx = ...createElement;                           // JSX factory
//! __modules.set("react", __ext_0);                          // externals, styles
//! __define("/Button.jsx", function (__exports) { ... });    // dependencies first
//! __define("/App.jsx", function (__exports) { ... });       // entry last
//! const __entry = __require("/App.jsx");
//! export default __entry.default;
//! ```
//!
//! Factories run lazily on first `__require`, and a module's exports object is
//! registered before its factory runs, so import cycles terminate.

use crate::cache::TranspileCache;
use crate::jsx::{FACTORY, FRAGMENT, quote_js};
use crate::modules::REQUIRE;
use crate::resolver::{ModuleIdentity, Resolver};
use crate::transpiler::{TranspiledModule, transpile};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use uigen_core::{Error, ExternalModule, ExternalModules, Result};
use uigen_vfs::{FileSystem, VfsPath};

/// Registry runtime prepended to every bundle.
const RUNTIME: &str = r#"const __modules = new Map();
const __factories = new Map();
function __define(id, factory) {
  __factories.set(id, factory);
}
function __require(id) {
  if (__modules.has(id)) return __modules.get(id);
  const factory = __factories.get(id);
  if (!factory) throw new Error("Module not registered: " + id);
  const exports = {};
  __modules.set(id, exports);
  factory(exports);
  return exports;
}
function __export(target, getters) {
  for (const name of Object.keys(getters)) {
    Object.defineProperty(target, name, { enumerable: true, get: getters[name] });
  }
}
function __exportStar(target, source) {
  for (const name of Object.keys(source)) {
    if (name === "default" || Object.prototype.hasOwnProperty.call(target, name)) continue;
    Object.defineProperty(target, name, { enumerable: true, get: () => source[name] });
  }
}"#;

/// One compiled project module as placed in the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    /// Specifier the module was first reached by (the entry path for the entry)
    pub specifier: String,
    /// Resolved identity
    pub identity: ModuleIdentity,
    /// Compiled module body with imports linked
    pub code: String,
    /// Specifiers imported by this module, in source order
    pub dependencies: Vec<String>,
    /// 1-based bundle line of the first line of `code`
    pub bundle_line: usize,
}

impl ResolvedModule {
    /// Number of lines `code` occupies in the bundle.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.code.split('\n').count()
    }
}

/// A stylesheet imported by some module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet {
    /// Project path of the stylesheet
    pub path: VfsPath,
    /// Raw CSS
    pub content: String,
}

/// Output of one full compile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    /// Entry point the graph was walked from
    pub entry: VfsPath,
    /// Project modules, dependencies before dependents
    pub modules: Vec<ResolvedModule>,
    /// Hosted modules referenced by the bundle, in discovery order
    pub externals: Vec<ExternalModule>,
    /// Stylesheets in discovery order
    pub styles: Vec<Stylesheet>,
    /// Whether the entry module exports `default`
    pub has_default_export: bool,
    /// The linked ES module
    pub code: String,
}

impl Bundle {
    /// Looks up a compiled module by project path.
    #[must_use]
    pub fn module(&self, path: &str) -> Option<&ResolvedModule> {
        self.modules.iter().find(|m| m.identity.key() == path)
    }

    /// Maps a 1-based bundle line back to `(file, line)` in the project.
    ///
    /// Returns `None` for lines of the registry runtime and glue code.
    #[must_use]
    pub fn source_location(&self, bundle_line: usize) -> Option<(&VfsPath, usize)> {
        self.modules.iter().find_map(|module| {
            let offset = bundle_line.checked_sub(module.bundle_line)?;
            if offset < module.line_count() {
                module.identity.path().map(|path| (path, offset + 1))
            } else {
                None
            }
        })
    }

    /// Concatenated CSS of all collected stylesheets.
    #[must_use]
    pub fn stylesheet(&self) -> String {
        self.styles
            .iter()
            .map(|s| format!("/* {} */\n{}", s.path, s.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Compiles a project into a [`Bundle`].
///
/// # Examples
///
/// ```
/// use uigen_bundler::Bundler;
/// use uigen_core::ExternalModules;
/// use uigen_vfs::FilesBuilder;
///
/// let fs = FilesBuilder::new()
///     .add_file("/App.jsx", "import Button from './Button';\nexport default () => <Button />;")
///     .add_file("/Button.jsx", "export default function Button() { return <button>Go</button>; }")
///     .build()
///     .unwrap();
///
/// let bundle = Bundler::new(ExternalModules::default()).bundle(&fs).unwrap();
/// assert_eq!(bundle.entry.as_str(), "/App.jsx");
/// assert_eq!(bundle.modules.len(), 2);
/// assert_eq!(bundle.modules[1].identity.key(), "/App.jsx");
/// assert!(bundle.has_default_export);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Bundler {
    externals: ExternalModules,
    cache: Option<Arc<TranspileCache>>,
}

/// A module whose imports are still being walked.
struct Pending {
    specifier: String,
    path: VfsPath,
    module: Arc<TranspiledModule>,
    ids: Vec<String>,
}

impl Bundler {
    /// Creates a bundler resolving bare imports against `externals`.
    #[must_use]
    pub const fn new(externals: ExternalModules) -> Self {
        Self {
            externals,
            cache: None,
        }
    }

    /// Reuses compiled modules from `cache` across compile passes.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<TranspileCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Allow-listed hosted modules.
    #[must_use]
    pub const fn externals(&self) -> &ExternalModules {
        &self.externals
    }

    /// Transpile cache, when configured.
    #[must_use]
    pub fn cache(&self) -> Option<&TranspileCache> {
        self.cache.as_deref()
    }

    /// Runs one full compile pass over `fs`.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryNotFound`] when no entry candidate exists
    /// - [`Error::ModuleNotFound`] / [`Error::UnsupportedModule`] for imports
    ///   that do not resolve
    /// - [`Error::TranspileError`] for the first module with a syntax error
    pub fn bundle(&self, fs: &FileSystem) -> Result<Bundle> {
        let started = Instant::now();
        let resolver = Resolver::new(fs, &self.externals);
        let entry = resolver.find_entry()?;
        let mut graph = Graph::default();

        graph.visited.insert(entry.to_string());
        let mut stack = vec![self.open(fs, entry.to_string(), entry.clone())?];

        while let Some(top) = stack.last_mut() {
            let Some(specifier) = top.module.specifiers().get(top.ids.len()).cloned() else {
                if let Some(done) = stack.pop() {
                    graph.finish(done);
                }
                continue;
            };
            let identity = resolver.resolve(&specifier, &top.path)?;
            top.ids.push(identity.key().to_string());

            match identity {
                ModuleIdentity::External(module) => graph.add_external(module),
                ModuleIdentity::Style(path) => {
                    if graph.visited.insert(path.to_string()) {
                        let content = read(fs, &path, &specifier, &top.path)?.to_string();
                        graph.styles.push(Stylesheet { path, content });
                    }
                }
                ModuleIdentity::Local(path) => {
                    if graph.visited.insert(path.to_string()) {
                        let pending = self.open(fs, specifier, path)?;
                        stack.push(pending);
                    }
                }
            }
        }

        if graph.uses_jsx {
            let react = self.externals.get(ExternalModules::FRAMEWORK).ok_or_else(|| {
                Error::UnsupportedModule {
                    specifier: ExternalModules::FRAMEWORK.to_string(),
                    importer: graph.first_jsx.clone().unwrap_or_else(|| entry.to_string()),
                }
            })?;
            graph.add_external(react);
        }

        let bundle = graph.link(entry);
        tracing::info!(
            entry = %bundle.entry,
            modules = bundle.modules.len(),
            externals = bundle.externals.len(),
            styles = bundle.styles.len(),
            bytes = bundle.code.len(),
            elapsed_us = started.elapsed().as_micros(),
            "bundled project"
        );
        Ok(bundle)
    }

    fn open(&self, fs: &FileSystem, specifier: String, path: VfsPath) -> Result<Pending> {
        let source = fs.read_file(&path).map_err(|_| Error::ModuleNotFound {
            specifier: specifier.clone(),
            importer: path.to_string(),
        })?;
        let module = match &self.cache {
            Some(cache) => cache.get_or_transpile(&path, source)?,
            None => Arc::new(transpile(&path, source)?),
        };
        Ok(Pending {
            specifier,
            path,
            module,
            ids: Vec::new(),
        })
    }
}

fn read<'fs>(
    fs: &'fs FileSystem,
    path: &VfsPath,
    specifier: &str,
    importer: &VfsPath,
) -> Result<&'fs str> {
    fs.read_file(path).map_err(|_| Error::ModuleNotFound {
        specifier: specifier.to_string(),
        importer: importer.to_string(),
    })
}

/// State accumulated during one traversal.
#[derive(Default)]
struct Graph {
    visited: HashSet<String>,
    finished: Vec<(Pending, String)>,
    externals: Vec<ExternalModule>,
    styles: Vec<Stylesheet>,
    uses_jsx: bool,
    first_jsx: Option<String>,
}

impl Graph {
    fn add_external(&mut self, module: ExternalModule) {
        if !self.externals.iter().any(|m| m.name == module.name) {
            self.externals.push(module);
        }
    }

    fn finish(&mut self, done: Pending) {
        if done.module.uses_jsx() {
            self.uses_jsx = true;
            self.first_jsx.get_or_insert_with(|| done.path.to_string());
        }
        let body = done.module.source.render_body(&done.ids);
        self.finished.push((done, body));
    }

    fn link(self, entry: VfsPath) -> Bundle {
        let mut out = Emitter::default();

        for (i, module) in self.externals.iter().enumerate() {
            out.line(&format!("import * as __ext_{i} from {};", quote_js(&module.url)));
        }
        out.line(RUNTIME);

        if self.uses_jsx
            && let Some(i) = self
                .externals
                .iter()
                .position(|m| m.name == ExternalModules::FRAMEWORK)
        {
            out.line(&format!("const __framework = __ext_{i}.default ?? __ext_{i};"));
            out.line(&format!("const {FACTORY} = __framework.createElement;"));
            out.line(&format!("const {FRAGMENT} = __framework.Fragment;"));
        }
        for (i, module) in self.externals.iter().enumerate() {
            out.line(&format!("__modules.set({}, __ext_{i});", quote_js(&module.name)));
        }
        for style in &self.styles {
            out.line(&format!("__modules.set({}, {{}});", quote_js(style.path.as_str())));
        }

        let mut modules = Vec::with_capacity(self.finished.len());
        let mut has_default_export = false;
        for (pending, body) in self.finished {
            let id = quote_js(pending.path.as_str());
            let exports = pending.module.source.render_exports(&pending.ids);
            out.line(&format!(
                "__define({id}, function (__exports) {{ __export(__exports, {exports});"
            ));
            let bundle_line = out.next_line;
            out.line(&body);
            out.line("});");
            if pending.path == entry {
                has_default_export = pending.module.has_default_export();
            }
            modules.push(ResolvedModule {
                specifier: pending.specifier,
                identity: ModuleIdentity::Local(pending.path),
                code: body,
                dependencies: pending.module.specifiers().to_vec(),
                bundle_line,
            });
        }

        out.line(&format!("const __entry = {REQUIRE}({});", quote_js(entry.as_str())));
        out.line("export default __entry.default;");

        Bundle {
            entry,
            modules,
            externals: self.externals,
            styles: self.styles,
            has_default_export,
            code: out.code,
        }
    }
}

/// Bundle text with a running line counter.
struct Emitter {
    code: String,
    /// 1-based number of the line the next `line` call starts on
    next_line: usize,
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            code: String::new(),
            next_line: 1,
        }
    }
}

impl Emitter {
    fn line(&mut self, text: &str) {
        self.code.push_str(text);
        self.code.push('\n');
        self.next_line += text.matches('\n').count() + 1;
    }
}

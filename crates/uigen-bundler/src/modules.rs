//! ES module syntax to registry calls.
//!
//! Import declarations are hoisted to the first line as one
//! `const __imp_N = __require(id)` per imported module, and every use of an
//! imported name reads through that namespace (see [`crate::scope`]).
//! Exports become getters registered on the module's exports object, and
//! `import("x")` becomes a promise of the required module. Specifiers are
//! kept symbolic here ([`Piece::Require`]) and only turned into registry
//! ids when the bundle is linked, so the rewritten module does not depend
//! on the rest of the project and can be cached by content.

use crate::jsx::quote_js;
use crate::lexer::{LexResult, SyntaxError, TokenKind, Tokens, newlines, tokenize};
use crate::scope::{Edit, ImportedBinding, NAMESPACE_PREFIX, live_references};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::ops::Range;

/// Registry lookup function in compiled output.
pub(crate) const REQUIRE: &str = "__require";

/// Local that holds an anonymous default export.
const DEFAULT_LOCAL: &str = "__default";

/// A fragment of rewritten module code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Piece {
    Code(String),
    /// `__require(<id of specifiers[n]>)`
    Require(usize),
}

/// Where an exported binding comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExportSource {
    /// Expression evaluated in the module's own scope
    Local(String),
    /// Re-export of `name` (or the whole namespace) from another module
    Reexport { specifier: usize, name: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Export {
    pub name: String,
    pub source: ExportSource,
}

/// A module with imports and exports rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ModuleSource {
    pub pieces: Vec<Piece>,
    /// Unique specifiers: static imports first, then the rest in order of
    /// appearance
    pub specifiers: Vec<String>,
    pub exports: Vec<Export>,
}

impl ModuleSource {
    /// Module whose only export is `default`, bound to `expression`.
    pub fn from_default(code: String, expression: &str) -> Self {
        Self {
            pieces: vec![Piece::Code(code)],
            specifiers: Vec::new(),
            exports: vec![Export {
                name: "default".to_string(),
                source: ExportSource::Local(expression.to_string()),
            }],
        }
    }

    pub fn has_default_export(&self) -> bool {
        self.exports.iter().any(|e| e.name == "default")
    }

    /// Module body with specifier `n` replaced by `ids[n]`.
    pub fn render_body(&self, ids: &[String]) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Code(code) => out.push_str(code),
                Piece::Require(n) => out.push_str(&require(ids, *n)),
            }
        }
        out
    }

    /// Object literal of export getters, e.g. `{ "default": () => App }`.
    pub fn render_exports(&self, ids: &[String]) -> String {
        let entries: Vec<String> = self
            .exports
            .iter()
            .map(|export| {
                let value = match &export.source {
                    ExportSource::Local(expression) => expression.clone(),
                    ExportSource::Reexport {
                        specifier,
                        name: Some(name),
                    } => format!("{}[{}]", require(ids, *specifier), quote_js(name)),
                    ExportSource::Reexport {
                        specifier,
                        name: None,
                    } => require(ids, *specifier),
                };
                format!("{}: () => {value}", quote_js(&export.name))
            })
            .collect();
        format!("{{ {} }}", entries.join(", "))
    }
}

fn require(ids: &[String], n: usize) -> String {
    let id = ids.get(n).map_or("", String::as_str);
    format!("{REQUIRE}({})", quote_js(id))
}

/// Rewrites the import and export syntax of `src`.
pub(crate) fn rewrite(src: &str) -> LexResult<ModuleSource> {
    let mut rewriter = Rewriter {
        tokens: Tokens::new(src, tokenize(src)?),
        cursor: 0,
        module: ModuleSource::default(),
        imports: Vec::new(),
        bound: HashMap::new(),
        edits: Vec::new(),
        next_edit: 0,
    };
    rewriter.scan_imports()?;
    let skip: Vec<Range<usize>> = rewriter.imports.iter().map(|d| d.tokens.clone()).collect();
    rewriter.edits = live_references(&rewriter.tokens, &rewriter.bound, &skip);
    rewriter.emit_imports();
    rewriter.run()?;
    rewriter.copy_to(src.len());
    Ok(rewriter.module)
}

struct Rewriter<'a> {
    tokens: Tokens<'a>,
    /// Byte offset up to which the source has been emitted
    cursor: usize,
    module: ModuleSource,
    imports: Vec<ImportDeclaration>,
    /// Imported local names
    bound: HashMap<String, ImportedBinding>,
    /// Live reads of imported names, by position
    edits: Vec<Edit>,
    next_edit: usize,
}

/// Parsed `import` clause bindings.
#[derive(Debug, Default)]
struct Bindings {
    default: Option<String>,
    namespace: Option<String>,
    named: Vec<(String, String)>,
}

impl Bindings {
    const fn is_empty(&self) -> bool {
        self.default.is_none() && self.namespace.is_none() && self.named.is_empty()
    }
}

/// A top-level `import` declaration.
#[derive(Debug)]
struct ImportDeclaration {
    /// Token range of the declaration, trailing `;` included
    tokens: Range<usize>,
    specifier: usize,
    bindings: Bindings,
}

impl Rewriter<'_> {
    fn error(&self, i: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(message, self.tokens.start(i))
    }

    fn code(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Piece::Code(last)) = self.module.pieces.last_mut() {
            last.push_str(text);
        } else {
            self.module.pieces.push(Piece::Code(text.to_string()));
        }
    }

    fn require(&mut self, specifier: usize) {
        self.module.pieces.push(Piece::Require(specifier));
    }

    /// Emits source from the cursor up to `end`, with live reads spliced in.
    /// Edits behind the cursor belong to replaced text and are dropped.
    fn copy_to(&mut self, end: usize) {
        let src = self.tokens.src;
        let mut at = self.cursor;
        while let Some((range, text)) = self.edits.get(self.next_edit).cloned() {
            if range.start >= end {
                break;
            }
            self.next_edit += 1;
            if range.start < at {
                continue;
            }
            self.code(&src[at..range.start]);
            self.code(&text);
            at = range.end;
        }
        self.code(&src[at..end]);
        self.cursor = end;
    }

    /// Emits source up to `start`, then lets `emit` write the replacement for
    /// `start..end`, then pads with the newlines the replaced text had.
    fn replace(&mut self, start: usize, end: usize, emit: impl FnOnce(&mut Self)) {
        let src = self.tokens.src;
        self.copy_to(start);
        emit(self);
        self.code(&"\n".repeat(newlines(&src[start..end])));
        self.cursor = end;
    }

    fn specifier(&mut self, i: usize) -> LexResult<usize> {
        if self.tokens.kind(i) != Some(TokenKind::String) {
            return Err(self.error(i, "Expected a module specifier string"));
        }
        let value = unquote(self.tokens.text(i));
        let index = match self.module.specifiers.iter().position(|s| *s == value) {
            Some(index) => index,
            None => {
                self.module.specifiers.push(value);
                self.module.specifiers.len() - 1
            }
        };
        Ok(index)
    }

    fn export(&mut self, name: impl Into<String>, source: ExportSource) {
        self.module.exports.push(Export {
            name: name.into(),
            source,
        });
    }

    /// Index past an optional `;` at `i`.
    fn after_semicolon(&self, i: usize) -> usize {
        if self.tokens.is_punct(i, ";") { i + 1 } else { i }
    }

    fn is_static_import(&self, i: usize) -> bool {
        let t = &self.tokens;
        t.is_word(i, "import")
            && !t.is_member(i)
            && !t.is_punct(i + 1, "(")
            && !t.is_punct(i + 1, ".")
    }

    /// Collects the top-level import declarations and the local names
    /// they bind.
    fn scan_imports(&mut self) -> LexResult<()> {
        let mut depth = 0usize;
        let mut i = 0;
        while i < self.tokens.sig.len() {
            if self.tokens.kind(i) == Some(TokenKind::Punct) {
                match self.tokens.text(i) {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    _ => {}
                }
            } else if depth == 0 && self.is_static_import(i) {
                let declaration = self.import_declaration(i)?;
                i = declaration.tokens.end;
                self.imports.push(declaration);
                continue;
            }
            i += 1;
        }

        for declaration in &self.imports {
            let specifier = declaration.specifier;
            let bindings = &declaration.bindings;
            let mut bind = |local: &str, export: Option<String>| {
                let binding = ImportedBinding { specifier, export };
                self.bound.insert(local.to_string(), binding);
            };
            if let Some(local) = &bindings.default {
                bind(local, Some("default".to_string()));
            }
            if let Some(local) = &bindings.namespace {
                bind(local, None);
            }
            for (imported, local) in &bindings.named {
                bind(local, Some(unquote(imported)));
            }
        }
        Ok(())
    }

    /// Hoists the imports to the start of the module: one namespace local
    /// per imported module, in declaration order, all on the first line.
    fn emit_imports(&mut self) {
        let plan: Vec<(usize, bool)> = self
            .imports
            .iter()
            .map(|d| (d.specifier, !d.bindings.is_empty()))
            .collect();
        let mut declared = HashSet::new();
        let mut first = true;
        for (specifier, binds) in plan {
            if binds && !declared.insert(specifier) {
                continue;
            }
            if !first {
                self.code(" ");
            }
            first = false;
            if binds {
                self.code(&format!("const {NAMESPACE_PREFIX}{specifier} = "));
            }
            self.require(specifier);
            self.code(";");
        }
    }

    fn run(&mut self) -> LexResult<()> {
        let mut depth = 0usize;
        let mut i = 0;
        while i < self.tokens.sig.len() {
            let member = self.tokens.is_member(i);
            if self.tokens.kind(i) == Some(TokenKind::Punct) {
                match self.tokens.text(i) {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => depth = depth.saturating_sub(1),
                    _ => {}
                }
            } else if self.tokens.is_word(i, "import") && !member {
                if self.tokens.is_punct(i + 1, "(") {
                    i = self.dynamic_import(i)?;
                    continue;
                }
                let hoisted = self
                    .imports
                    .iter()
                    .find(|d| d.tokens.start == i)
                    .map(|d| d.tokens.clone());
                if let Some(range) = hoisted {
                    let start = self.tokens.start(range.start);
                    let end = self.tokens.end(range.end - 1);
                    self.replace(start, end, |_| {});
                    i = range.end;
                    continue;
                }
            } else if self.tokens.is_word(i, "export") && !member {
                if depth > 0 {
                    return Err(self.error(i, "'export' may only appear at the top level"));
                }
                i = self.export_declaration(i)?;
                continue;
            }
            i += 1;
        }
        Ok(())
    }

    /// `import("./x")` becomes a promise of the required module.
    fn dynamic_import(&mut self, i: usize) -> LexResult<usize> {
        let specifier = self.specifier(i + 2).map_err(|_| {
            self.error(i, "Dynamic import() requires a string literal specifier")
        })?;
        let mut close = i + 3;
        if self.tokens.is_punct(close, ",") {
            close += 1;
        }
        if !self.tokens.is_punct(close, ")") {
            return Err(self.error(i, "Dynamic import() takes a single specifier"));
        }
        let (start, end) = (self.tokens.start(i), self.tokens.end(close));
        self.replace(start, end, |r| {
            r.code("Promise.resolve().then(() => ");
            r.require(specifier);
            r.code(")");
        });
        Ok(close + 1)
    }

    fn import_declaration(&mut self, i: usize) -> LexResult<ImportDeclaration> {
        let mut j = i + 1;
        let mut bindings = Bindings::default();
        if self.tokens.kind(j) == Some(TokenKind::String) {
            let specifier = self.specifier(j)?;
            return Ok(ImportDeclaration {
                tokens: i..self.after_semicolon(j + 1),
                specifier,
                bindings,
            });
        }

        let from_clause =
            self.tokens.is_word(j, "from") && self.tokens.kind(j + 1) == Some(TokenKind::String);
        if self.tokens.is_name(j) && !from_clause {
            bindings.default = Some(self.tokens.text(j).to_string());
            j += 1;
            if self.tokens.is_punct(j, ",") {
                j += 1;
            }
        }
        if self.tokens.is_punct(j, "*") {
            if !self.tokens.is_word(j + 1, "as") || !self.tokens.is_name(j + 2) {
                return Err(self.error(j, "Expected 'as' and a name after 'import *'"));
            }
            bindings.namespace = Some(self.tokens.text(j + 2).to_string());
            j += 3;
        } else if self.tokens.is_punct(j, "{") {
            j = self.named_list(j, &mut bindings.named)?;
        }
        if !self.tokens.is_word(j, "from") {
            return Err(self.error(i, "Malformed import declaration: expected 'from'"));
        }
        let specifier = self.specifier(j + 1)?;
        Ok(ImportDeclaration {
            tokens: i..self.after_semicolon(j + 2),
            specifier,
            bindings,
        })
    }

    /// Parses `{ a, b as c }` starting at the brace. Returns the index past
    /// the closing brace.
    fn named_list(&self, open: usize, out: &mut Vec<(String, String)>) -> LexResult<usize> {
        let t = &self.tokens;
        let mut j = open + 1;
        loop {
            if t.is_punct(j, "}") {
                return Ok(j + 1);
            }
            let name_ok = matches!(t.kind(j), Some(TokenKind::Ident | TokenKind::String));
            if !name_ok {
                return Err(self.error(j, "Expected a name in import/export list"));
            }
            let imported = t.text(j).to_string();
            let mut local = imported.clone();
            j += 1;
            if t.is_word(j, "as") {
                if !matches!(t.kind(j + 1), Some(TokenKind::Ident | TokenKind::String)) {
                    return Err(self.error(j, "Expected a name after 'as'"));
                }
                local = t.text(j + 1).to_string();
                j += 2;
            }
            out.push((imported, local));
            if t.is_punct(j, ",") {
                j += 1;
            } else if !t.is_punct(j, "}") {
                return Err(self.error(j, "Expected ',' or '}' in import/export list"));
            }
        }
    }

    /// Export source for a name listed in `export { ... }`. Imported names
    /// are re-exported from their module so the getter never depends on
    /// this module's namespace locals.
    fn listed_export(&self, local: String) -> ExportSource {
        match self.bound.get(&local) {
            Some(binding) => ExportSource::Reexport {
                specifier: binding.specifier,
                name: binding.export.clone(),
            },
            None => ExportSource::Local(local),
        }
    }

    fn export_declaration(&mut self, i: usize) -> LexResult<usize> {
        let k = i + 1;
        if self.tokens.is_word(k, "default") {
            return Ok(self.export_default(i));
        }
        if self.tokens.is_punct(k, "{") {
            let mut names = Vec::new();
            let j = self.named_list(k, &mut names)?;
            if self.tokens.is_word(j, "from") {
                let specifier = self.specifier(j + 1)?;
                let next = self.after_semicolon(j + 2);
                for (local, exported) in names {
                    self.export(
                        unquote(&exported),
                        ExportSource::Reexport {
                            specifier,
                            name: Some(unquote(&local)),
                        },
                    );
                }
                let (start, end) = (self.tokens.start(i), self.tokens.end(next - 1));
                self.replace(start, end, |r| {
                    r.require(specifier);
                    r.code(";");
                });
                return Ok(next);
            }
            for (local, exported) in names {
                let source = self.listed_export(local);
                self.export(unquote(&exported), source);
            }
            let next = self.after_semicolon(j);
            let (start, end) = (self.tokens.start(i), self.tokens.end(next - 1));
            self.replace(start, end, |_| {});
            return Ok(next);
        }
        if self.tokens.is_punct(k, "*") {
            let (namespace, from) = if self.tokens.is_word(k + 1, "as") {
                (Some(self.tokens.text(k + 2).to_string()), k + 3)
            } else {
                (None, k + 1)
            };
            if !self.tokens.is_word(from, "from") {
                return Err(self.error(i, "Malformed export declaration: expected 'from'"));
            }
            let specifier = self.specifier(from + 1)?;
            let next = self.after_semicolon(from + 2);
            let (start, end) = (self.tokens.start(i), self.tokens.end(next - 1));
            match namespace {
                Some(name) => {
                    self.export(unquote(&name), ExportSource::Reexport { specifier, name: None });
                    self.replace(start, end, |r| {
                        r.require(specifier);
                        r.code(";");
                    });
                }
                None => self.replace(start, end, |r| {
                    r.code("__exportStar(__exports, ");
                    r.require(specifier);
                    r.code(");");
                }),
            }
            return Ok(next);
        }

        let declares = ["const", "let", "var"]
            .iter()
            .any(|w| self.tokens.is_word(k, w));
        let names: Vec<String> = if declares {
            self.tokens
                .declarators(k + 1)
                .into_iter()
                .map(|n| self.tokens.text(n).to_string())
                .collect()
        } else {
            let mut j = k;
            if self.tokens.is_word(j, "async") {
                j += 1;
            }
            if !self.tokens.is_word(j, "function") && !self.tokens.is_word(j, "class") {
                let found = self.tokens.text(k);
                return Err(self.error(k, format!("Unexpected token '{found}' after export")));
            }
            j += 1;
            if self.tokens.is_punct(j, "*") {
                j += 1;
            }
            if !self.tokens.is_name(j) {
                return Err(self.error(j, "Exported declarations must be named"));
            }
            vec![self.tokens.text(j).to_string()]
        };
        for name in names {
            self.export(name.clone(), ExportSource::Local(name));
        }
        let (start, end) = (self.tokens.start(i), self.tokens.start(k));
        self.replace(start, end, |_| {});
        Ok(k)
    }

    fn export_default(&mut self, i: usize) -> usize {
        let t = &self.tokens;
        let mut k = i + 2;
        if t.is_word(k, "async") && t.is_word(k + 1, "function") {
            k += 1;
        }
        let declaration = t.is_word(k, "function") || t.is_word(k, "class");
        let mut name_at = k + 1;
        if t.is_punct(name_at, "*") {
            name_at += 1;
        }
        let named = declaration && t.is_name(name_at) && !t.is_word(name_at, "extends");

        let (start, end) = (t.start(i), t.start(i + 2));
        if named {
            let name = t.text(name_at).to_string();
            self.export("default", ExportSource::Local(name));
            self.replace(start, end, |_| {});
        } else {
            self.export("default", ExportSource::Local(DEFAULT_LOCAL.to_string()));
            self.replace(start, end, |r| r.code(&format!("const {DEFAULT_LOCAL} = ")));
        }
        i + 2
    }
}

/// Value of a string literal token (without escape processing beyond
/// dropping backslashes).
fn unquote(literal: &str) -> String {
    let inner = literal
        .strip_prefix(['"', '\''])
        .and_then(|s| s.strip_suffix(['"', '\'']))
        .unwrap_or(literal);
    let mut out = String::with_capacity(inner.len());
    let mut escaped = false;
    for c in inner.chars() {
        if escaped || c != '\\' {
            out.push(c);
            escaped = false;
        } else {
            escaped = true;
        }
    }
    out
}

/// Summary line of a module's exports for logs.
pub(crate) fn describe_exports(module: &ModuleSource) -> String {
    let mut out = String::new();
    for (i, export) in module.exports.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{}", export.name);
    }
    out
}

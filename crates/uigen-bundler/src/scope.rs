//! Live reads of imported bindings.
//!
//! Imports are not copied into locals when a module starts. Each use of an
//! imported name reads through the exporter's namespace object instead, so
//! `helper()` becomes `(0, __imp_0.helper)()`. A module on the back edge of
//! an import cycle therefore sees the exporter's `const` bindings once they
//! are initialized, the same as native ES modules.
//!
//! Parameters and nested declarations that reuse an imported name hide it
//! until the end of their brace scope or arrow body.

use crate::jsx::quote_js;
use crate::lexer::{
    TokenKind, Tokens, is_ident_continue, is_ident_start, template_substitutions, tokenize_range,
};
use std::collections::{HashMap, HashSet};
use std::ops::Range;

/// Prefix of the local that holds an imported module's namespace.
pub(crate) const NAMESPACE_PREFIX: &str = "__imp_";

/// A source replacement: byte range and new text.
pub(crate) type Edit = (Range<usize>, String);

/// What an imported local name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportedBinding {
    /// Index of the module specifier
    pub specifier: usize,
    /// Export read from the module; `None` for `import * as ns`
    pub export: Option<String>,
}

impl ImportedBinding {
    pub fn namespace(&self) -> String {
        format!("{NAMESPACE_PREFIX}{}", self.specifier)
    }

    /// Expression that reads the binding's current value.
    pub fn access(&self) -> String {
        let namespace = self.namespace();
        match &self.export {
            None => namespace,
            Some(name) if is_identifier(name) => format!("{namespace}.{name}"),
            Some(name) => format!("{namespace}[{}]", quote_js(name)),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_ident_start) && chars.all(is_ident_continue)
}

/// Keywords that start a statement when they open a line.
const STATEMENT_KEYWORDS: &[&str] = &[
    "const", "let", "var", "function", "class", "return", "if", "for", "while", "switch", "try",
    "throw", "export", "import",
];

/// Edits that turn every use of an imported name into a live read.
///
/// Tokens in `skip` (the import declarations themselves) are left alone.
/// The result is sorted by position.
pub(crate) fn live_references(
    tokens: &Tokens<'_>,
    imports: &HashMap<String, ImportedBinding>,
    skip: &[Range<usize>],
) -> Vec<Edit> {
    if imports.is_empty() {
        return Vec::new();
    }
    let mut references = References::new(tokens, imports);
    references.walk(skip);
    let mut edits = references.edits;
    edits.sort_by_key(|(range, _)| range.start);
    edits
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Block,
    Object,
    Class,
    Paren,
    Bracket,
    /// Expression body of an arrow function
    Arrow,
}

#[derive(Debug)]
struct Frame {
    scope: Scope,
    /// Imported names hidden by local declarations
    hidden: Vec<String>,
}

impl Frame {
    const fn new(scope: Scope, hidden: Vec<String>) -> Self {
        Self { scope, hidden }
    }
}

struct References<'t, 'a> {
    tokens: &'t Tokens<'a>,
    imports: &'t HashMap<String, ImportedBinding>,
    frames: Vec<Frame>,
    /// Names bound by a parameter list or loop head, waiting for the body
    /// that starts at the given token
    pending: Option<(usize, Vec<String>)>,
    /// Frame depth at which a `class` keyword waits for its body
    class_at: Option<usize>,
    /// Tokens that declare a name rather than use it
    declarations: HashSet<usize>,
    edits: Vec<Edit>,
}

impl<'t, 'a> References<'t, 'a> {
    fn new(tokens: &'t Tokens<'a>, imports: &'t HashMap<String, ImportedBinding>) -> Self {
        Self {
            tokens,
            imports,
            frames: Vec::new(),
            pending: None,
            class_at: None,
            declarations: HashSet::new(),
            edits: Vec::new(),
        }
    }

    fn walk(&mut self, skip: &[Range<usize>]) {
        let mut i = 0;
        while i < self.tokens.sig.len() {
            if let Some(range) = skip.iter().find(|r| r.start == i) {
                i = range.end;
                continue;
            }
            self.visit(i);
            i += 1;
        }
    }

    fn visit(&mut self, i: usize) {
        let t = self.tokens;
        if t.line_break_before(i) && STATEMENT_KEYWORDS.iter().any(|w| t.is_word(i, w)) {
            self.close_arrows();
        }
        match t.kind(i) {
            Some(TokenKind::Punct) => self.punct(i),
            Some(TokenKind::Ident) => self.word(i),
            Some(TokenKind::Template) => self.template(i),
            _ => {}
        }
    }

    fn scope(&self) -> Option<Scope> {
        self.frames.last().map(|f| f.scope)
    }

    fn is_hidden(&self, name: &str) -> bool {
        self.frames.iter().any(|f| f.hidden.iter().any(|h| h == name))
    }

    /// Records declaring tokens and returns the imported names among them.
    fn bind(&mut self, indices: Vec<usize>) -> Vec<String> {
        let mut names = Vec::new();
        for i in indices {
            self.declarations.insert(i);
            let text = self.tokens.text(i);
            if self.imports.contains_key(text) {
                names.push(text.to_string());
            }
        }
        names
    }

    fn hide(&mut self, names: Vec<String>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.hidden.extend(names);
        }
    }

    fn take_pending(&mut self, at: usize) -> Vec<String> {
        match self.pending.take() {
            Some((expected, names)) if expected == at => names,
            _ => Vec::new(),
        }
    }

    fn close_arrows(&mut self) {
        while self.scope() == Some(Scope::Arrow) {
            self.frames.pop();
        }
    }

    fn punct(&mut self, i: usize) {
        let t = self.tokens;
        match t.text(i) {
            "{" => {
                let scope = if self.class_at == Some(self.frames.len()) {
                    self.class_at = None;
                    Scope::Class
                } else if self.opens_object(i) {
                    Scope::Object
                } else {
                    Scope::Block
                };
                let hidden = self.take_pending(i);
                self.frames.push(Frame::new(scope, hidden));
            }
            "(" => {
                let hidden = if self.is_parameter_list(i) {
                    let names = t.pattern_names(i, t.closing(i));
                    self.bind(names)
                } else {
                    Vec::new()
                };
                self.pending = None;
                self.frames.push(Frame::new(Scope::Paren, hidden));
            }
            "[" => {
                self.pending = None;
                self.frames.push(Frame::new(Scope::Bracket, Vec::new()));
            }
            ")" | "]" | "}" => {
                self.close_arrows();
                if let Some(frame) = self.frames.pop()
                    && frame.scope == Scope::Paren
                    && !frame.hidden.is_empty()
                {
                    self.pending = Some((i + 1, frame.hidden));
                }
            }
            "," | ";" => self.close_arrows(),
            "=>" => {
                let names = self.take_pending(i);
                if t.is_punct(i + 1, "{") {
                    self.pending = Some((i + 1, names));
                } else {
                    self.frames.push(Frame::new(Scope::Arrow, names));
                }
            }
            _ => {}
        }
    }

    fn word(&mut self, i: usize) {
        let t = self.tokens;
        let text = t.text(i);
        if t.is_member(i) {
            return;
        }
        match text {
            "const" | "let" | "var" => {
                let names = t.declarators(i + 1);
                let names = self.bind(names);
                self.hide(names);
                return;
            }
            "function" | "class" => {
                if text == "class" {
                    self.class_at = Some(self.frames.len());
                }
                let mut j = i + 1;
                if t.is_punct(j, "*") {
                    j += 1;
                }
                if t.is_name(j) && !t.is_word(j, "extends") {
                    let names = self.bind(vec![j]);
                    if self.declaration_position(i) {
                        self.hide(names);
                    }
                }
                return;
            }
            _ => {}
        }

        if self.declarations.contains(&i) || self.is_hidden(text) {
            return;
        }
        let Some(binding) = self.imports.get(text) else {
            return;
        };
        if t.is_punct(i + 1, "=>") {
            self.declarations.insert(i);
            self.pending = Some((i + 1, vec![text.to_string()]));
            return;
        }
        if self.is_property_key(i) {
            return;
        }

        let access = binding.access();
        let called = t.is_punct(i + 1, "(") || t.kind(i + 1) == Some(TokenKind::Template);
        let replacement = if self.is_shorthand(i) {
            format!("{text}: {access}")
        } else if binding.export.is_some() && called && !(i > 0 && t.is_word(i - 1, "new")) {
            format!("(0, {access})")
        } else {
            access
        };
        self.edits.push((t.span(i), replacement));
    }

    /// Rewrites the `${ ... }` expressions of a template literal.
    fn template(&mut self, i: usize) {
        let t = self.tokens;
        for range in template_substitutions(t.src, t.span(i)) {
            let Ok(inner) = tokenize_range(t.src, range) else {
                continue;
            };
            let inner = Tokens::new(t.src, inner);
            let hidden = self.frames.iter().flat_map(|f| f.hidden.iter().cloned()).collect();
            let mut nested = References::new(&inner, self.imports);
            nested.frames.push(Frame::new(Scope::Paren, hidden));
            nested.walk(&[]);
            self.edits.extend(nested.edits);
        }
    }

    fn opens_object(&self, i: usize) -> bool {
        let t = self.tokens;
        if i == 0 {
            return false;
        }
        match t.kind(i - 1) {
            Some(TokenKind::Punct) => match t.text(i - 1) {
                ")" | "]" | "}" | "=>" | ";" => false,
                ":" => !matches!(self.scope(), Some(Scope::Block | Scope::Class) | None),
                _ => true,
            },
            Some(TokenKind::Ident) => matches!(
                t.text(i - 1),
                "return" | "typeof" | "yield" | "await" | "in" | "of" | "void" | "throw"
            ),
            _ => false,
        }
    }

    fn is_parameter_list(&self, open: usize) -> bool {
        let t = self.tokens;
        let close = t.closing(open);
        if t.is_punct(close + 1, "=>") {
            return true;
        }
        if open == 0 {
            return false;
        }
        if t.is_word(open - 1, "catch") {
            return true;
        }
        let mut j = open - 1;
        if t.is_name(j) && j > 0 {
            j -= 1;
        }
        if t.is_punct(j, "*") && j > 0 {
            j -= 1;
        }
        if t.is_word(j, "function") {
            return true;
        }
        matches!(self.scope(), Some(Scope::Object | Scope::Class)) && t.is_punct(close + 1, "{")
    }

    /// Returns `true` if a `function` or `class` keyword at `i` starts a
    /// declaration rather than an expression.
    fn declaration_position(&self, i: usize) -> bool {
        let t = self.tokens;
        let mut prev = i;
        if prev > 0 && t.is_word(prev - 1, "async") {
            prev -= 1;
        }
        prev == 0
            || ["{", "}", ";"].iter().any(|p| t.is_punct(prev - 1, p))
            || t.is_word(prev - 1, "export")
            || t.is_word(prev - 1, "default")
    }

    fn is_property_key(&self, i: usize) -> bool {
        let t = self.tokens;
        if i == 0 {
            return false;
        }
        let prev = i - 1;
        let after_separator = t.is_punct(prev, "{") || t.is_punct(prev, ",");
        let modifier = ["get", "set", "async", "static"].iter().any(|w| t.is_word(prev, w))
            || t.is_punct(prev, "*");
        match self.scope() {
            Some(Scope::Object) => {
                (after_separator || modifier)
                    && (t.is_punct(i + 1, ":") || t.is_punct(i + 1, "("))
            }
            Some(Scope::Class) => {
                let value_before = matches!(
                    t.kind(prev),
                    Some(TokenKind::Ident | TokenKind::Number | TokenKind::String)
                ) || [")", "]", "}"].iter().any(|p| t.is_punct(prev, p));
                ["{", "}", ";"].iter().any(|p| t.is_punct(prev, p))
                    || modifier
                    || (t.line_break_before(i) && value_before)
            }
            Some(Scope::Block) => {
                (after_separator || t.is_punct(prev, ";") || t.is_punct(prev, "}"))
                    && t.is_punct(i + 1, ":")
            }
            _ => false,
        }
    }

    fn is_shorthand(&self, i: usize) -> bool {
        let t = self.tokens;
        self.scope() == Some(Scope::Object)
            && i > 0
            && (t.is_punct(i - 1, "{") || t.is_punct(i - 1, ","))
            && (t.is_punct(i + 1, ",") || t.is_punct(i + 1, "}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    /// Applies the edits for imports of `names` from specifier 0.
    fn live(src: &str, names: &[(&str, Option<&str>)]) -> String {
        let tokens = Tokens::new(src, tokenize(src).unwrap());
        let imports: HashMap<String, ImportedBinding> = names
            .iter()
            .map(|(local, export)| {
                (
                    (*local).to_string(),
                    ImportedBinding {
                        specifier: 0,
                        export: export.map(str::to_string),
                    },
                )
            })
            .collect();
        let mut out = String::new();
        let mut at = 0;
        for (range, text) in live_references(&tokens, &imports, &[]) {
            out.push_str(&src[at..range.start]);
            out.push_str(&text);
            at = range.end;
        }
        out.push_str(&src[at..]);
        out
    }

    #[test]
    fn test_reads_and_calls() {
        assert_eq!(
            live(
                "const x = name + helper(1);",
                &[("name", Some("name")), ("helper", Some("helper"))],
            ),
            "const x = __imp_0.name + (0, __imp_0.helper)(1);"
        );
        assert_eq!(live("new Widget()", &[("Widget", Some("default"))]), "new __imp_0.default()");
        assert_eq!(live("Icons.Star", &[("Icons", None)]), "__imp_0.Star");
    }

    #[test]
    fn test_property_names_untouched() {
        let src = "obj.name; const o = { name: 1, name() {} }; class K { name = 2; get name() {} }";
        assert_eq!(live(src, &[("name", Some("name"))]), src);
    }

    #[test]
    fn test_shorthand_property_expanded() {
        assert_eq!(
            live("const o = { name, other };", &[("name", Some("name"))]),
            "const o = { name: __imp_0.name, other };"
        );
    }

    #[test]
    fn test_parameters_hide_imports() {
        let src = "function f(name) { return name; }\nconst g = ({ user }) => user.id;\nitems.map(user => user);\nuse(user, name);";
        assert_eq!(
            live(src, &[("name", Some("name")), ("user", Some("user"))]),
            "function f(name) { return name; }\nconst g = ({ user }) => user.id;\nitems.map(user => user);\nuse(__imp_0.user, __imp_0.name);"
        );
    }

    #[test]
    fn test_nested_declarations_hide_imports() {
        let src = "function f() { const name = 1; return name; }\nfor (const name of list) { log(name); }\nlog(name);";
        assert_eq!(
            live(src, &[("name", Some("name")), ("log", Some("log"))]),
            "function f() { const name = 1; return name; }\nfor (const name of list) { (0, __imp_0.log)(name); }\n(0, __imp_0.log)(__imp_0.name);"
        );
    }

    #[test]
    fn test_template_substitutions() {
        assert_eq!(
            live("const s = `a ${name} ${`b ${name}`}`;", &[("name", Some("name"))]),
            "const s = `a ${__imp_0.name} ${`b ${__imp_0.name}`}`;"
        );
    }

    #[test]
    fn test_quoted_export_names() {
        let binding = ImportedBinding {
            specifier: 2,
            export: Some("kebab-name".to_string()),
        };
        assert_eq!(binding.access(), "__imp_2[\"kebab-name\"]");
    }

    #[test]
    fn test_no_imports_no_edits() {
        let src = "const a = 1;";
        let tokens = Tokens::new(src, tokenize(src).unwrap());
        assert!(live_references(&tokens, &HashMap::new(), &[]).is_empty());
    }
}

//! TypeScript type erasure.
//!
//! Removes type-level syntax so that only plain JavaScript remains:
//! type-only imports and exports, `interface` and `type` declarations,
//! ambient `declare` statements, annotations on bindings, parameters, class
//! fields and return values, `as`/`satisfies` casts, non-null assertions,
//! generic parameter and argument lists, `implements` clauses, and access
//! modifiers. Removed text is replaced by the newlines it contained, so
//! every remaining token stays on its original line.
//!
//! Enums and namespaces generate runtime code and are rejected.

use crate::lexer::{LexResult, SyntaxError, Token, TokenKind, is_reserved, tokenize};
use std::ops::Range;

/// Words that may start or continue a type in operand position.
const TYPE_PREFIXES: &[&str] =
    &["typeof", "keyof", "readonly", "unique", "infer", "new", "asserts"];

/// Keywords after which a `{` opens an object literal or pattern.
const EXPRESSION_WORDS: &[&str] = &[
    "return", "typeof", "case", "yield", "await", "in", "of", "new", "default", "throw", "void",
    "delete", "const", "let", "var", "instanceof",
];

const MODIFIERS: &[&str] = &[
    "public", "private", "protected", "readonly", "override", "declare", "abstract",
];

/// Erases TypeScript syntax from `src`.
pub(crate) fn strip_types(src: &str) -> LexResult<String> {
    let tokens = tokenize(src)?;
    let sig: Vec<Token> = tokens.into_iter().filter(|t| !t.is_trivia()).collect();
    let matching = match_brackets(src, &sig);
    let mut eraser = Eraser {
        src,
        sig,
        matching,
        removed: Vec::new(),
        stack: vec![Level::new(Scope::Block)],
        prev: None,
        class_pending: None,
        clause_depth: None,
    };
    eraser.run()?;
    Ok(eraser.finish())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Block,
    Object,
    Class,
    Paren,
    Bracket,
}

/// Per-bracket parsing state.
#[derive(Debug, Clone, Copy)]
struct Level {
    scope: Scope,
    ternary: usize,
    case: bool,
    declaration: bool,
    binding: bool,
}

impl Level {
    const fn new(scope: Scope) -> Self {
        Self {
            scope,
            ternary: 0,
            case: false,
            declaration: false,
            binding: false,
        }
    }
}

fn match_brackets(src: &str, sig: &[Token]) -> Vec<Option<usize>> {
    let mut matching = vec![None; sig.len()];
    let mut open: Vec<usize> = Vec::new();
    for (i, token) in sig.iter().enumerate() {
        if token.kind != TokenKind::Punct {
            continue;
        }
        match token.text(src) {
            "(" | "[" | "{" => open.push(i),
            ")" | "]" | "}" => {
                if let Some(start) = open.pop() {
                    matching[start] = Some(i);
                    matching[i] = Some(start);
                }
            }
            _ => {}
        }
    }
    matching
}

struct Eraser<'a> {
    src: &'a str,
    sig: Vec<Token>,
    matching: Vec<Option<usize>>,
    removed: Vec<Range<usize>>,
    stack: Vec<Level>,
    /// Last significant token that was kept
    prev: Option<usize>,
    /// Stack depth of a `class` keyword whose body has not opened yet
    class_pending: Option<usize>,
    /// Stack depth of an import/export clause
    clause_depth: Option<usize>,
}

impl Eraser<'_> {
    fn text(&self, i: usize) -> &str {
        self.sig.get(i).map_or("", |t| t.text(self.src))
    }

    fn kind(&self, i: usize) -> Option<TokenKind> {
        self.sig.get(i).map(|t| t.kind)
    }

    fn is_punct(&self, i: usize, text: &str) -> bool {
        self.kind(i) == Some(TokenKind::Punct) && self.text(i) == text
    }

    fn is_word(&self, i: usize, text: &str) -> bool {
        self.kind(i) == Some(TokenKind::Ident) && self.text(i) == text
    }

    fn is_name(&self, i: usize) -> bool {
        self.kind(i) == Some(TokenKind::Ident) && !is_reserved(self.text(i))
    }

    /// Identifier, literal, or closing bracket: something an operator can follow.
    fn is_value(&self, i: Option<usize>) -> bool {
        let Some(i) = i else { return false };
        match self.kind(i) {
            Some(TokenKind::Ident) => !is_reserved(self.text(i)) || self.text(i) == "this",
            Some(
                TokenKind::Number | TokenKind::String | TokenKind::Template | TokenKind::Regex,
            ) => true,
            Some(TokenKind::Punct) => matches!(self.text(i), ")" | "]" | "}"),
            _ => false,
        }
    }

    fn newline_between(&self, a: usize, b: usize) -> bool {
        match (self.sig.get(a), self.sig.get(b)) {
            (Some(a), Some(b)) => self.src[a.span.end..b.span.start].contains('\n'),
            _ => false,
        }
    }

    fn at_statement_start(&self, i: usize) -> bool {
        if i == 0 {
            return true;
        }
        let before = i - 1;
        if self.is_punct(before, ";") || self.is_punct(before, "{") || self.is_punct(before, "}") {
            return true;
        }
        self.newline_between(before, i)
            && (self.is_value(Some(before)) || self.is_punct(before, ")"))
    }

    fn level(&mut self) -> &mut Level {
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn top(&self) -> Level {
        self.stack[self.stack.len() - 1]
    }

    /// Marks sig tokens `from..=to` for removal.
    fn remove(&mut self, from: usize, to: usize) {
        if let (Some(a), Some(b)) = (self.sig.get(from), self.sig.get(to)) {
            self.removed.push(a.span.start..b.span.end);
        }
    }

    fn error(&self, i: usize, message: &str) -> SyntaxError {
        SyntaxError::new(message, self.sig.get(i).map_or(self.src.len(), |t| t.span.start))
    }

    fn run(&mut self) -> LexResult<()> {
        let mut i = 0;
        while i < self.sig.len() {
            i = self.step(i)?;
        }
        Ok(())
    }

    /// Handles token `i` and returns the index of the next token to visit.
    fn step(&mut self, i: usize) -> LexResult<usize> {
        let token_kind = self.sig[i].kind;
        let text = self.text(i).to_string();

        if token_kind == TokenKind::String && self.clause_depth.is_some() {
            self.clause_depth = None;
        }
        if token_kind == TokenKind::Ident {
            if let Some(next) = self.word(i, &text)? {
                return Ok(next);
            }
        } else if token_kind == TokenKind::Punct {
            if let Some(next) = self.punct(i, &text) {
                return Ok(next);
            }
        }
        self.prev = Some(i);
        Ok(i + 1)
    }

    fn punct(&mut self, i: usize, text: &str) -> Option<usize> {
        match text {
            "(" => self.stack.push(Level::new(Scope::Paren)),
            "[" => self.stack.push(Level::new(Scope::Bracket)),
            "{" => {
                let scope = self.brace_scope();
                if self.class_pending == Some(self.stack.len()) {
                    self.class_pending = None;
                }
                self.stack.push(Level::new(scope));
            }
            ")" | "]" | "}" => {
                if self.stack.len() > 1 {
                    self.stack.pop();
                }
                if text == "}"
                    && self.clause_depth == Some(self.stack.len())
                    && !self.is_word(i + 1, "from")
                {
                    self.clause_depth = None;
                }
            }
            ":" => return self.colon(i),
            "?" => {
                if self.is_punct(i + 1, ":")
                    || (self.top().scope == Scope::Paren
                        && (self.is_punct(i + 1, ",") || self.is_punct(i + 1, ")")))
                {
                    self.remove(i, i);
                    return Some(i + 1);
                }
                self.level().ternary += 1;
            }
            "!" => {
                let non_null = self.prev.is_some_and(|p| {
                    (self.is_name(p) || self.is_punct(p, ")") || self.is_punct(p, "]"))
                        && !self.newline_between(p, i)
                });
                if non_null {
                    self.remove(i, i);
                    return Some(i + 1);
                }
            }
            "=" => self.level().binding = false,
            "," => {
                let level = self.level();
                if level.declaration {
                    level.binding = true;
                }
            }
            ";" => {
                let level = self.level();
                level.declaration = false;
                level.binding = false;
                level.case = false;
                self.clause_depth = None;
            }
            "<" => return self.generic_list(i),
            _ => {}
        }
        None
    }

    fn brace_scope(&self) -> Scope {
        if self.class_pending == Some(self.stack.len()) {
            return Scope::Class;
        }
        if self.clause_depth == Some(self.stack.len()) {
            return Scope::Object;
        }
        let Some(prev) = self.prev else {
            return Scope::Block;
        };
        let text = self.text(prev);
        match self.kind(prev) {
            Some(TokenKind::Punct) => match text {
                ")" | ";" | "{" | "}" | "=>" => Scope::Block,
                ":" => {
                    let top = self.top();
                    if top.scope == Scope::Object || top.scope == Scope::Paren || top.ternary > 0 {
                        Scope::Object
                    } else {
                        Scope::Block
                    }
                }
                _ => Scope::Object,
            },
            Some(TokenKind::Ident) if EXPRESSION_WORDS.contains(&text) => Scope::Object,
            _ => Scope::Block,
        }
    }

    fn colon(&mut self, i: usize) -> Option<usize> {
        let top = self.top();
        if top.ternary > 0 {
            self.level().ternary -= 1;
            return None;
        }
        if top.case {
            self.level().case = false;
            return None;
        }
        let prev = self.prev?;
        if self.is_word(prev, "default") {
            return None;
        }

        let annotation = if self.is_punct(prev, ")") {
            Some(true)
        } else {
            match top.scope {
                Scope::Paren | Scope::Class => Some(false),
                Scope::Block
                    if top.binding
                        && (self.is_name(prev)
                            || self.is_punct(prev, "]")
                            || self.is_punct(prev, "}")) =>
                {
                    Some(false)
                }
                _ => None,
            }
        };
        let return_type = annotation?;
        let end = self.skip_type(i + 1, return_type);
        self.remove(i, end - 1);
        Some(end)
    }

    /// Returns the index just past the type starting at `i`.
    fn skip_type(&self, mut i: usize, stop_at_arrow: bool) -> usize {
        let mut operand = true;
        let mut conditional = false;
        while i < self.sig.len() {
            let text = self.text(i);
            let kind = self.kind(i);
            if operand {
                match (kind, text) {
                    (Some(TokenKind::Punct), "(" | "[" | "{") => {
                        i = self.matching[i].map_or(self.sig.len(), |close| close + 1);
                        operand = false;
                    }
                    (Some(TokenKind::Punct), "|" | "&" | "-") => i += 1,
                    (Some(TokenKind::Punct), "<") => match self.angle_group(i) {
                        Some(close) => i = close + 1,
                        None => break,
                    },
                    (Some(TokenKind::Ident), word) if TYPE_PREFIXES.contains(&word) => i += 1,
                    (
                        Some(
                            TokenKind::Ident
                            | TokenKind::Number
                            | TokenKind::String
                            | TokenKind::Template,
                        ),
                        _,
                    ) => {
                        i += 1;
                        operand = false;
                    }
                    _ => break,
                }
            } else {
                match (kind, text) {
                    (Some(TokenKind::Punct), "|" | "&" | ".") => {
                        i += 1;
                        operand = true;
                    }
                    (Some(TokenKind::Punct), "[") => {
                        i = self.matching[i].map_or(self.sig.len(), |close| close + 1);
                    }
                    (Some(TokenKind::Punct), "<") => match self.angle_group(i) {
                        Some(close) => i = close + 1,
                        None => break,
                    },
                    (Some(TokenKind::Punct), "=>") if !stop_at_arrow => {
                        i += 1;
                        operand = true;
                    }
                    (Some(TokenKind::Ident), "is") => {
                        i += 1;
                        operand = true;
                    }
                    (Some(TokenKind::Ident), "extends") => {
                        conditional = true;
                        i += 1;
                        operand = true;
                    }
                    (Some(TokenKind::Punct), "?" | ":") if conditional => {
                        i += 1;
                        operand = true;
                    }
                    _ => break,
                }
            }
        }
        i
    }

    /// Finds the `>` closing a type parameter or argument list at `open`.
    fn angle_group(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        let mut j = open;
        while j < self.sig.len() {
            let text = self.text(j);
            match self.kind(j)? {
                TokenKind::Punct => match text {
                    "<" => depth += 1,
                    ">" => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(j);
                        }
                    }
                    "(" | "[" | "{" => j = self.matching[j]?,
                    "," | "." | "|" | "&" | "?" | ":" | "=" | "=>" | "-" | "..." => {}
                    _ => return None,
                },
                TokenKind::Ident => {
                    if is_reserved(text)
                        && !matches!(text, "extends" | "typeof" | "new" | "in" | "void")
                    {
                        return None;
                    }
                }
                TokenKind::Number | TokenKind::String | TokenKind::Template => {}
                _ => return None,
            }
            j += 1;
        }
        None
    }

    /// `<...>` after a name or in expression position: a type parameter or
    /// argument list when it is followed by a call or a class body.
    fn generic_list(&mut self, i: usize) -> Option<usize> {
        let prev_ok = self.prev.is_none_or(|p| {
            self.is_name(p) || (self.kind(p) == Some(TokenKind::Punct) && !self.is_value(Some(p)))
        });
        if !prev_ok {
            return None;
        }
        let close = self.angle_group(i)?;
        let next = close + 1;
        let follows_class = self.class_pending.is_some()
            && (self.is_punct(next, "{")
                || self.is_word(next, "extends")
                || self.is_word(next, "implements"));
        if self.is_punct(next, "(") || follows_class {
            self.remove(i, close);
            return Some(next);
        }
        None
    }

    fn word(&mut self, i: usize, word: &str) -> LexResult<Option<usize>> {
        let start_idx = if self.prev.is_some_and(|p| p + 1 == i && self.is_word(p, "export")) {
            i - 1
        } else {
            i
        };
        let statement = self.at_statement_start(start_idx);

        match word {
            "let" | "const" | "var" => {
                if word == "const" && self.is_word(i + 1, "enum") {
                    return Err(self.error(i, "TypeScript enums are not supported"));
                }
                let level = self.level();
                level.declaration = true;
                level.binding = true;
            }
            "case" => self.level().case = true,
            "class" => self.class_pending = Some(self.stack.len()),
            "enum" if statement && self.is_name(i + 1) => {
                return Err(self.error(i, "TypeScript enums are not supported"));
            }
            "namespace" | "module"
                if statement
                    && (self.is_name(i + 1) || self.kind(i + 1) == Some(TokenKind::String))
                    && self.is_punct(i + 2, "{") =>
            {
                return Err(self.error(i, "TypeScript namespaces are not supported"));
            }
            "interface" if statement && self.is_name(i + 1) => {
                let end = self.declaration_body_end(i + 1);
                self.remove(start_idx, end);
                return Ok(Some(end + 1));
            }
            "type" if statement && self.is_name(i + 1) && (self.is_punct(i + 2, "=") || self.is_punct(i + 2, "<")) => {
                let mut j = i + 2;
                if self.is_punct(j, "<") {
                    j = self.angle_group(j).map_or(j, |close| close + 1);
                }
                let mut end = self.skip_type(j + 1, false);
                if self.is_punct(end, ";") {
                    end += 1;
                }
                self.remove(start_idx, end - 1);
                return Ok(Some(end));
            }
            "declare" if statement && self.kind(i + 1) == Some(TokenKind::Ident) => {
                let end = self.ambient_end(i + 1);
                self.remove(start_idx, end);
                return Ok(Some(end + 1));
            }
            "abstract" if self.is_word(i + 1, "class") => {
                self.remove(i, i);
                return Ok(Some(i + 1));
            }
            "implements" if self.class_pending.is_some() => {
                let mut j = i + 1;
                while j < self.sig.len() && !self.is_punct(j, "{") {
                    j = if self.is_punct(j, "<") {
                        self.angle_group(j).map_or(j + 1, |close| close + 1)
                    } else {
                        j + 1
                    };
                }
                self.remove(i, j - 1);
                return Ok(Some(j));
            }
            "import" if !self.is_punct(i + 1, "(") && !self.is_punct(i + 1, ".") => {
                if self.is_word(i + 1, "type")
                    && !self.is_word(i + 2, "from")
                    && !self.is_punct(i + 2, ",")
                {
                    let end = self.clause_end(i + 2);
                    self.remove(i, end);
                    return Ok(Some(end + 1));
                }
                self.clause_depth = Some(self.stack.len());
            }
            "export" => {
                if self.is_word(i + 1, "type")
                    && (self.is_punct(i + 2, "{") || self.is_punct(i + 2, "*"))
                {
                    let end = self.clause_end(i + 2);
                    self.remove(i, end);
                    return Ok(Some(end + 1));
                }
                if self.is_punct(i + 1, "{") || self.is_punct(i + 1, "*") {
                    self.clause_depth = Some(self.stack.len());
                }
            }
            "type" if self.clause_depth.is_some_and(|d| d < self.stack.len())
                && self.is_name(i + 1)
                && !self.is_word(i + 1, "as") =>
            {
                let mut end = i + 1;
                if self.is_word(end + 1, "as") {
                    end += 2;
                }
                if self.is_punct(end + 1, ",") {
                    end += 1;
                }
                self.remove(i, end);
                return Ok(Some(end + 1));
            }
            "as" | "satisfies" if self.clause_depth.is_none() && self.is_value(self.prev) => {
                let end = self.skip_type(i + 1, false);
                if end > i + 1 {
                    self.remove(i, end - 1);
                    return Ok(Some(end));
                }
            }
            modifier
                if MODIFIERS.contains(&modifier)
                    && matches!(self.top().scope, Scope::Class | Scope::Paren)
                    && (self.kind(i + 1) == Some(TokenKind::Ident) || self.is_punct(i + 1, "[")) =>
            {
                self.remove(i, i);
                return Ok(Some(i + 1));
            }
            _ => {}
        }
        Ok(None)
    }

    /// Index of the `}` ending an interface body starting its search at `i`.
    fn declaration_body_end(&self, mut i: usize) -> usize {
        while i < self.sig.len() {
            if self.is_punct(i, "{") {
                return self.matching[i].unwrap_or(self.sig.len() - 1);
            }
            if self.is_punct(i, "<") {
                i = self.angle_group(i).unwrap_or(i);
            }
            i += 1;
        }
        self.sig.len() - 1
    }

    /// Last index of an ambient declaration: its `;` or closing brace.
    fn ambient_end(&self, mut i: usize) -> usize {
        while i < self.sig.len() {
            if self.is_punct(i, ";") {
                return i;
            }
            if self.is_punct(i, "{") || self.is_punct(i, "(") || self.is_punct(i, "[") {
                let close = self.matching[i].unwrap_or(self.sig.len() - 1);
                if self.is_punct(i, "{") && !self.is_punct(close + 1, ";") {
                    return close;
                }
                i = close;
            }
            i += 1;
        }
        self.sig.len() - 1
    }

    /// Last index of a type-only import/export clause starting at `i`:
    /// the module string, or the closing brace of a local export list, plus
    /// a trailing `;`.
    fn clause_end(&self, i: usize) -> usize {
        let braced = self.is_punct(i, "{");
        let mut j = if braced { self.matching[i].unwrap_or(i) } else { i };
        if !braced || self.is_word(j + 1, "from") {
            while j + 1 < self.sig.len()
                && self.kind(j) != Some(TokenKind::String)
                && !self.is_punct(j + 1, ";")
            {
                j += 1;
            }
        }
        if self.is_punct(j + 1, ";") {
            j += 1;
        }
        j
    }

    fn finish(mut self) -> String {
        if self.removed.is_empty() {
            return self.src.to_string();
        }
        self.removed.sort_by_key(|r| r.start);
        let mut out = String::with_capacity(self.src.len());
        let mut cursor = 0;
        for range in &self.removed {
            if range.start < cursor {
                if range.end > cursor {
                    out.extend(self.src[cursor..range.end].matches('\n'));
                    cursor = range.end;
                }
                continue;
            }
            out.push_str(&self.src[cursor..range.start]);
            out.extend(self.src[range.clone()].matches('\n'));
            cursor = range.end;
        }
        out.push_str(&self.src[cursor..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(src: &str) -> String {
        strip_types(src).unwrap()
    }

    #[test]
    fn test_parameter_and_return_annotations() {
        assert_eq!(
            strip("function add(a: number, b?: number): number { return a + (b ?? 0); }"),
            "function add(a, b) { return a + (b ?? 0); }"
        );
    }

    #[test]
    fn test_arrow_return_type_stops_at_arrow() {
        assert_eq!(
            strip("const f = (x: string): string[] => [x];"),
            "const f = (x) => [x];"
        );
    }

    #[test]
    fn test_variable_annotations_and_ternaries() {
        assert_eq!(
            strip("let n: number = ok ? 1 : 2, s: string = 'a';"),
            "let n = ok ? 1 : 2, s = 'a';"
        );
    }

    #[test]
    fn test_object_literal_colons_untouched() {
        let src = "const o = { a: 1, b: { c: x ? y : z } };\nswitch (k) { case 1: break; default: f({ d: 2 }); }";
        assert_eq!(strip(src), src);
    }

    #[test]
    fn test_destructured_props_annotation() {
        assert_eq!(
            strip("export default function Card({ title, body }: CardProps) {}"),
            "export default function Card({ title, body }) {}"
        );
    }

    #[test]
    fn test_interfaces_and_type_aliases_removed_keeping_lines() {
        let src = "export interface Props {\n  title: string;\n}\ntype Size = 'sm' | 'lg';\nexport type Fn<T> = (x: T) => void;\nconst a = 1;";
        let out = strip(src);
        assert_eq!(out, "\n\n\n\n\nconst a = 1;");
    }

    #[test]
    fn test_type_only_imports() {
        let src = "import type { Props } from './types';\nimport { useState, type FC } from 'react';";
        assert_eq!(strip(src), "\nimport { useState,  } from 'react';");
    }

    #[test]
    fn test_casts_and_non_null() {
        assert_eq!(
            strip("const el = document.getElementById('root')! as HTMLElement;"),
            "const el = document.getElementById('root') ;"
        );
        assert_eq!(strip("const c = { a: 1 } as const;"), "const c = { a: 1 } ;");
        assert_eq!(strip("if (!ok) x != y;"), "if (!ok) x != y;");
    }

    #[test]
    fn test_call_site_generics() {
        assert_eq!(
            strip("const [items, setItems] = useState<string[]>([]);"),
            "const [items, setItems] = useState([]);"
        );
        assert_eq!(strip("const r = a < b && c > d;"), "const r = a < b && c > d;");
    }

    #[test]
    fn test_generic_declarations() {
        assert_eq!(
            strip("function first<T extends unknown[]>(xs: T) { return xs[0]; }"),
            "function first(xs) { return xs[0]; }"
        );
    }

    #[test]
    fn test_class_members() {
        let src = "class Store<T> implements Base {\n  private items: T[] = [];\n  count?: number;\n  get size(): number { return this.items.length; }\n}";
        assert_eq!(
            strip(src),
            "class Store  {\n   items = [];\n  count;\n  get size() { return this.items.length; }\n}"
        );
    }

    #[test]
    fn test_union_return_type() {
        assert_eq!(
            strip("function f(): string | null {\n  return null;\n}"),
            "function f() {\n  return null;\n}"
        );
    }

    #[test]
    fn test_aliased_imports_are_not_casts() {
        let src = "import { a as b } from './x';\nexport { b as c };\nconst d = e as F;";
        assert_eq!(strip(src), "import { a as b } from './x';\nexport { b as c };\nconst d = e ;");
    }

    #[test]
    fn test_enums_rejected() {
        let err = strip_types("const a = 1;\nenum Color { Red }").unwrap_err();
        assert_eq!(err.message, "TypeScript enums are not supported");
        assert_eq!(err.offset, 13);
    }

    #[test]
    fn test_declare_removed() {
        assert_eq!(strip("declare const VERSION: string;\nrun();"), "\nrun();");
    }
}

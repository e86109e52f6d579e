//! Lossless tokenizer for JavaScript and TypeScript source.
//!
//! Every byte of the input belongs to exactly one token, whitespace and
//! comments included, so later passes can rebuild the text with targeted
//! edits and keep line numbers intact.
//!
//! The lexer decides between a regular expression and a division sign from
//! the previous significant token, which is also what the JSX pass uses to
//! tell an element from a less-than operator.

use std::ops::Range;

/// Token category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Whitespace,
    LineComment,
    BlockComment,
    Ident,
    Number,
    String,
    Template,
    Regex,
    Punct,
}

/// A token with its byte span in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.span.clone()]
    }

    pub const fn is_trivia(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    /// Returns `true` for a punctuator with exactly this text.
    pub fn is_punct(&self, src: &str, text: &str) -> bool {
        self.kind == TokenKind::Punct && self.text(src) == text
    }

    /// Returns `true` for an identifier or keyword with exactly this text.
    pub fn is_word(&self, src: &str, text: &str) -> bool {
        self.kind == TokenKind::Ident && self.text(src) == text
    }
}

/// A syntax problem at a byte offset of the text being processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SyntaxError {
    pub message: String,
    pub offset: usize,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

pub(crate) type LexResult<T> = std::result::Result<T, SyntaxError>;

/// Keywords after which an expression (and so a regex or JSX) may start.
const EXPRESSION_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "case",
    "do",
    "else",
    "yield",
    "await",
    "default",
    "export",
    "extends",
];

/// Reserved words that can never be a value by themselves.
const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "finally", "for", "function", "if", "import", "in",
    "instanceof", "let", "new", "return", "switch", "throw", "try", "typeof", "var", "void",
    "while", "with", "yield", "await", "of",
];

/// Multi-character punctuators, longest first. `>` is never combined so
/// that nested generic brackets close one at a time.
const PUNCTUATORS: &[&str] = &[
    "...", "===", "!==", "**=", "<<=", "&&=", "||=", "??=", "=>", "==", "!=", "<=", "&&", "||",
    "??", "?.", "++", "--", "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "**", "<<",
];

/// Returns `true` for reserved words.
pub(crate) fn is_reserved(word: &str) -> bool {
    RESERVED.contains(&word)
}

pub(crate) fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// What the last significant token was, for regex/JSX disambiguation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Prev {
    /// Start of input or of an embedded expression
    Start,
    /// A value: identifier, literal, or closing bracket
    Value,
    /// An operator, opening bracket, or expression keyword
    Operator,
}

/// Streaming tokenizer.
#[derive(Debug)]
pub(crate) struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    prev: Prev,
}

impl<'a> Lexer<'a> {
    pub const fn new(src: &'a str) -> Self {
        Self::at(src, 0)
    }

    /// Starts lexing at `pos`, treating it as the start of an expression.
    pub const fn at(src: &'a str, pos: usize) -> Self {
        Self {
            src,
            pos,
            prev: Prev::Start,
        }
    }

    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Continues after text consumed by someone else (a JSX element).
    pub const fn resume_after_value(&mut self, pos: usize) {
        self.pos = pos;
        self.prev = Prev::Value;
    }

    /// Returns `true` when an expression may start at the current position.
    pub const fn expression_allowed(&self) -> bool {
        !matches!(self.prev, Prev::Value)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset..)?.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    /// Produces the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> LexResult<Option<Token>> {
        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = if c.is_whitespace() {
            self.eat_while(char::is_whitespace);
            TokenKind::Whitespace
        } else if c == '/' && self.peek_at(1) == Some('/') {
            self.eat_while(|c| c != '\n');
            TokenKind::LineComment
        } else if c == '/' && self.peek_at(1) == Some('*') {
            self.block_comment(start)?;
            TokenKind::BlockComment
        } else if c == '"' || c == '\'' {
            self.string(c, start)?;
            TokenKind::String
        } else if c == '`' {
            self.template(start)?;
            TokenKind::Template
        } else if c.is_ascii_digit()
            || (c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit()))
        {
            self.eat_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
            TokenKind::Number
        } else if is_ident_start(c) || c == '#' || c == '\\' {
            self.bump();
            self.eat_while(is_ident_continue);
            TokenKind::Ident
        } else if c == '/' && self.expression_allowed() {
            self.regex(start)?;
            TokenKind::Regex
        } else {
            self.punct();
            TokenKind::Punct
        };

        let token = Token {
            kind,
            span: start..self.pos,
        };
        self.update_prev(&token);
        Ok(Some(token))
    }

    fn update_prev(&mut self, token: &Token) {
        let text = token.text(self.src);
        self.prev = match token.kind {
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment => return,
            TokenKind::Number | TokenKind::String | TokenKind::Template | TokenKind::Regex => {
                Prev::Value
            }
            TokenKind::Ident if EXPRESSION_KEYWORDS.contains(&text) => Prev::Operator,
            TokenKind::Ident => Prev::Value,
            TokenKind::Punct if matches!(text, ")" | "]" | "}" | "++" | "--") => Prev::Value,
            TokenKind::Punct => Prev::Operator,
        };
    }

    fn block_comment(&mut self, start: usize) -> LexResult<()> {
        self.pos += 2;
        match self.src[self.pos..].find("*/") {
            Some(end) => {
                self.pos += end + 2;
                Ok(())
            }
            None => Err(SyntaxError::new("Unterminated comment", start)),
        }
    }

    fn string(&mut self, quote: char, start: usize) -> LexResult<()> {
        self.bump();
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => return Ok(()),
                Some('\n') | None => {
                    return Err(SyntaxError::new("Unterminated string literal", start));
                }
                Some(_) => {}
            }
        }
    }

    fn template(&mut self, start: usize) -> LexResult<()> {
        self.bump();
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some('`') => return Ok(()),
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    self.skip_embedded_expression(start)?;
                }
                Some(_) => {}
                None => return Err(SyntaxError::new("Unterminated template literal", start)),
            }
        }
    }

    /// Skips a `${ ... }` body up to and including its closing brace.
    fn skip_embedded_expression(&mut self, template_start: usize) -> LexResult<()> {
        let mut inner = Lexer::at(self.src, self.pos);
        let mut depth = 0usize;
        while let Some(token) = inner.next_token()? {
            if token.kind != TokenKind::Punct {
                continue;
            }
            match token.text(self.src) {
                "{" => depth += 1,
                "}" if depth == 0 => {
                    self.pos = inner.pos;
                    return Ok(());
                }
                "}" => depth -= 1,
                _ => {}
            }
        }
        Err(SyntaxError::new("Unterminated template literal", template_start))
    }

    fn regex(&mut self, start: usize) -> LexResult<()> {
        self.bump();
        let mut in_class = false;
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some('[') => in_class = true,
                Some(']') => in_class = false,
                Some('/') if !in_class => break,
                Some('\n') | None => {
                    return Err(SyntaxError::new("Unterminated regular expression", start));
                }
                Some(_) => {}
            }
        }
        self.eat_while(is_ident_continue);
        Ok(())
    }

    fn punct(&mut self) {
        let rest = &self.src[self.pos..];
        if rest.starts_with("?.") && rest[2..].starts_with(|c: char| c.is_ascii_digit()) {
            self.pos += 1;
            return;
        }
        if let Some(p) = PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) {
            self.pos += p.len();
        } else {
            self.bump();
        }
    }
}

/// Tokenizes a whole source text.
pub(crate) fn tokenize(src: &str) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::new(src);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

/// Tokenizes `src[range]`, where `range` starts at a token boundary.
pub(crate) fn tokenize_range(src: &str, range: Range<usize>) -> LexResult<Vec<Token>> {
    let mut lexer = Lexer::at(src, range.start);
    let mut tokens = Vec::new();
    while lexer.pos() < range.end {
        let Some(token) = lexer.next_token()? else {
            break;
        };
        tokens.push(token);
    }
    Ok(tokens)
}

/// Byte ranges of the `${ ... }` expressions of the template literal at
/// `span`, delimiters excluded.
pub(crate) fn template_substitutions(src: &str, span: Range<usize>) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut lexer = Lexer::at(src, span.start + 1);
    while lexer.pos() < span.end {
        match lexer.bump() {
            Some('\\') => {
                lexer.bump();
            }
            Some('$') if lexer.peek() == Some('{') => {
                lexer.bump();
                let start = lexer.pos();
                if lexer.skip_embedded_expression(span.start).is_err() {
                    break;
                }
                ranges.push(start..lexer.pos() - 1);
            }
            Some('`') | None => break,
            Some(_) => {}
        }
    }
    ranges
}

/// The significant tokens of a source text, indexed for lookahead.
///
/// Out-of-range indices read as an empty token, so callers can read
/// `i + 1` or `i + 2` without bounds checks.
#[derive(Debug)]
pub(crate) struct Tokens<'a> {
    pub src: &'a str,
    pub sig: Vec<Token>,
}

impl<'a> Tokens<'a> {
    pub fn new(src: &'a str, tokens: Vec<Token>) -> Self {
        Self {
            src,
            sig: tokens.into_iter().filter(|t| !t.is_trivia()).collect(),
        }
    }

    pub fn text(&self, i: usize) -> &'a str {
        self.sig.get(i).map_or("", |t| t.text(self.src))
    }

    pub fn kind(&self, i: usize) -> Option<TokenKind> {
        self.sig.get(i).map(|t| t.kind)
    }

    pub fn is_punct(&self, i: usize, text: &str) -> bool {
        self.kind(i) == Some(TokenKind::Punct) && self.text(i) == text
    }

    pub fn is_word(&self, i: usize, text: &str) -> bool {
        self.kind(i) == Some(TokenKind::Ident) && self.text(i) == text
    }

    /// Returns `true` for an identifier that is not a reserved word.
    pub fn is_name(&self, i: usize) -> bool {
        self.kind(i) == Some(TokenKind::Ident) && !is_reserved(self.text(i))
    }

    pub fn start(&self, i: usize) -> usize {
        self.sig.get(i).map_or(self.src.len(), |t| t.span.start)
    }

    pub fn end(&self, i: usize) -> usize {
        self.sig.get(i).map_or(self.src.len(), |t| t.span.end)
    }

    pub fn span(&self, i: usize) -> Range<usize> {
        self.start(i)..self.end(i)
    }

    /// Returns `true` if token `i` is a property name after `.` or `?.`.
    pub fn is_member(&self, i: usize) -> bool {
        i > 0 && (self.is_punct(i - 1, ".") || self.is_punct(i - 1, "?."))
    }

    /// Returns `true` if a line break separates token `i` from the one
    /// before it.
    pub fn line_break_before(&self, i: usize) -> bool {
        i > 0 && i < self.sig.len() && self.src[self.end(i - 1)..self.start(i)].contains('\n')
    }

    /// Index of the bracket closing the one opened at `open`.
    pub fn closing(&self, open: usize) -> usize {
        let mut depth = 0usize;
        for j in open..self.sig.len() {
            if self.kind(j) != Some(TokenKind::Punct) {
                continue;
            }
            match self.text(j) {
                "(" | "[" | "{" => depth += 1,
                ")" | "]" | "}" => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return j;
                    }
                }
                _ => {}
            }
        }
        self.sig.len()
    }

    /// Index of the `,` or statement end following an initializer.
    pub fn initializer_end(&self, mut j: usize) -> usize {
        let start = j;
        while j < self.sig.len() {
            if self.kind(j) == Some(TokenKind::Punct) {
                match self.text(j) {
                    "(" | "[" | "{" => {
                        j = self.closing(j) + 1;
                        continue;
                    }
                    "," | ";" | ")" | "]" | "}" => return j,
                    _ => {}
                }
            }
            if j > start && self.line_break_before(j) {
                let continues = self.kind(j) == Some(TokenKind::Punct)
                    || self.kind(j - 1) == Some(TokenKind::Punct)
                    || ["instanceof", "in", "of"].iter().any(|w| self.is_word(j, w));
                if !continues {
                    return j;
                }
            }
            j += 1;
        }
        j
    }

    /// Indices of the names bound by the declarator list starting at `j`,
    /// the token after `const`, `let` or `var`.
    pub fn declarators(&self, mut j: usize) -> Vec<usize> {
        let mut names = Vec::new();
        loop {
            if self.is_name(j) {
                names.push(j);
                j += 1;
            } else if self.is_punct(j, "{") || self.is_punct(j, "[") {
                let close = self.closing(j);
                names.extend(self.pattern_names(j, close));
                j = close + 1;
            } else {
                break;
            }

            if self.is_punct(j, "=") {
                j = self.initializer_end(j + 1);
            }
            if self.is_punct(j, ",") {
                j += 1;
            } else {
                break;
            }
        }
        names
    }

    /// Indices of the names bound inside the destructuring pattern or
    /// parameter list bracketed by `open` and `close`. Default values are
    /// skipped.
    pub fn pattern_names(&self, open: usize, close: usize) -> Vec<usize> {
        let mut names = Vec::new();
        let mut k = open + 1;
        while k < close {
            if self.is_punct(k, "=") {
                k = self.initializer_end(k + 1).max(k + 1);
                continue;
            }
            if self.is_name(k) && !self.is_punct(k + 1, ":") && !self.is_member(k) {
                names.push(k);
            }
            k += 1;
        }
        names
    }
}

/// Verifies that `()`, `[]`, and `{}` are balanced.
pub(crate) fn check_brackets(src: &str, tokens: &[Token]) -> LexResult<()> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    for token in tokens.iter().filter(|t| t.kind == TokenKind::Punct) {
        let text = token.text(src);
        let Some(c) = text.chars().next().filter(|_| text.len() == 1) else {
            continue;
        };
        match c {
            '(' | '[' | '{' => stack.push((c, token.span.start)),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    Some((open, offset)) => {
                        return Err(SyntaxError::new(
                            format!("Unexpected '{c}', '{open}' opened here is not closed"),
                            offset,
                        ));
                    }
                    None => {
                        return Err(SyntaxError::new(format!("Unexpected '{c}'"), token.span.start));
                    }
                }
            }
            _ => {}
        }
    }
    match stack.pop() {
        Some((open, offset)) => Err(SyntaxError::new(format!("Unclosed '{open}'"), offset)),
        None => Ok(()),
    }
}

/// Maps byte offsets to 1-based line and column numbers.
#[derive(Debug)]
pub(crate) struct LineIndex<'a> {
    src: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(src: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(src.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { src, starts }
    }

    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.src.len());
        let line = self.starts.partition_point(|&start| start <= offset);
        let line_start = self.starts[line.saturating_sub(1)];
        let column = self.src.get(line_start..offset).map_or(0, |s| s.chars().count());
        (line, column + 1)
    }
}

/// Number of newlines in `text`.
pub(crate) fn newlines(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, &str)> {
        tokenize(src)
            .unwrap()
            .into_iter()
            .filter(|t| !t.is_trivia())
            .map(|t| (t.kind, &src[t.span]))
            .collect()
    }

    #[test]
    fn test_tokens_cover_input() {
        let src = "const a = `x${b}` + 'c' // done\n/* c */ f(/re/g);";
        let tokens = tokenize(src).unwrap();
        let rebuilt: String = tokens.iter().map(|t| t.text(src)).collect();
        assert_eq!(rebuilt, src);
    }

    #[test]
    fn test_regex_versus_division() {
        let toks = kinds("a / b; x = /ab+c/i.test(s)");
        assert_eq!(toks[1], (TokenKind::Punct, "/"));
        assert!(toks.contains(&(TokenKind::Regex, "/ab+c/i")));
    }

    #[test]
    fn test_regex_after_return() {
        let toks = kinds("return /[/]x/");
        assert_eq!(toks[1], (TokenKind::Regex, "/[/]x/"));
    }

    #[test]
    fn test_template_with_nested_braces() {
        let toks = kinds("`a ${ {b: `c${d}`}.b } e` + 1");
        assert_eq!(toks[0].0, TokenKind::Template);
        assert_eq!(toks[1], (TokenKind::Punct, "+"));
    }

    #[test]
    fn test_greater_than_is_never_combined() {
        let toks = kinds("Array<Array<T>>");
        assert_eq!(toks[5], (TokenKind::Punct, ">"));
        assert_eq!(toks[6], (TokenKind::Punct, ">"));
    }

    #[test]
    fn test_optional_chain_versus_ternary_number() {
        assert_eq!(kinds("a?.b")[1], (TokenKind::Punct, "?."));
        assert_eq!(kinds("a?.5:1")[1], (TokenKind::Punct, "?"));
    }

    #[test]
    fn test_unterminated_errors() {
        assert_eq!(
            tokenize("let s = 'abc\n';").unwrap_err().message,
            "Unterminated string literal"
        );
        assert_eq!(tokenize("/* open").unwrap_err().offset, 0);
        assert!(tokenize("`abc").is_err());
        assert!(tokenize("x = /abc\n").is_err());
    }

    #[test]
    fn test_bracket_balance() {
        let src = "function f() { return [1, 2); }";
        let tokens = tokenize(src).unwrap();
        let err = check_brackets(src, &tokens).unwrap_err();
        assert!(err.message.contains("'['"));

        let src = "if (a) {";
        let tokens = tokenize(src).unwrap();
        assert_eq!(check_brackets(src, &tokens).unwrap_err().message, "Unclosed '{'");
    }

    #[test]
    fn test_line_index_positions() {
        let index = LineIndex::new("ab\ncdé\nf");
        assert_eq!(index.position(0), (1, 1));
        assert_eq!(index.position(3), (2, 1));
        assert_eq!(index.position(7), (2, 4));
        assert_eq!(index.position(9), (3, 1));
    }
}

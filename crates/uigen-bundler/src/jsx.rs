//! JSX to factory-call conversion.
//!
//! `<Card title="Hi" {...rest}>text {value}</Card>` becomes
//! `__jsx(Card, Object.assign({}, {"title": "Hi"}, rest), "text ", value)`.
//! Intrinsic elements (lowercase or dashed names) are passed as strings and
//! fragments use `__Fragment`. Children text follows the usual JSX whitespace
//! rules and has HTML entities decoded.
//!
//! Output keeps the line of every attribute and child: newlines are emitted
//! between call arguments until the output catches up with the source.

use crate::lexer::{
    LexResult, Lexer, LineIndex, SyntaxError, TokenKind, is_ident_continue, is_ident_start,
    newlines,
};

/// Name of the element factory in compiled output.
pub(crate) const FACTORY: &str = "__jsx";

/// Name of the fragment component in compiled output.
pub(crate) const FRAGMENT: &str = "__Fragment";

/// Result of the JSX pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JsxOutput {
    pub code: String,
    pub uses_jsx: bool,
}

/// Converts every JSX element in `src`.
pub(crate) fn transform(src: &str) -> LexResult<JsxOutput> {
    let mut jsx = Jsx {
        src,
        lines: LineIndex::new(src),
        out: String::with_capacity(src.len() + src.len() / 4),
        out_lines: 0,
        uses_jsx: false,
    };
    jsx.script(0, false)?;
    Ok(JsxOutput {
        code: jsx.out,
        uses_jsx: jsx.uses_jsx,
    })
}

struct Jsx<'a> {
    src: &'a str,
    lines: LineIndex<'a>,
    out: String,
    out_lines: usize,
    uses_jsx: bool,
}

impl Jsx<'_> {
    fn push(&mut self, text: &str) {
        self.out_lines += newlines(text);
        self.out.push_str(text);
    }

    /// Pads the output with newlines up to the source line of `offset`.
    /// Only called inside an open factory call, where a newline is harmless.
    fn sync(&mut self, offset: usize) {
        let target = self.lines.position(offset).0 - 1;
        while self.out_lines < target {
            self.out.push('\n');
            self.out_lines += 1;
        }
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.src.get(pos..)?.chars().next()
    }

    fn skip_whitespace(&self, mut pos: usize) -> usize {
        while let Some(c) = self.char_at(pos).filter(|c| c.is_whitespace()) {
            pos += c.len_utf8();
        }
        pos
    }

    fn expect(&self, pos: usize, c: char, message: &str) -> LexResult<usize> {
        if self.char_at(pos) == Some(c) {
            Ok(pos + 1)
        } else {
            Err(SyntaxError::new(message, pos))
        }
    }

    /// Copies script code, converting elements found in expression position.
    /// With `until_brace`, stops at the unmatched `}` and returns its offset.
    fn script(&mut self, start: usize, until_brace: bool) -> LexResult<usize> {
        let mut lexer = Lexer::at(self.src, start);
        let mut depth = 0usize;
        loop {
            let allowed = lexer.expression_allowed();
            let Some(token) = lexer.next_token()? else {
                if until_brace {
                    return Err(SyntaxError::new("Unterminated JSX expression", start));
                }
                return Ok(self.src.len());
            };
            if token.kind == TokenKind::Punct {
                match token.text(self.src) {
                    "<" if allowed && self.starts_element(token.span.end) => {
                        let end = self.element(token.span.start)?;
                        lexer.resume_after_value(end);
                        continue;
                    }
                    "{" => depth += 1,
                    "}" if until_brace && depth == 0 => return Ok(token.span.start),
                    "}" => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
            self.push(token.text(self.src));
        }
    }

    /// Tells an element start from a generic parameter list like `<T,>`.
    fn starts_element(&self, pos: usize) -> bool {
        match self.char_at(pos) {
            Some('>') => true,
            Some(c) if is_ident_start(c) => {
                let name_end = self.name_end(pos);
                let after = self.skip_whitespace(name_end);
                let rest = &self.src[after..];
                if rest.starts_with(',') {
                    return false;
                }
                !(after > name_end
                    && rest.starts_with("extends")
                    && rest[7..].starts_with(char::is_whitespace))
            }
            _ => false,
        }
    }

    fn name_end(&self, mut pos: usize) -> usize {
        while let Some(c) = self
            .char_at(pos)
            .filter(|c| is_ident_continue(*c) || matches!(c, '-' | '.' | ':'))
        {
            pos += c.len_utf8();
        }
        pos
    }

    /// Converts the element starting at `start` (a `<`) and returns the
    /// offset just past it.
    fn element(&mut self, start: usize) -> LexResult<usize> {
        self.uses_jsx = true;
        let mut pos = self.skip_whitespace(start + 1);

        if self.char_at(pos) == Some('>') {
            self.push(&format!("{FACTORY}({FRAGMENT}, null"));
            let end = self.children(pos + 1, "", start)?;
            self.sync(end);
            self.push(")");
            return Ok(end);
        }

        let src = self.src;
        let name_end = self.name_end(pos);
        let name = &src[pos..name_end];
        self.push(&format!("{FACTORY}({}", element_type(name)));
        pos = self.attributes(name_end)?;

        let end = if self.src[pos..].starts_with("/>") {
            pos + 2
        } else {
            self.children(pos + 1, name, start)?
        };
        self.sync(end);
        self.push(")");
        Ok(end)
    }

    /// Emits the props argument. Returns the offset of `>` or `/>`.
    ///
    /// Each attribute is generated into its own buffer so that spreads can
    /// be grouped into an `Object.assign` call afterwards.
    fn attributes(&mut self, mut pos: usize) -> LexResult<usize> {
        let outer = std::mem::take(&mut self.out);
        let mut props: Vec<Prop> = Vec::new();
        loop {
            pos = self.skip_whitespace(pos);
            let Some(c) = self.char_at(pos) else {
                return Err(SyntaxError::new("Unterminated JSX tag", pos));
            };
            if c == '>' || self.src[pos..].starts_with("/>") {
                break;
            }
            self.sync(pos);

            if c == '{' {
                let body = self.skip_whitespace(pos + 1);
                if !self.src[body..].starts_with("...") {
                    return Err(SyntaxError::new("Unexpected token in JSX attributes", pos));
                }
                self.push("(");
                let close = self.script(body + 3, true)?;
                self.push(")");
                props.push(Prop::Spread(std::mem::take(&mut self.out)));
                pos = close + 1;
                continue;
            }
            if !is_ident_start(c) {
                return Err(SyntaxError::new(
                    format!("Unexpected token '{c}' in JSX attributes"),
                    pos,
                ));
            }

            let name_end = self.name_end(pos);
            let key = property_key(&self.src[pos..name_end]);
            self.push(&key);
            self.push(": ");
            let after = self.skip_whitespace(name_end);
            if self.char_at(after) == Some('=') {
                pos = self.attribute_value(self.skip_whitespace(after + 1))?;
            } else {
                self.push("true");
                pos = name_end;
            }
            props.push(Prop::Entry(std::mem::take(&mut self.out)));
        }

        self.out = outer;
        self.out.push_str(&props_argument(&props));
        Ok(pos)
    }

    fn attribute_value(&mut self, pos: usize) -> LexResult<usize> {
        match self.char_at(pos) {
            Some(quote @ ('"' | '\'')) => {
                let Some(len) = self.src[pos + 1..].find(quote) else {
                    return Err(SyntaxError::new("Unterminated JSX string", pos));
                };
                let raw = &self.src[pos + 1..pos + 1 + len];
                self.push(&quote_js(&decode_entities(raw)));
                Ok(pos + len + 2)
            }
            Some('{') => {
                let body = self.skip_whitespace(pos + 1);
                if self.char_at(body) == Some('}') {
                    return Err(SyntaxError::new(
                        "JSX attributes must only be assigned a non-empty expression",
                        pos,
                    ));
                }
                self.push("(");
                let close = self.script(pos + 1, true)?;
                self.push(")");
                Ok(close + 1)
            }
            Some('<') => self.element(pos),
            _ => Err(SyntaxError::new("Expected a JSX attribute value", pos)),
        }
    }

    /// Emits children up to the closing tag and returns the offset past it.
    fn children(&mut self, mut pos: usize, name: &str, open: usize) -> LexResult<usize> {
        loop {
            let text_end = self.src[pos..]
                .find(['<', '{', '}'])
                .map_or(self.src.len(), |i| pos + i);
            let text = clean_text(&self.src[pos..text_end]);
            if !text.is_empty() {
                let first = self.skip_whitespace(pos);
                self.sync(first);
                self.push(", ");
                self.push(&quote_js(&decode_entities(&text)));
            }
            pos = text_end;

            match self.char_at(pos) {
                None => {
                    let label = if name.is_empty() { "<>" } else { name };
                    return Err(SyntaxError::new(
                        format!("Unterminated JSX contents for <{label}>"),
                        open,
                    ));
                }
                Some('}') => {
                    return Err(SyntaxError::new("Unexpected token '}' in JSX text", pos));
                }
                Some('{') => {
                    if let Some(close) = self.empty_container(pos) {
                        pos = close;
                        continue;
                    }
                    self.sync(pos);
                    self.push(", ");
                    let close = self.script(pos + 1, true)?;
                    pos = close + 1;
                }
                Some(_) => {
                    let after = self.skip_whitespace(pos + 1);
                    if self.char_at(after) == Some('/') {
                        return self.closing_tag(after + 1, name, pos);
                    }
                    self.sync(pos);
                    self.push(", ");
                    pos = self.element(pos)?;
                }
            }
        }
    }

    /// `{}` or `{/* comment */}` children produce nothing.
    fn empty_container(&self, open: usize) -> Option<usize> {
        let mut lexer = Lexer::at(self.src, open + 1);
        while let Ok(Some(token)) = lexer.next_token() {
            if token.is_trivia() {
                continue;
            }
            return token.is_punct(self.src, "}").then_some(token.span.end);
        }
        None
    }

    fn closing_tag(&self, pos: usize, name: &str, tag_start: usize) -> LexResult<usize> {
        let start = self.skip_whitespace(pos);
        let end = self.name_end(start);
        let found = &self.src[start..end];
        if found != name {
            let expected = if name.is_empty() {
                "</>".to_string()
            } else {
                format!("</{name}>")
            };
            return Err(SyntaxError::new(
                format!("Expected corresponding JSX closing tag {expected}"),
                tag_start,
            ));
        }
        let gt = self.skip_whitespace(end);
        self.expect(gt, '>', "Expected '>' to end the JSX closing tag")
    }
}

/// One generated attribute: `key: value` or a spread expression.
#[derive(Debug)]
enum Prop {
    Entry(String),
    Spread(String),
}

/// Assembles the props argument, starting with its separating comma.
fn props_argument(props: &[Prop]) -> String {
    if props.is_empty() {
        return ", null".to_string();
    }

    let mut out = String::new();
    let mut group: Vec<&str> = Vec::new();
    let mut spread = false;
    for prop in props {
        match prop {
            Prop::Entry(text) => group.push(text),
            Prop::Spread(text) => {
                if !group.is_empty() {
                    out.push_str(&format!(", {{{}}}", group.join(", ")));
                    group.clear();
                }
                out.push_str(", ");
                out.push_str(text);
                spread = true;
            }
        }
    }
    if !group.is_empty() {
        out.push_str(&format!(", {{{}}}", group.join(", ")));
    }
    if spread {
        format!(", Object.assign({{}}{out})")
    } else {
        out
    }
}

/// Factory type argument for a tag name.
fn element_type(name: &str) -> String {
    let intrinsic = name.starts_with(|c: char| c.is_ascii_lowercase())
        || name.contains('-')
        || name.contains(':');
    if intrinsic && !name.contains('.') {
        quote_js(name)
    } else {
        name.to_string()
    }
}

fn property_key(name: &str) -> String {
    if name.chars().all(is_ident_continue) {
        name.to_string()
    } else {
        quote_js(name)
    }
}

/// Applies JSX text whitespace rules: lines are trimmed, blank lines
/// dropped, and the remaining lines joined with a single space.
fn clean_text(raw: &str) -> String {
    let lines: Vec<&str> = raw.split('\n').collect();
    let last_non_empty = lines
        .iter()
        .rposition(|line| line.chars().any(|c| !matches!(c, ' ' | '\t' | '\r')));
    let Some(last_non_empty) = last_non_empty else {
        return if lines.len() == 1 {
            raw.to_string()
        } else {
            String::new()
        };
    };

    let mut text = String::new();
    let last = lines.len() - 1;
    for (i, line) in lines.iter().enumerate() {
        let line = line.trim_end_matches('\r');
        let mut part = line;
        if i != 0 {
            part = part.trim_start_matches([' ', '\t']);
        }
        if i != last {
            part = part.trim_end_matches([' ', '\t']);
        }
        if part.is_empty() {
            continue;
        }
        text.push_str(part);
        if i != last_non_empty {
            text.push(' ');
        }
    }
    text
}

/// Decodes the HTML entities JSX text and attribute strings may contain.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| entity(&rest[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code);
    }
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "times" => '\u{d7}',
        "middot" => '\u{b7}',
        "bull" => '\u{2022}',
        "larr" => '\u{2190}',
        "rarr" => '\u{2192}',
        "laquo" => '\u{ab}',
        "raquo" => '\u{bb}',
        "deg" => '\u{b0}',
        _ => return None,
    };
    Some(c)
}

/// Double-quoted JavaScript string literal on a single line.
pub(crate) fn quote_js(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

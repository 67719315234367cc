//! Structure-preserving editor for JS files exporting one config object.
//!
//! The literal text is parsed by a dedicated recursive-descent parser over a
//! restricted grammar (objects, arrays, strings, numbers, booleans, null).
//! Nothing is ever evaluated as code; anything outside the grammar is a
//! parse error. Comments inside the literal are skipped while parsing and
//! therefore absent from the rewritten statement; that loss is accepted.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::domain::errors::AdsyncError;

static EXPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"export\s+(const|let|var|default)\s+([A-Za-z_$][A-Za-z0-9_$]*)\s*=\s*\{").unwrap()
});

/// Undo history bound; the oldest snapshot is dropped beyond this.
pub const HISTORY_LIMIT: usize = 64;

/// Declaration keyword of the located export statement.
///
/// Metadata only: the rewritten statement is always `export const`, the
/// format the generated files standardize on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Const,
    Let,
    Var,
    Default,
}

impl ExportKind {
    fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "const" => ExportKind::Const,
            "let" => ExportKind::Let,
            "var" => ExportKind::Var,
            _ => ExportKind::Default,
        }
    }
}

/// One opened config file: the parsed object, the untouched surrounding
/// text, and a bounded linear edit history.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    prefix: String,
    suffix: String,
    export_kind: ExportKind,
    export_identifier: String,
    history: Vec<Value>,
    cursor: usize,
}

impl ConfigDocument {
    /// Locate and parse the first `export const|let|var|default NAME = {…};`
    /// statement in `source`.
    pub fn parse(source: &str) -> Result<Self, AdsyncError> {
        let captures = EXPORT_RE
            .captures(source)
            .ok_or_else(|| AdsyncError::parse(0, "no config object export found"))?;
        let statement = captures.get(0).expect("whole match");
        let keyword = &captures[1];
        let identifier = &captures[2];

        let brace_start = statement.end() - 1;
        let literal_end = scan_balanced_literal(source, brace_start)?;

        let rest = &source[literal_end..];
        let semicolon = rest
            .char_indices()
            .find(|(_, ch)| !ch.is_whitespace())
            .filter(|(_, ch)| *ch == ';')
            .map(|(idx, _)| literal_end + idx)
            .ok_or_else(|| {
                AdsyncError::parse(literal_end, "expected `;` after config object literal")
            })?;

        let literal = &source[brace_start..literal_end];
        let value = parse_literal_at(literal, brace_start)?;

        Ok(Self {
            prefix: source[..statement.start()].to_owned(),
            suffix: source[semicolon + 1..].to_owned(),
            export_kind: ExportKind::from_keyword(keyword),
            export_identifier: identifier.to_owned(),
            history: vec![value],
            cursor: 0,
        })
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, AdsyncError> {
        let source = fs::read_to_string(path).map_err(|err| AdsyncError::io(path, err))?;
        Self::parse(&source)
    }

    pub fn export_identifier(&self) -> &str {
        &self.export_identifier
    }

    pub fn export_kind(&self) -> ExportKind {
        self.export_kind
    }

    /// The document value at the current history cursor.
    pub fn value(&self) -> &Value {
        &self.history[self.cursor]
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }

    /// Replace the value at a dotted key path, recording a new history
    /// snapshot and truncating any redo entries.
    ///
    /// Intermediate segments must resolve to existing objects or in-bounds
    /// array indices; the final segment may create a new object key.
    pub fn set_path(&mut self, key_path: &str, new_value: Value) -> Result<(), AdsyncError> {
        let mut next = self.value().clone();
        set_at_path(&mut next, key_path, new_value)?;

        self.history.truncate(self.cursor + 1);
        self.history.push(next);
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.cursor = self.history.len() - 1;
        Ok(())
    }

    /// Step back one snapshot. No-op at the oldest entry.
    pub fn undo(&mut self) -> bool {
        if self.can_undo() {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Step forward one snapshot. No-op at the newest entry.
    pub fn redo(&mut self) -> bool {
        if self.can_redo() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Rebuild the full file text: untouched prefix, the canonical export
    /// statement, untouched suffix.
    pub fn render(&self) -> String {
        format!(
            "{}export const {} = {};{}",
            self.prefix,
            self.export_identifier,
            format_literal(self.value()),
            self.suffix
        )
    }

    /// Write the rebuilt file text back to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), AdsyncError> {
        fs::write(path, self.render()).map_err(|err| AdsyncError::io(path, err))
    }
}

fn set_at_path(root: &mut Value, key_path: &str, new_value: Value) -> Result<(), AdsyncError> {
    if key_path.is_empty() {
        return Err(AdsyncError::Validation("empty key path".into()));
    }
    let segments: Vec<&str> = key_path.split('.').collect();
    let (last, ancestors) = segments.split_last().expect("non-empty path");

    let mut current = root;
    for segment in ancestors {
        current = descend(current, segment)?;
    }

    match current {
        Value::Object(map) => {
            map.insert((*last).to_owned(), new_value);
            Ok(())
        }
        Value::Array(items) => {
            let index = array_index(last, items.len())?;
            items[index] = new_value;
            Ok(())
        }
        _ => Err(AdsyncError::Validation(format!(
            "key path segment `{last}` does not address an object or array"
        ))),
    }
}

fn descend<'v>(value: &'v mut Value, segment: &str) -> Result<&'v mut Value, AdsyncError> {
    match value {
        Value::Object(map) => map.get_mut(segment).ok_or_else(|| {
            AdsyncError::Validation(format!("key path segment `{segment}` not found"))
        }),
        Value::Array(items) => {
            let index = array_index(segment, items.len())?;
            Ok(&mut items[index])
        }
        _ => Err(AdsyncError::Validation(format!(
            "key path segment `{segment}` does not address an object or array"
        ))),
    }
}

fn array_index(segment: &str, len: usize) -> Result<usize, AdsyncError> {
    let index: usize = segment.parse().map_err(|_| {
        AdsyncError::Validation(format!("`{segment}` is not an array index"))
    })?;
    if index >= len {
        return Err(AdsyncError::Validation(format!(
            "array index {index} out of bounds (length {len})"
        )));
    }
    Ok(index)
}

/// Offset just past the `}` matching the `{` at `open_brace`.
///
/// String- and comment-aware so braces inside either never unbalance the
/// scan.
fn scan_balanced_literal(source: &str, open_brace: usize) -> Result<usize, AdsyncError> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut index = open_brace;
    while index < bytes.len() {
        match bytes[index] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(index + 1);
                }
            }
            quote @ (b'"' | b'\'' | b'`') => {
                index = skip_quoted(bytes, index, quote)
                    .ok_or_else(|| AdsyncError::parse(index, "unterminated string"))?;
            }
            b'/' if bytes.get(index + 1) == Some(&b'/') => {
                while index < bytes.len() && bytes[index] != b'\n' {
                    index += 1;
                }
                continue;
            }
            b'/' if bytes.get(index + 1) == Some(&b'*') => {
                let close = source[index + 2..]
                    .find("*/")
                    .ok_or_else(|| AdsyncError::parse(index, "unterminated block comment"))?;
                index += 2 + close + 1;
            }
            _ => {}
        }
        index += 1;
    }
    Err(AdsyncError::parse(
        open_brace,
        "unbalanced braces in config object literal",
    ))
}

fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let mut index = start + 1;
    while index < bytes.len() {
        match bytes[index] {
            b'\\' => index += 1,
            byte if byte == quote => return Some(index),
            _ => {}
        }
        index += 1;
    }
    None
}

/// Parse standalone literal text (used by the CLI to interpret edit values).
pub fn parse_literal(text: &str) -> Result<Value, AdsyncError> {
    parse_literal_at(text, 0)
}

fn parse_literal_at(text: &str, base_offset: usize) -> Result<Value, AdsyncError> {
    let mut parser = LiteralParser {
        src: text,
        pos: 0,
        base_offset,
    };
    parser.skip_trivia()?;
    let value = parser.parse_value()?;
    parser.skip_trivia()?;
    if parser.pos != parser.src.len() {
        return Err(parser.error("unexpected trailing text after literal"));
    }
    Ok(value)
}

/// Recursive-descent parser over the restricted literal grammar.
struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
    base_offset: usize,
}

impl<'a> LiteralParser<'a> {
    fn error(&self, message: impl Into<String>) -> AdsyncError {
        AdsyncError::parse(self.base_offset + self.pos, message)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> Result<(), AdsyncError> {
        match self.peek() {
            Some(ch) if ch == expected => {
                self.bump();
                Ok(())
            }
            Some(ch) => Err(self.error(format!("expected `{expected}`, found `{ch}`"))),
            None => Err(self.error(format!("expected `{expected}`, found end of input"))),
        }
    }

    fn skip_trivia(&mut self) -> Result<(), AdsyncError> {
        loop {
            while let Some(ch) = self.peek() {
                if ch.is_whitespace() {
                    self.bump();
                } else {
                    break;
                }
            }
            let rest = &self.src[self.pos..];
            if rest.starts_with("//") {
                match rest.find('\n') {
                    Some(offset) => self.pos += offset + 1,
                    None => self.pos = self.src.len(),
                }
            } else if rest.starts_with("/*") {
                let close = rest[2..]
                    .find("*/")
                    .ok_or_else(|| self.error("unterminated block comment"))?;
                self.pos += 2 + close + 2;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_value(&mut self) -> Result<Value, AdsyncError> {
        match self.peek() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('"') | Some('\'') => self.parse_string().map(Value::String),
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.parse_number(),
            Some(ch) if ch == '_' || ch == '$' || ch.is_alphabetic() => {
                match self.parse_identifier().as_str() {
                    "true" => Ok(Value::Bool(true)),
                    "false" => Ok(Value::Bool(false)),
                    "null" => Ok(Value::Null),
                    other => Err(self.error(format!(
                        "`{other}` is outside the supported literal grammar"
                    ))),
                }
            }
            Some(ch) => Err(self.error(format!("unexpected character `{ch}`"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn parse_object(&mut self) -> Result<Value, AdsyncError> {
        self.eat('{')?;
        let mut map = serde_json::Map::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(map));
            }
            let key = self.parse_key()?;
            self.skip_trivia()?;
            self.eat(':')?;
            self.skip_trivia()?;
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                _ => return Err(self.error("expected `,` or `}` in object literal")),
            }
        }
    }

    fn parse_key(&mut self) -> Result<String, AdsyncError> {
        match self.peek() {
            Some('"') | Some('\'') => self.parse_string(),
            Some('[') => Err(self.error("computed keys are outside the supported grammar")),
            Some(ch) if ch == '_' || ch == '$' || ch.is_alphabetic() => Ok(self.parse_identifier()),
            Some(ch) => Err(self.error(format!("invalid object key starting with `{ch}`"))),
            None => Err(self.error("unexpected end of input in object literal")),
        }
    }

    fn parse_identifier(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == '_' || ch == '$' || ch.is_alphanumeric() {
                self.bump();
            } else {
                break;
            }
        }
        self.src[start..self.pos].to_owned()
    }

    fn parse_array(&mut self) -> Result<Value, AdsyncError> {
        self.eat('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(']') {
                self.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value()?);
            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                _ => return Err(self.error("expected `,` or `]` in array literal")),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, AdsyncError> {
        let quote = self.bump().expect("caller checked quote");
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(ch) if ch == quote => return Ok(out),
                Some('\\') => {
                    let escape = self
                        .bump()
                        .ok_or_else(|| self.error("unterminated escape sequence"))?;
                    match escape {
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        'b' => out.push('\u{0008}'),
                        'f' => out.push('\u{000C}'),
                        'v' => out.push('\u{000B}'),
                        '0' => out.push('\0'),
                        'u' => out.push(self.parse_unicode_escape()?),
                        'x' => {
                            let code = self.parse_hex_digits(2)?;
                            out.push(char::from(code as u8));
                        }
                        // JS drops the backslash from unknown escapes.
                        other => out.push(other),
                    }
                }
                Some(ch) => out.push(ch),
            }
        }
    }

    fn parse_unicode_escape(&mut self) -> Result<char, AdsyncError> {
        let unit = self.parse_hex_digits(4)?;
        if (0xD800..0xDC00).contains(&unit) {
            // High surrogate; a low surrogate escape must follow.
            if self.peek() == Some('\\') {
                self.bump();
                self.eat('u')?;
                let low = self.parse_hex_digits(4)?;
                if (0xDC00..0xE000).contains(&low) {
                    let combined =
                        0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(combined)
                        .ok_or_else(|| self.error("invalid surrogate pair"));
                }
            }
            return Err(self.error("lone surrogate in unicode escape"));
        }
        char::from_u32(unit).ok_or_else(|| self.error("invalid unicode escape"))
    }

    fn parse_hex_digits(&mut self, count: usize) -> Result<u32, AdsyncError> {
        let mut value = 0u32;
        for _ in 0..count {
            let ch = self
                .bump()
                .ok_or_else(|| self.error("unterminated escape sequence"))?;
            let digit = ch
                .to_digit(16)
                .ok_or_else(|| self.error(format!("invalid hex digit `{ch}`")))?;
            value = value * 16 + digit;
        }
        Ok(value)
    }

    fn parse_number(&mut self) -> Result<Value, AdsyncError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        let mut previous = '\0';
        while let Some(ch) = self.peek() {
            let accept = ch.is_ascii_digit()
                || ch == '.'
                || ch == 'e'
                || ch == 'E'
                || ((ch == '+' || ch == '-') && (previous == 'e' || previous == 'E'));
            if !accept {
                break;
            }
            previous = ch;
            self.bump();
        }
        let text = &self.src[start..self.pos];

        if !text.contains(['.', 'e', 'E'])
            && let Ok(int) = text.parse::<i64>()
        {
            return Ok(Value::Number(int.into()));
        }
        let float: f64 = text
            .parse()
            .map_err(|_| self.error(format!("invalid number `{text}`")))?;
        serde_json::Number::from_f64(float)
            .map(Value::Number)
            .ok_or_else(|| self.error(format!("non-finite number `{text}`")))
    }
}

/// Canonical literal formatter: insertion-ordered keys, two-space indent.
/// Matches the format the existing rewritten config files use.
fn format_literal(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, 0, &mut out);
    out
}

fn write_value(value: &Value, depth: usize, out: &mut String) {
    match value {
        Value::Object(map) if map.is_empty() => out.push_str("{}"),
        Value::Object(map) => {
            out.push_str("{\n");
            let last = map.len() - 1;
            for (index, (key, entry)) in map.iter().enumerate() {
                write_indent(depth + 1, out);
                out.push_str(&Value::String(key.clone()).to_string());
                out.push_str(": ");
                write_value(entry, depth + 1, out);
                if index < last {
                    out.push(',');
                }
                out.push('\n');
            }
            write_indent(depth, out);
            out.push('}');
        }
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[\n");
            let last = items.len() - 1;
            for (index, item) in items.iter().enumerate() {
                write_indent(depth + 1, out);
                write_value(item, depth + 1, out);
                if index < last {
                    out.push(',');
                }
                out.push('\n');
            }
            write_indent(depth, out);
            out.push(']');
        }
        leaf => out.push_str(&leaf.to_string()),
    }
}

fn write_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

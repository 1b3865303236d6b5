//! Shell-document decoder — parses relaxed Mongo-shell document literals.
//!
//! The grammar accepts unquoted keys, single- or double-quoted strings with
//! escapes, nested arrays/objects, and constructor-call literals such as
//! `ObjectId("...")` or `Timestamp(5, 1)`. Parsing is a recursive descent
//! over *fragments*: the structural splitter cuts a bracketed span into its
//! top-level comma-delimited pieces, and each piece is classified by its
//! first significant character.
//!
//! # Key design decisions
//!
//! - **Fragment-based descent**: the splitter tracks brace, bracket, and
//!   paren depth plus string/escape state in a single left-to-right scan, so
//!   a comma only separates at depth 0 outside strings. Paren depth matters
//!   because constructor argument lists carry commas (`Timestamp(5, 1)`).
//! - **Explicit depth ceiling**: every recursion level checks `max_depth`;
//!   exceeding it is `ParseError::DepthLimit`, never a stack overflow.
//! - **Constructor names resolve at parse time**: `Identifier(args)` is only
//!   a `Call` when the identifier is in the registry; an unknown name is a
//!   `ConstructorError::Unknown` with the name, which makes for a better
//!   diagnostic than a generic unrecognized-literal error.
//! - **Errors carry verbatim fragment prefixes**: [`safe_parse`] locates the
//!   prefix in the original input to derive a 1-based line number for editor
//!   diagnostics.

use crate::constructors::Constructor;
use crate::error::{ConstructorError, LiteralError, ParseError, Result, StructuralError};
use crate::types::{insert_entry, Value};

/// Default recursion ceiling for the parse entry points.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parse a complete document. The top level must be an object or an array.
pub fn parse_document(text: &str, max_depth: usize) -> Result<Value> {
    let trimmed = text.trim();
    match trimmed.chars().next() {
        Some('{') | Some('[') => parse_fragment(trimmed, 0, max_depth),
        _ => Err(LiteralError::Unrecognized(snippet(trimmed)).into()),
    }
}

/// Parse any single literal (scalar, document, or constructor call) with the
/// default depth ceiling.
pub fn parse_value(text: &str) -> Result<Value> {
    parse_fragment(text.trim(), 0, DEFAULT_MAX_DEPTH)
}

/// Outcome of [`safe_parse`]: a parse attempt that never fails outright.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub success: bool,
    pub value: Option<Value>,
    /// Human-readable failure message when `success` is false.
    pub error: Option<String>,
    /// 1-based line of the failure, when derivable.
    pub error_line: Option<usize>,
}

/// Parse leniently: the relaxed grammar first, strict JSON on total failure.
///
/// Editing surfaces feed user text through this on every keystroke, so it
/// never raises. When both grammars reject the input, the outcome carries
/// the relaxed error message and a line number derived either from the
/// offending fragment's position or from serde_json's report.
pub fn safe_parse(text: &str) -> ParseOutcome {
    match parse_document(text, DEFAULT_MAX_DEPTH) {
        Ok(value) => ParseOutcome {
            success: true,
            value: Some(value),
            error: None,
            error_line: None,
        },
        Err(relaxed) => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(json) => ParseOutcome {
                success: true,
                value: Some(from_json(json)),
                error: None,
                error_line: None,
            },
            Err(strict) => {
                let line = relaxed
                    .fragment()
                    .and_then(|frag| line_of_fragment(text, frag))
                    .or_else(|| match strict.line() {
                        0 => None,
                        n => Some(n),
                    });
                ParseOutcome {
                    success: false,
                    value: None,
                    error: Some(relaxed.to_string()),
                    error_line: line,
                }
            }
        },
    }
}

/// Convert a strict-JSON tree into a shell-document `Value`. Key order is
/// preserved (serde_json's `preserve_order` feature).
pub fn from_json(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.to_string()),
        serde_json::Value::String(s) => Value::Str(s),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(from_json).collect())
        }
        serde_json::Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, from_json(v))).collect())
        }
    }
}

/// Classify a trimmed fragment by its first significant character.
fn parse_fragment(fragment: &str, depth: usize, max_depth: usize) -> Result<Value> {
    if depth >= max_depth {
        return Err(ParseError::DepthLimit(max_depth));
    }
    let fragment = fragment.trim();
    match fragment.chars().next() {
        None => Err(LiteralError::Unrecognized(String::new()).into()),
        Some('{') => parse_object(fragment, depth, max_depth),
        Some('[') => parse_array(fragment, depth, max_depth),
        Some(q @ ('"' | '\'')) => parse_quoted(fragment, q).map(Value::Str),
        Some(c) if c.is_ascii_digit() || c == '-' => parse_number(fragment),
        Some(_) => parse_word(fragment, depth, max_depth),
    }
}

/// `{...}` → split the inner span, cut each piece at its first top-level
/// colon, recurse on values.
fn parse_object(fragment: &str, depth: usize, max_depth: usize) -> Result<Value> {
    let inner = strip_delimiters(fragment, '{', '}')?;
    let mut entries: Vec<(String, Value)> = Vec::new();
    for piece in split_fragments(inner)? {
        let (key, rest) = split_entry(piece)?;
        let value = parse_fragment(rest, depth + 1, max_depth)?;
        insert_entry(&mut entries, key, value);
    }
    Ok(Value::Object(entries))
}

/// `[...]` → split the inner span, recurse on each piece.
fn parse_array(fragment: &str, depth: usize, max_depth: usize) -> Result<Value> {
    let inner = strip_delimiters(fragment, '[', ']')?;
    let mut items = Vec::new();
    for piece in split_fragments(inner)? {
        items.push(parse_fragment(piece, depth + 1, max_depth)?);
    }
    Ok(Value::Array(items))
}

/// Bare words: keyword literals and constructor calls.
fn parse_word(fragment: &str, depth: usize, max_depth: usize) -> Result<Value> {
    match fragment {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "null" | "undefined" => return Ok(Value::Null),
        _ => {}
    }

    if let Some((name, args_span)) = split_call(fragment) {
        if Constructor::from_name(name).is_none() {
            return Err(ConstructorError::Unknown(name.to_string()).into());
        }
        let mut args = Vec::new();
        for piece in split_fragments(args_span)? {
            args.push(parse_fragment(piece, depth + 1, max_depth)?);
        }
        return Ok(Value::Call {
            name: name.to_string(),
            args,
        });
    }

    Err(LiteralError::Unrecognized(snippet(fragment)).into())
}

/// Numeric literal: `-?\d+(\.\d+)?([eE][-+]?\d+)?`, text preserved.
fn parse_number(fragment: &str) -> Result<Value> {
    if is_numeric_literal(fragment) {
        Ok(Value::Number(fragment.to_string()))
    } else {
        Err(LiteralError::InvalidNumber(snippet(fragment)).into())
    }
}

fn is_numeric_literal(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    if i < bytes.len() && bytes[i] == b'-' {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == int_start {
        return false;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return false;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }
    i == bytes.len()
}

/// Split the inner text of a bracketed span into its top-level
/// comma-delimited fragments.
///
/// Single scan tracking brace/bracket/paren depth and string/escape state; a
/// comma separates only when all three depths are 0 and the scanner is
/// outside a string. A trailing empty fragment (from a trailing comma) is
/// dropped. Unterminated strings and unbalanced depths are
/// [`StructuralError::Unbalanced`].
fn split_fragments(inner: &str) -> std::result::Result<Vec<&str>, StructuralError> {
    let mut fragments = Vec::new();
    let mut brace = 0i32;
    let mut bracket = 0i32;
    let mut paren = 0i32;
    let mut in_string = false;
    let mut quote = '"';
    let mut escape_next = false;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape_next = true,
                c if c == quote => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                in_string = true;
                quote = c;
            }
            '{' => brace += 1,
            '}' => brace -= 1,
            '[' => bracket += 1,
            ']' => bracket -= 1,
            '(' => paren += 1,
            ')' => paren -= 1,
            ',' if brace == 0 && bracket == 0 && paren == 0 => {
                fragments.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        if brace < 0 || bracket < 0 || paren < 0 {
            return Err(StructuralError::Unbalanced(snippet(inner)));
        }
    }

    if in_string || brace != 0 || bracket != 0 || paren != 0 {
        return Err(StructuralError::Unbalanced(snippet(inner)));
    }

    let tail = inner[start..].trim();
    if !tail.is_empty() {
        fragments.push(tail);
    }
    Ok(fragments)
}

/// Strip the outer delimiter pair from a trimmed fragment.
fn strip_delimiters(fragment: &str, open: char, close: char) -> std::result::Result<&str, StructuralError> {
    fragment
        .strip_prefix(open)
        .and_then(|s| s.strip_suffix(close))
        .ok_or_else(|| StructuralError::Unbalanced(snippet(fragment)))
}

/// Cut an object entry at its first unquoted top-level colon, returning the
/// decoded key and the raw value text.
fn split_entry(piece: &str) -> Result<(String, &str)> {
    let piece = piece.trim();
    if let Some(q) = piece.chars().next().filter(|c| *c == '"' || *c == '\'') {
        let (key, end) = read_quoted(piece, q)?;
        let rest = piece[end..].trim_start();
        let rest = rest
            .strip_prefix(':')
            .ok_or_else(|| StructuralError::MalformedEntry(snippet(piece)))?;
        return Ok((key, rest));
    }

    // Bare key: must precede any nesting, so the first colon is the cut.
    let colon = piece
        .find(':')
        .ok_or_else(|| StructuralError::MalformedEntry(snippet(piece)))?;
    let key = piece[..colon].trim();
    if key.is_empty()
        || key
            .chars()
            .any(|c| c.is_whitespace() || "{}[]()\"'".contains(c))
    {
        return Err(StructuralError::MalformedEntry(snippet(piece)).into());
    }
    Ok((key.to_string(), &piece[colon + 1..]))
}

/// Decode a quoted string occupying the whole fragment.
fn parse_quoted(fragment: &str, quote: char) -> Result<String> {
    let (decoded, end) = read_quoted(fragment, quote)?;
    if !fragment[end..].trim().is_empty() {
        return Err(LiteralError::Unrecognized(snippet(fragment)).into());
    }
    Ok(decoded)
}

/// Decode a quoted string starting at the first byte of `text`. Returns the
/// decoded content and the byte index just past the closing quote.
///
/// Escapes: `\n`, `\r`, `\t`, `\\`, `\"`, `\'`; anything else passes through
/// with its backslash.
fn read_quoted(text: &str, quote: char) -> Result<(String, usize)> {
    let mut out = String::new();
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        if escaped {
            match c {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                '\'' => out.push('\''),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return Ok((out, i + c.len_utf8()));
        } else {
            out.push(c);
        }
    }
    Err(StructuralError::Unbalanced(snippet(text)).into())
}

/// Recognize `Identifier( ... )`, returning the identifier and the inner
/// argument span. Shape only — the caller decides whether the name is known.
fn split_call(fragment: &str) -> Option<(&str, &str)> {
    let open = fragment.find('(')?;
    let name = fragment[..open].trim_end();
    let mut chars = name.chars();
    let first = chars.next()?;
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$') {
        return None;
    }
    let args = fragment[open + 1..].strip_suffix(')')?;
    Some((name, args))
}

/// Clamp a fragment for error display. The result is a verbatim prefix of
/// the fragment so callers can still locate it in the original input.
fn snippet(text: &str) -> String {
    const MAX_CHARS: usize = 60;
    if text.chars().count() <= MAX_CHARS {
        text.to_string()
    } else {
        text.chars().take(MAX_CHARS).collect()
    }
}

/// 1-based line of the first occurrence of `fragment` in `text`.
fn line_of_fragment(text: &str, fragment: &str) -> Option<usize> {
    if fragment.is_empty() {
        return None;
    }
    let pos = text.find(fragment)?;
    Some(text[..pos].bytes().filter(|&b| b == b'\n').count() + 1)
}

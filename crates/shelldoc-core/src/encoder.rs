//! Shell-document serializer — renders a `Value` tree back to shell-style
//! text.
//!
//! The output is the editing surface's canonical formatting: objects and
//! arrays pretty-print at 2-space indent per depth, object keys are always
//! quoted, and constructor calls are emitted unquoted with single-line
//! arguments (re-quoting a call would turn it back into a plain string).
//!
//! The serializer is a *semantic* inverse of the parser, not a textual one:
//! `parse(serialize(v))` is structurally equal to `v`, but whitespace, quote
//! style, and key quoting are normalized rather than preserved.

use crate::types::Value;

/// Serialize a value as pretty-printed shell-document text.
pub fn serialize(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, 0, &mut out);
    out
}

fn write_value(value: &Value, depth: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(text) => out.push_str(text),
        Value::Str(s) => write_quoted(s, out),
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(depth + 1, out);
                write_value(item, depth + 1, out);
            }
            out.push('\n');
            push_indent(depth, out);
            out.push(']');
        }
        Value::Object(entries) if entries.is_empty() => out.push_str("{}"),
        Value::Object(entries) => {
            out.push_str("{\n");
            for (i, (key, child)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(depth + 1, out);
                write_quoted(key, out);
                out.push_str(": ");
                write_value(child, depth + 1, out);
            }
            out.push('\n');
            push_indent(depth, out);
            out.push('}');
        }
        Value::Call { name, args } => write_call(name, args, out),
    }
}

/// Constructor calls stay on one line: `Name(arg, arg)`.
fn write_call(name: &str, args: &[Value], out: &mut String) {
    out.push_str(name);
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_compact(arg, out);
    }
    out.push(')');
}

/// Single-line rendering used inside constructor argument lists.
fn write_compact(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_compact(item, out);
            }
            out.push(']');
        }
        Value::Object(entries) => {
            out.push('{');
            for (i, (key, child)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_quoted(key, out);
                out.push_str(": ");
                write_compact(child, out);
            }
            out.push('}');
        }
        Value::Call { name, args } => write_call(name, args, out),
        scalar => write_value(scalar, 0, out),
    }
}

/// Double-quoted with escapes for backslash, quote, and the common control
/// characters. Other characters pass through verbatim.
fn write_quoted(s: &str, out: &mut String) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

use super::ScriptValue;
use crate::machine::heap::{Heap, HeapObject, ObjectRef};
use compact_str::{format_compact, CompactString, ToCompactString};
use std::fmt::Write;

const WRITE_FMT_MSG: &str =
    "Encountered an error while attempting to write format string to buffer.";

/// Nesting deeper than this prints as `[Array]` or `[Object]`, as `console.log` does.
const INSPECT_DEPTH: usize = 2;

pub fn format_number(value: f64) -> CompactString {
    if value.is_nan() {
        "NaN".into()
    } else if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        text.into()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format_compact!("{}", value as i64)
    } else {
        value.to_compact_string()
    }
}

pub fn function_label(value: &ScriptValue) -> Option<CompactString> {
    match value {
        ScriptValue::Function(function) => Some(match function.proto.name {
            Some(ref name) => format_compact!("[Function: {name}]"),
            None => "[Function (anonymous)]".into(),
        }),
        ScriptValue::Native(native) => Some(format_compact!("[Function: {}]", native.get_name())),
        _ => None,
    }
}

/// Converts a value to a string the way string concatenation does.
pub fn to_display_string(value: &ScriptValue, heap: &Heap) -> CompactString {
    let mut visiting = Vec::new();
    let mut buffer = String::new();
    write_display_string(value, heap, &mut visiting, &mut buffer);
    buffer.into()
}

fn write_display_string(
    value: &ScriptValue,
    heap: &Heap,
    visiting: &mut Vec<ObjectRef>,
    buffer: &mut String,
) {
    match value {
        ScriptValue::Undefined => buffer.push_str("undefined"),
        ScriptValue::Null => buffer.push_str("null"),
        ScriptValue::Bool(value) => write!(buffer, "{value}").expect(WRITE_FMT_MSG),
        ScriptValue::Number(value) => buffer.push_str(&format_number(*value)),
        ScriptValue::String(value) => buffer.push_str(value),
        ScriptValue::Array(handle) => {
            if visiting.contains(handle) {
                return;
            }
            visiting.push(*handle);
            for (index, item) in heap.array(*handle).unwrap_or_default().iter().enumerate() {
                if index > 0 {
                    buffer.push(',');
                }
                if !item.is_nullish() {
                    write_display_string(item, heap, visiting, buffer);
                }
            }
            visiting.pop();
        }
        ScriptValue::Object(_) => buffer.push_str("[object Object]"),
        function => {
            if let Some(label) = function_label(function) {
                buffer.push_str(&label);
            }
        }
    }
}

/// Formats the arguments of a `console.log` call into one line.
pub fn format_console_arguments(arguments: &[ScriptValue], heap: &Heap) -> String {
    let mut buffer = String::new();
    for (index, argument) in arguments.iter().enumerate() {
        if index > 0 {
            buffer.push(' ');
        }
        match argument {
            ScriptValue::String(value) => buffer.push_str(value),
            value => buffer.push_str(&inspect(value, heap)),
        }
    }
    buffer
}

/// Renders a value as `console.log` shows a nested value.
pub fn inspect(value: &ScriptValue, heap: &Heap) -> String {
    let mut visiting = Vec::new();
    let mut buffer = String::new();
    write_inspected(value, heap, 0, &mut visiting, &mut buffer);
    buffer
}

fn write_key(key: &str, buffer: &mut String) {
    let is_identifier = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_identifier {
        buffer.push_str(key);
    } else {
        write_quoted(key, buffer);
    }
}

fn write_quoted(text: &str, buffer: &mut String) {
    buffer.push('\'');
    for c in text.chars() {
        match c {
            '\'' => buffer.push_str("\\'"),
            '\\' => buffer.push_str("\\\\"),
            '\n' => buffer.push_str("\\n"),
            '\t' => buffer.push_str("\\t"),
            c => buffer.push(c),
        }
    }
    buffer.push('\'');
}

fn write_inspected(
    value: &ScriptValue,
    heap: &Heap,
    depth: usize,
    visiting: &mut Vec<ObjectRef>,
    buffer: &mut String,
) {
    let handle = match value {
        ScriptValue::String(value) => {
            write_quoted(value, buffer);
            return;
        }
        ScriptValue::Array(handle) | ScriptValue::Object(handle) => *handle,
        value => {
            let text = function_label(value).unwrap_or_else(|| to_display_string(value, heap));
            buffer.push_str(&text);
            return;
        }
    };

    if visiting.contains(&handle) {
        buffer.push_str("[Circular]");
        return;
    }

    match heap.get(handle) {
        Some(HeapObject::Array(items)) => {
            if items.is_empty() {
                buffer.push_str("[]");
            } else if depth > INSPECT_DEPTH {
                buffer.push_str("[Array]");
            } else {
                visiting.push(handle);
                buffer.push_str("[ ");
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        buffer.push_str(", ");
                    }
                    write_inspected(item, heap, depth + 1, visiting, buffer);
                }
                buffer.push_str(" ]");
                visiting.pop();
            }
        }
        Some(HeapObject::Object(entries)) => {
            if entries.is_empty() {
                buffer.push_str("{}");
            } else if depth > INSPECT_DEPTH {
                buffer.push_str("[Object]");
            } else {
                visiting.push(handle);
                buffer.push_str("{ ");
                for (index, (key, item)) in entries.iter().enumerate() {
                    if index > 0 {
                        buffer.push_str(", ");
                    }
                    write_key(key, buffer);
                    buffer.push_str(": ");
                    write_inspected(item, heap, depth + 1, visiting, buffer);
                }
                buffer.push_str(" }");
                visiting.pop();
            }
        }
        None => buffer.push_str("[Dangling]"),
    }
}

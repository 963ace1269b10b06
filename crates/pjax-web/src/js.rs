//! JavaScript literal encoding for values embedded in inline scripts.

use serde_json::Value;

const RAW_PREFIX: &str = "js:";

/// Escapes a string for use inside a single- or double-quoted JS literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '<' if chars.peek() == Some(&'/') => out.push_str("<\\"),
            _ => out.push(c),
        }
    }
    out
}

/// Encodes a JSON value as a JavaScript expression.
///
/// Strings starting with `js:` are emitted verbatim (minus the prefix) so
/// callbacks can be passed through client options.
pub fn encode(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => match s.strip_prefix(RAW_PREFIX) {
            Some(raw) => raw.to_string(),
            None => format!("'{}'", quote(s)),
        },
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(encode).collect();
            format!("[{}]", parts.join(","))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("'{}':{}", quote(k), encode(v)))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
    }
}

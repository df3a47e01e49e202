//! Field-name case conversion between the wire format (PascalCase) and Rust (snake_case).

use serde_json::{Map, Value};

/// Key naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCase {
    /// PascalCase, as used by the service.
    Wire,
    /// snake_case, as used by this crate's models.
    Host,
}

impl KeyCase {
    pub fn convert(self, key: &str) -> String {
        match self {
            Self::Wire => to_wire_key(key),
            Self::Host => to_host_key(key),
        }
    }
}

/// `voice_id` -> `VoiceId`.
pub fn to_wire_key(key: &str) -> String {
    key.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// `VoiceId` -> `voice_id`, `OutputURI` -> `output_uri`, `SSMLMarks` -> `ssml_marks`.
///
/// A run of capitals is one word; its last capital opens the next word when a lowercase follows.
pub fn to_host_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let previous_upper = i > 0 && chars[i - 1].is_uppercase();
            // The last capital of an acronym run starts the next word: "SSMLMarks".
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if i > 0 && (!previous_upper || next_lower) {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Recursively convert every object key in `value`. String values are left alone.
pub fn convert_keys(value: Value, case: KeyCase) -> Value {
    match value {
        Value::Object(map) => Value::Object(convert_map(map, case)),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| convert_keys(item, case))
                .collect(),
        ),
        other => other,
    }
}

pub fn convert_map(map: Map<String, Value>, case: KeyCase) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (case.convert(&key), convert_keys(value, case)))
        .collect()
}

/// Convert a value whose top level may itself be a bare name.
///
/// With `ignore_string` set a top-level string is returned untouched, matching nested strings.
pub fn convert_case(value: Value, case: KeyCase, ignore_string: bool) -> Value {
    match value {
        Value::String(s) if !ignore_string => Value::String(case.convert(&s)),
        other => convert_keys(other, case),
    }
}

pub fn to_wire_case(value: Value) -> Value {
    convert_keys(value, KeyCase::Wire)
}

pub fn to_host_case(value: Value) -> Value {
    convert_keys(value, KeyCase::Host)
}

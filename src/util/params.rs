//! Call-time parameter merging.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{PollyError, Result};

/// Merge call-time arguments with instance defaults.
///
/// Only keys present in `call` are considered. A null call-time value falls back to the
/// default for the same key; keys that are still null are dropped. Nested objects, and
/// objects inside arrays, are merged the same way against the same defaults.
pub fn merge_params(call: Map<String, Value>, defaults: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = Map::new();
    for (key, value) in call {
        let value = match value {
            Value::Null => match defaults.get(&key) {
                Some(default) if !default.is_null() => default.clone(),
                _ => continue,
            },
            Value::Object(nested) => Value::Object(merge_params(nested, defaults)),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(nested) => Value::Object(merge_params(nested, defaults)),
                        other => other,
                    })
                    .collect(),
            ),
            other => other,
        };
        merged.insert(key, value);
    }
    merged
}

/// Serialize a request model into a parameter map, keeping unset fields as nulls.
pub fn to_param_map<T: Serialize>(request: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(request) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(PollyError::Parameter(format!(
            "Request parameters must serialize to an object, got {other}"
        ))),
        Err(e) => Err(PollyError::Parameter(format!(
            "Failed to serialize request parameters: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn call_value_wins_over_default() {
        let merged = merge_params(
            map(json!({"voice_id": "Matthew"})),
            &map(json!({"voice_id": "Joanna"})),
        );
        assert_eq!(Value::Object(merged), json!({"voice_id": "Matthew"}));
    }

    #[test]
    fn null_falls_back_and_absent_keys_are_dropped() {
        let merged = merge_params(
            map(json!({"voice_id": null, "sample_rate": null, "text": "hi"})),
            &map(json!({"voice_id": "Joanna", "sns_topic_arn": "arn:aws:sns:x"})),
        );
        assert_eq!(
            Value::Object(merged),
            json!({"voice_id": "Joanna", "text": "hi"})
        );
    }

    #[test]
    fn nested_objects_are_merged() {
        let merged = merge_params(
            map(json!({
                "settings": {"voice_id": null, "engine": "neural"},
                "items": [{"language_code": null}, "plain"]
            })),
            &map(json!({"voice_id": "Joanna", "language_code": "en-US"})),
        );
        assert_eq!(
            Value::Object(merged),
            json!({
                "settings": {"voice_id": "Joanna", "engine": "neural"},
                "items": [{"language_code": "en-US"}, "plain"]
            })
        );
    }

    #[test]
    fn false_is_a_value_not_an_absence() {
        let merged = merge_params(
            map(json!({"include_additional_language_codes": false})),
            &map(json!({"include_additional_language_codes": true})),
        );
        assert_eq!(
            Value::Object(merged),
            json!({"include_additional_language_codes": false})
        );
    }

    #[test]
    fn non_object_requests_are_rejected() {
        let err = to_param_map(&vec![1, 2]).unwrap_err();
        assert!(matches!(err, PollyError::Parameter(_)));
    }
}

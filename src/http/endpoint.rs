//! Operation descriptors and URL resolution.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use reqwest::Method;
use serde_json::{Map, Value};
use url::Url;

use crate::error::{PollyError, Result};
use crate::types::ContentType;

/// Request path of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Path {
    /// Used verbatim.
    Fixed(&'static str),
    /// Contains `{Name}` placeholders filled from the call's parameters.
    Template(&'static str),
}

impl Path {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed(path) | Self::Template(path) => path,
        }
    }
}

/// Static description of one REST operation.
#[derive(Debug, Clone)]
pub struct Operation {
    pub name: &'static str,
    pub method: Method,
    pub path: Path,
    /// Content types accepted on success.
    pub expected_content_types: &'static [ContentType],
    /// Success responses carry no meaningful body.
    pub no_body_on_success: bool,
    /// Extra parameters become query parameters even though the path has placeholders.
    pub query_params_allowed: bool,
    /// `(logical name, wire key)` pairs of result wrappers.
    pub result_keys: &'static [(&'static str, &'static str)],
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.name, self.method, self.path.as_str())
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{(.*?)\}").expect("valid placeholder pattern"))
}

impl Operation {
    /// Placeholder names of the path template, in order.
    pub fn placeholders(&self) -> Vec<&'static str> {
        match self.path {
            Path::Fixed(_) => Vec::new(),
            Path::Template(template) => placeholder_pattern()
                .captures_iter(template)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
                .collect(),
        }
    }

    /// Wire key wrapping the result for a logical name, e.g. `"lexicon"` -> `"Lexicon"`.
    pub fn result_key(&self, logical: &str) -> Option<&'static str> {
        self.result_keys
            .iter()
            .find(|(name, _)| *name == logical)
            .map(|(_, key)| *key)
    }

    pub fn expects(&self, content_type: ContentType) -> bool {
        self.expected_content_types.contains(&content_type)
    }

    /// Build the request URL from `base_url` and wire-case `params`.
    ///
    /// Parameters named after a placeholder fill the path; the rest become the query string.
    /// Fails before anything is sent when a value is null, a placeholder stays unfilled, or
    /// an extra parameter is given to an operation that does not take query parameters.
    pub fn resolve(&self, base_url: &str, params: &Map<String, Value>) -> Result<Url> {
        let placeholders = self.placeholders();
        let mut path_params: Vec<(&str, String)> = Vec::new();
        let mut query_params: Vec<(&str, String)> = Vec::new();

        for (key, value) in params {
            if value.is_null() {
                return Err(PollyError::Parameter(format!(
                    "Parameter \"{key}\" is unfilled for {}",
                    self.name
                )));
            }
            if placeholders.iter().any(|name| *name == key.as_str()) {
                path_params.push((key.as_str(), render_value(key, value)?));
            } else if self.query_params_allowed || placeholders.is_empty() {
                query_params.push((key.as_str(), render_value(key, value)?));
            } else {
                return Err(PollyError::Parameter(format!(
                    "Unexpected parameter \"{key}\" for {}, allowed parameters: {placeholders:?}",
                    self.name
                )));
            }
        }

        let filled = |name: &str| path_params.iter().any(|(key, _)| *key == name);
        if let Some(missing) = placeholders.iter().copied().find(|name| !filled(name)) {
            return Err(PollyError::Parameter(format!(
                "Parameter \"{missing}\" is required by {} ({})",
                self.name,
                self.path.as_str()
            )));
        }

        let mut url = Url::parse(base_url)
            .map_err(|e| PollyError::Configuration(format!("Invalid base URL '{base_url}': {e}")))?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                PollyError::Configuration(format!("Base URL '{base_url}' cannot carry a path"))
            })?;
            segments.pop_if_empty();
            for segment in self.path.as_str().split('/').filter(|s| !s.is_empty()) {
                match placeholder_name(segment) {
                    Some(name) => {
                        let value = path_params
                            .iter()
                            .find(|(key, _)| *key == name)
                            .map(|(_, value)| value.as_str())
                            .unwrap_or_default();
                        segments.push(value);
                    }
                    None => {
                        segments.push(segment);
                    }
                }
            }
        }

        if !query_params.is_empty() {
            url.query_pairs_mut().extend_pairs(query_params);
        }

        Ok(url)
    }
}

fn placeholder_name(segment: &str) -> Option<&str> {
    segment.strip_prefix('{').and_then(|s| s.strip_suffix('}'))
}

fn render_value(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Array(_) | Value::Object(_) | Value::Null => Err(PollyError::Parameter(
                    format!("Parameter \"{key}\" must be a list of plain values"),
                )),
                other => render_value(key, other),
            })
            .collect::<Result<Vec<_>>>()
            .map(|parts| parts.join(",")),
        Value::Object(_) => Err(PollyError::Parameter(format!(
            "Parameter \"{key}\" cannot be sent in a URL"
        ))),
        Value::Null => Err(PollyError::Parameter(format!(
            "Parameter \"{key}\" is unfilled"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GET_THING: Operation = Operation {
        name: "GetThing",
        method: Method::GET,
        path: Path::Template("/v1/things/{ThingName}"),
        expected_content_types: &[ContentType::ApplicationJson],
        no_body_on_success: false,
        query_params_allowed: false,
        result_keys: &[("thing", "Thing")],
    };

    const LIST_THINGS: Operation = Operation {
        name: "ListThings",
        method: Method::GET,
        path: Path::Fixed("/v1/things"),
        expected_content_types: &[ContentType::ApplicationJson],
        no_body_on_success: false,
        query_params_allowed: false,
        result_keys: &[],
    };

    const BASE: &str = "https://polly.eu-central-1.amazonaws.com";

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn fills_template_and_encodes_segments() {
        let url = GET_THING
            .resolve(BASE, &params(json!({"ThingName": "my lexicon/1"})))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://polly.eu-central-1.amazonaws.com/v1/things/my%20lexicon%2F1"
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let p = params(json!({"Engine": "neural", "LanguageCode": "en-US"}));
        let first = LIST_THINGS.resolve(BASE, &p).unwrap();
        let second = LIST_THINGS.resolve(BASE, &p).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.path(), "/v1/things");
        assert_eq!(first.query(), Some("Engine=neural&LanguageCode=en-US"));
    }

    #[test]
    fn missing_placeholder_fails() {
        let result = GET_THING.resolve(BASE, &Map::new());
        assert!(matches!(result, Err(PollyError::Parameter(msg)) if msg.contains("ThingName")));
    }

    #[test]
    fn extra_parameter_on_closed_template_fails() {
        let result = GET_THING.resolve(
            BASE,
            &params(json!({"ThingName": "a", "NextToken": "b"})),
        );
        assert!(matches!(result, Err(PollyError::Parameter(msg)) if msg.contains("NextToken")));
    }

    #[test]
    fn null_values_are_rejected() {
        let result = LIST_THINGS.resolve(BASE, &params(json!({"NextToken": null})));
        assert!(matches!(result, Err(PollyError::Parameter(_))));
    }

    #[test]
    fn open_template_accepts_query_parameters() {
        let open = Operation {
            query_params_allowed: true,
            ..GET_THING
        };
        let url = open
            .resolve(BASE, &params(json!({"ThingName": "a", "Verbose": true, "Ids": [1, 2]})))
            .unwrap();
        assert_eq!(url.query(), Some("Ids=1%2C2&Verbose=true"));
    }

    #[test]
    fn base_url_path_prefix_is_kept() {
        let url = LIST_THINGS
            .resolve("http://127.0.0.1:9000/proxy/", &Map::new())
            .unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/proxy/v1/things");
        assert_eq!(GET_THING.result_key("thing"), Some("Thing"));
    }
}

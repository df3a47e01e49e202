#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use polly_client::config::{Credentials, PollyConfig};
use polly_client::error::Result;
use polly_client::http::{HttpRequest, RawResponse, Transport};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

pub fn test_config() -> PollyConfig {
    PollyConfig::new("eu-central-1").with_credentials(Credentials::new("AKID", "SECRET"))
}

pub fn mock_config(uri: &str) -> PollyConfig {
    test_config().with_endpoint(uri)
}

/// In-memory lexicon service that echoes stored state back.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    lexicons: Arc<Mutex<BTreeMap<String, String>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn json(status: StatusCode, body: Value) -> RawResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        RawResponse::from_bytes(status, headers, body.to_string())
    }

    fn not_found(name: &str) -> RawResponse {
        let mut response = Self::json(
            StatusCode::NOT_FOUND,
            json!({"message": format!("Lexicon not found: {name}")}),
        );
        response.headers.insert(
            "x-amzn-errortype",
            HeaderValue::from_static("LexiconNotFoundException:http://internal.amazon.com/coral/com.amazonaws.tts/"),
        );
        response
    }

    fn attributes(content: &str) -> Value {
        json!({
            "Alphabet": "ipa",
            "LanguageCode": "en-US",
            "LastModified": 1_554_397_516.0,
            "LexemesCount": content.matches("<lexeme>").count(),
            "LexiconArn": "arn:aws:polly:eu-central-1:123456789012:lexicon/test",
            "Size": content.len(),
        })
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let segments: Vec<String> = request
            .url
            .path_segments()
            .map(|segments| segments.map(str::to_string).collect())
            .unwrap_or_default();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let mut lexicons = self.lexicons.lock().unwrap();

        let method = request.method.clone();
        let response = match segments.as_slice() {
            ["v1", "lexicons", name] if method == Method::PUT => {
                let body: Value = serde_json::from_slice(request.body.as_deref().unwrap_or(&b"{}"[..]))
                    .unwrap_or(Value::Null);
                let content = body["Content"].as_str().unwrap_or_default().to_string();
                lexicons.insert(name.to_string(), content);
                RawResponse::from_bytes(StatusCode::OK, HeaderMap::new(), "")
            }
            ["v1", "lexicons", name] if method == Method::GET => match lexicons.get(*name) {
                Some(content) => Self::json(
                    StatusCode::OK,
                    json!({
                        "Lexicon": {"Content": content, "Name": name},
                        "LexiconAttributes": Self::attributes(content),
                    }),
                ),
                None => Self::not_found(name),
            },
            ["v1", "lexicons", name] if method == Method::DELETE => match lexicons.remove(*name) {
                Some(_) => RawResponse::from_bytes(StatusCode::OK, HeaderMap::new(), ""),
                None => Self::not_found(name),
            },
            ["v1", "lexicons"] if method == Method::GET => {
                let entries: Vec<Value> = lexicons
                    .iter()
                    .map(|(name, content)| {
                        json!({"Name": name, "Attributes": Self::attributes(content)})
                    })
                    .collect();
                Self::json(StatusCode::OK, json!({"Lexicons": entries}))
            }
            _ => Self::json(
                StatusCode::BAD_REQUEST,
                json!({"message": "unsupported route"}),
            ),
        };
        Ok(response)
    }
}

pub const PYTHON_ML_LEXICON: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<lexicon version="1.0" xmlns="http://www.w3.org/2005/01/pronunciation-lexicon" alphabet="ipa" xml:lang="en-US">
  <lexeme>
    <grapheme>ML</grapheme>
    <alias>machine learning</alias>
  </lexeme>
</lexicon>"#;

//! Response body decoding, driven by the `Content-Type` header.

use std::fmt;

use bytes::Bytes;
use serde_json::Value;

use super::transport::{BodyStream, RawResponse};
use crate::error::{PollyError, Result};
use crate::types::normalize_mime;
use crate::util::case::to_host_case;

/// A decoded response body.
pub enum Decoded {
    /// JSON document with snake_case keys.
    Json(Value),
    /// Newline-delimited JSON records, keys untouched.
    Records(Vec<Value>),
    Bytes(Bytes),
    /// Audio left unread.
    Stream(BodyStream),
    Text(String),
    /// Nothing to decode, or decoding was skipped.
    Empty,
}

impl fmt::Debug for Decoded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Records(records) => f.debug_tuple("Records").field(&records.len()).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Empty => f.write_str("Empty"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    JsonLines,
    Binary,
    Other,
}

fn body_kind(mime: Option<&str>) -> BodyKind {
    match mime {
        Some("application/json") => BodyKind::Json,
        Some(m) if m.starts_with("application/x-amz-json") => BodyKind::Json,
        Some("application/x-json-stream" | "audio/json") => BodyKind::JsonLines,
        Some(m) if m.starts_with("audio/") || m == "application/octet-stream" => {
            BodyKind::Binary
        }
        _ => BodyKind::Other,
    }
}

/// Whether a raw `Content-Type` header carries a single JSON document
/// (`application/json` or any `application/x-amz-json-*` version).
pub fn is_json(content_type: Option<&str>) -> bool {
    let mime = content_type.and_then(normalize_mime);
    body_kind(mime.as_deref()) == BodyKind::Json
}

/// Decode `response` according to its content type.
///
/// With `stream_audio` set, binary bodies are returned unread as [`Decoded::Stream`].
pub async fn decode(response: RawResponse, url: &str, stream_audio: bool) -> Result<Decoded> {
    let mime = response.content_type().and_then(normalize_mime);
    let kind = body_kind(mime.as_deref());
    tracing::debug!(url, content_type = ?mime, ?kind, "Decoding response");

    if kind == BodyKind::Binary && stream_audio {
        return Ok(Decoded::Stream(response.into_body()));
    }

    let body = response.bytes().await?;
    if body.is_empty() && kind != BodyKind::Binary {
        return Ok(Decoded::Empty);
    }

    match kind {
        BodyKind::Json => {
            let value: Value =
                serde_json::from_slice(&body).map_err(|source| decode_error(url, &body, source))?;
            Ok(Decoded::Json(to_host_case(value)))
        }
        BodyKind::JsonLines => decode_lines(&body, url).map(Decoded::Records),
        BodyKind::Binary => Ok(Decoded::Bytes(body)),
        BodyKind::Other => match String::from_utf8(body.to_vec()) {
            Ok(text) => Ok(Decoded::Text(text)),
            Err(_) => Ok(Decoded::Bytes(body)),
        },
    }
}

/// Split on `\n`, dropping the empty segment after a trailing newline.
pub fn decode_lines(body: &[u8], url: &str) -> Result<Vec<Value>> {
    let mut lines: Vec<&[u8]> = body.split(|byte| *byte == b'\n').collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
        .into_iter()
        .map(|line| serde_json::from_slice(line).map_err(|source| decode_error(url, line, source)))
        .collect()
}

fn decode_error(url: &str, body: &[u8], source: serde_json::Error) -> PollyError {
    PollyError::Decode {
        url: url.to_string(),
        body: String::from_utf8_lossy(body).into_owned(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use reqwest::StatusCode;
    use serde_json::json;

    const URL: &str = "https://polly.eu-central-1.amazonaws.com/v1/speech";

    fn response(content_type: &str, body: &'static [u8]) -> RawResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        RawResponse::from_bytes(StatusCode::OK, headers, body)
    }

    #[test]
    fn json_detection_covers_amz_json_versions() {
        assert!(is_json(Some("application/json")));
        assert!(is_json(Some("application/x-amz-json-1.1")));
        assert!(is_json(Some("Application/X-Amz-Json-1.0; charset=utf-8")));
        assert!(!is_json(Some("application/x-json-stream")));
        assert!(!is_json(Some("text/plain")));
        assert!(!is_json(None));
    }

    #[tokio::test]
    async fn json_keys_are_converted() {
        let decoded = decode(
            response(
                "application/json; charset=utf-8",
                br#"{"Voices":[{"LanguageCode":"en-US"}],"NextToken":null}"#,
            ),
            URL,
            false,
        )
        .await
        .unwrap();

        match decoded {
            Decoded::Json(value) => assert_eq!(
                value,
                json!({"voices": [{"language_code": "en-US"}], "next_token": null})
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn ndjson_trailing_newline_is_not_a_record() {
        let decoded = decode(
            response(
                "application/x-json-stream",
                b"{\"time\":1,\"type\":\"word\",\"value\":\"hi\"}\n{\"time\":2,\"type\":\"word\",\"value\":\"there\"}\n",
            ),
            URL,
            false,
        )
        .await
        .unwrap();

        match decoded {
            Decoded::Records(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[1]["value"], json!("there"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn audio_is_buffered_or_streamed() {
        let buffered = decode(response("audio/mpeg", b"ID3"), URL, false)
            .await
            .unwrap();
        assert!(matches!(buffered, Decoded::Bytes(ref b) if b.as_ref() == b"ID3"));

        let streamed = decode(response("audio/ogg", b"OggS"), URL, true)
            .await
            .unwrap();
        assert!(matches!(streamed, Decoded::Stream(_)));
    }

    #[tokio::test]
    async fn other_types_fall_back_to_text() {
        let decoded = decode(response("text/html", b"<h1>oops</h1>"), URL, false)
            .await
            .unwrap();
        assert!(matches!(decoded, Decoded::Text(ref t) if t == "<h1>oops</h1>"));
    }

    #[tokio::test]
    async fn malformed_json_keeps_raw_text() {
        let error = decode(response("application/json", b"{not json"), URL, false)
            .await
            .unwrap_err();
        match error {
            PollyError::Decode { body, url, .. } => {
                assert_eq!(body, "{not json");
                assert_eq!(url, URL);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}

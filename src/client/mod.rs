//! The Polly client.
//!
//! Every operation follows the same path: merge call parameters with instance defaults,
//! resolve the URL, sign, send, then decode the body by content type or classify the error.

pub mod operations;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use self::operations::{
    DELETE_LEXICON, DESCRIBE_VOICES, GET_LEXICON, GET_SYNTHESIS_TASK, LIST_LEXICONS,
    LIST_SYNTHESIS_TASKS, PUT_LEXICON, START_SYNTHESIS_TASK, SYNTHESIZE_SPEECH,
};
use crate::config::{CredentialsCache, CredentialsChain, ParamDefaults, PollyConfig};
use crate::convert::{AudioConverter, ConvertParams};
use crate::error::{classify, ErrorResponse, PollyError, Result};
use crate::http::{
    decode, is_json, Decoded, HttpRequest, Operation, RequestSigner, ReqwestTransport, Transport,
};
use crate::types::{
    AudioFormat, ContentType, DescribeVoicesRequest, Lexicon, LexiconContent, LexiconsList,
    ListSynthesisTasksRequest, Speech, SpeechMarksList, SpeechParams, SpeechStream,
    StartSynthesisTaskRequest, Synthesis, SynthesisTask, SynthesisTasksList,
    SynthesizeSpeechRequest, VoicesList,
};
use crate::util::case::{convert_map, to_host_key, KeyCase};
use crate::util::params::{merge_params, to_param_map};

/// Response header carrying the service's error type.
pub const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";
/// Response header carrying the number of billed input characters.
pub const REQUEST_CHARACTERS_HEADER: &str = "x-amzn-requestcharacters";

/// Async client for the Polly REST API.
///
/// Cheap to clone; clones share the connection pool. Concurrent calls share no mutable state.
///
/// # Example
/// ```no_run
/// use polly_client::prelude::*;
///
/// # async fn example() -> polly_client::error::Result<()> {
/// let polly = Polly::new(PollyConfig::new("eu-central-1"))?;
/// let speech = polly
///     .synthesize_speech(
///         SynthesizeSpeechRequest::builder()
///             .text("Hello!")
///             .voice_id("Joanna")
///             .output_format(AudioFormat::Mp3)
///             .build(),
///     )
///     .await?;
/// # let _ = speech;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Polly {
    inner: Arc<PollyInner>,
}

#[derive(Clone)]
struct PollyInner {
    base_url: String,
    region: String,
    defaults: ParamDefaults,
    credentials: Arc<CredentialsCache>,
    transport: Arc<dyn Transport>,
    converter: Option<Arc<dyn AudioConverter>>,
}

impl fmt::Debug for Polly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polly")
            .field("base_url", &self.inner.base_url)
            .field("region", &self.inner.region)
            .field("defaults", &self.inner.defaults)
            .field("converter", &self.inner.converter.as_ref().map(|_| ".."))
            .finish()
    }
}

/// One dispatch: wire-case URL parameters and an optional wire-case JSON body.
struct Call {
    params: Map<String, Value>,
    payload: Option<Value>,
    stream_audio: bool,
}

impl Call {
    fn query(params: Map<String, Value>) -> Self {
        Self {
            params,
            payload: None,
            stream_audio: false,
        }
    }

    fn with_payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = Some(Value::Object(payload));
        self
    }
}

/// A successful response.
struct Reply {
    url: String,
    headers: HeaderMap,
    content_type: Option<ContentType>,
    decoded: Decoded,
}

impl Polly {
    /// Build a client with the default `reqwest` transport.
    pub fn new(config: PollyConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Self::with_transport(config, transport)
    }

    /// Build a client from environment configuration.
    pub fn from_env() -> Result<Self> {
        Self::new(PollyConfig::from_env()?)
    }

    /// Build a client and resolve its credentials up front, so a missing or broken
    /// credential source fails here rather than on the first call.
    pub async fn connect(config: PollyConfig) -> Result<Self> {
        let polly = Self::new(config)?;
        polly.inner.credentials.get().await?;
        Ok(polly)
    }

    /// Build a client that sends requests through `transport`.
    ///
    /// Credentials come from [`PollyConfig::credentials_chain`] and are resolved on first use.
    pub fn with_transport(config: PollyConfig, transport: impl Transport + 'static) -> Result<Self> {
        debug!(region = %config.region, base_url = %config.base_url(), "Creating Polly client");
        Ok(Self {
            inner: Arc::new(PollyInner {
                base_url: config.base_url(),
                credentials: Arc::new(CredentialsCache::new(config.credentials_chain())),
                region: config.region,
                defaults: config.defaults,
                transport: Arc::new(transport),
                converter: None,
            }),
        })
    }

    /// Replace the credential sources.
    pub fn with_credentials_chain(self, chain: CredentialsChain) -> Self {
        let mut inner = Arc::try_unwrap(self.inner).unwrap_or_else(|shared| (*shared).clone());
        inner.credentials = Arc::new(CredentialsCache::new(chain));
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Attach an audio converter used by synthesis calls and [`Polly::convert`].
    pub fn with_converter(self, converter: impl AudioConverter + 'static) -> Self {
        let mut inner = Arc::try_unwrap(self.inner).unwrap_or_else(|shared| (*shared).clone());
        inner.converter = Some(Arc::new(converter));
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn region(&self) -> &str {
        &self.inner.region
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn defaults(&self) -> &ParamDefaults {
        &self.inner.defaults
    }

    pub fn has_converter(&self) -> bool {
        self.inner.converter.is_some()
    }

    /// Run a call under a caller-chosen deadline.
    pub async fn with_deadline<T>(
        deadline: Duration,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        crate::util::timeout::with_deadline(deadline, call).await
    }

    // ---- Lexicons ----

    pub async fn delete_lexicon(&self, name: &str) -> Result<()> {
        self.execute(&DELETE_LEXICON, Call::query(lexicon_params(name)))
            .await?;
        Ok(())
    }

    /// Store a lexicon, replacing any lexicon with the same name.
    pub async fn put_lexicon(&self, name: &str, content: impl Into<LexiconContent>) -> Result<()> {
        let xml = content.into().into_xml()?;
        let mut payload = Map::new();
        payload.insert("Content".to_string(), Value::String(xml));
        self.execute(
            &PUT_LEXICON,
            Call::query(lexicon_params(name)).with_payload(payload),
        )
        .await?;
        Ok(())
    }

    /// Fetch a lexicon with its content and attributes.
    pub async fn get_lexicon(&self, name: &str) -> Result<Lexicon> {
        let reply = self
            .execute(&GET_LEXICON, Call::query(lexicon_params(name)))
            .await?;
        let mut body = json_body(&GET_LEXICON, reply)?;

        let mut lexicon = match take_result(&GET_LEXICON, &mut body, "lexicon")? {
            Value::Object(map) => map,
            other => {
                return Err(PollyError::missing(
                    GET_LEXICON.name,
                    format!("lexicon object, got {other}"),
                ))
            }
        };
        if let Ok(attributes) = take_result(&GET_LEXICON, &mut body, "attributes") {
            lexicon.insert("attributes".to_string(), attributes);
        }
        from_model(&GET_LEXICON, Value::Object(lexicon))
    }

    /// One page of stored lexicons.
    pub async fn list_lexicons(&self, next_token: Option<&str>) -> Result<LexiconsList> {
        let mut params = Map::new();
        if let Some(token) = next_token {
            params.insert("NextToken".to_string(), Value::String(token.to_string()));
        }
        let reply = self.execute(&LIST_LEXICONS, Call::query(params)).await?;
        from_model(&LIST_LEXICONS, json_body(&LIST_LEXICONS, reply)?)
    }

    // ---- Voices ----

    pub async fn describe_voices(&self, request: DescribeVoicesRequest) -> Result<VoicesList> {
        let params = self.merged(&request, true)?;
        let reply = self
            .execute(&DESCRIBE_VOICES, Call::query(to_wire(params)))
            .await?;
        from_model(&DESCRIBE_VOICES, json_body(&DESCRIBE_VOICES, reply)?)
    }

    // ---- Speech ----

    /// Synthesize speech, or speech marks when the output format is `json`.
    ///
    /// Audio is converted with the client's converter when the request asks for it, or when
    /// the converter converts by default and the request does not opt out. Conversion
    /// options without a converter fail before anything is sent.
    pub async fn synthesize_speech(&self, request: SynthesizeSpeechRequest) -> Result<Synthesis> {
        let converter = self.converter_for(request.auto_convert, &request.convert_params)?;
        let params = self.merged(&request, true)?;

        let reply = self
            .execute(
                &SYNTHESIZE_SPEECH,
                Call::query(Map::new()).with_payload(to_wire(params.clone())),
            )
            .await?;

        match reply.decoded {
            Decoded::Records(records) => SpeechMarksList::from_records(records)
                .map(Synthesis::Marks)
                .map_err(|e| PollyError::model(SYNTHESIZE_SPEECH.name, e)),
            Decoded::Bytes(audio) => {
                let speech = Speech {
                    content_type: reply
                        .content_type
                        .unwrap_or(ContentType::OctetStream),
                    request_characters: request_characters(&reply.headers)?,
                    audio,
                    params: speech_params(params)?,
                    converted: false,
                    converted_audio: None,
                    conversion: None,
                };
                match converter {
                    Some(converter) => {
                        debug!(voice = %speech.params.voice_id, "Converting synthesized speech");
                        converter
                            .convert(speech, &request.convert_params)
                            .await
                            .map(Synthesis::Audio)
                    }
                    None => Ok(Synthesis::Audio(speech)),
                }
            }
            other => {
                warn!(url = %reply.url, body = ?other, "Synthesis returned no audio");
                Err(PollyError::missing(SYNTHESIZE_SPEECH.name, "audio body"))
            }
        }
    }

    /// Synthesize speech and hand back the audio body unread.
    ///
    /// Speech marks cannot be streamed, and streamed audio is never converted.
    pub async fn synthesize_speech_stream(
        &self,
        request: SynthesizeSpeechRequest,
    ) -> Result<SpeechStream> {
        if request.auto_convert == Some(true) || !request.convert_params.is_empty() {
            return Err(PollyError::Configuration(
                "Streamed speech cannot be converted; use synthesize_speech instead".to_string(),
            ));
        }
        let params = self.merged(&request, true)?;
        if params.get("output_format") == Some(&json!(AudioFormat::Json.to_string())) {
            return Err(PollyError::Parameter(
                "Speech marks cannot be streamed; use synthesize_speech instead".to_string(),
            ));
        }

        let mut call = Call::query(Map::new()).with_payload(to_wire(params.clone()));
        call.stream_audio = true;
        let reply = self.execute(&SYNTHESIZE_SPEECH, call).await?;

        match reply.decoded {
            Decoded::Stream(body) => Ok(SpeechStream {
                content_type: reply
                    .content_type
                    .unwrap_or(ContentType::OctetStream),
                request_characters: request_characters(&reply.headers)?,
                params: speech_params(params)?,
                body,
            }),
            other => Err(PollyError::UnexpectedResponseType {
                url: reply.url,
                content_type: reply
                    .content_type
                    .map(|ct| ct.as_mime().to_string())
                    .unwrap_or_default(),
                expected: "an audio stream".to_string(),
                body: format!("{other:?}"),
            }),
        }
    }

    /// Run several synthesis requests concurrently.
    ///
    /// Returns one result per request, in input order. A failed request does not cancel the
    /// others.
    pub async fn synthesize_many(
        &self,
        requests: Vec<SynthesizeSpeechRequest>,
    ) -> Vec<Result<Synthesis>> {
        debug!(count = requests.len(), "Synthesizing concurrently");
        join_all(
            requests
                .into_iter()
                .map(|request| self.synthesize_speech(request)),
        )
        .await
    }

    /// Convert speech with the client's converter.
    pub async fn convert(&self, speech: Speech, params: &ConvertParams) -> Result<Speech> {
        let converter = self.inner.converter.as_ref().ok_or_else(|| {
            PollyError::Configuration(
                "No audio converter configured; attach one with Polly::with_converter".to_string(),
            )
        })?;
        converter.convert(speech, params).await
    }

    // ---- Synthesis tasks ----

    /// Start an asynchronous synthesis task writing to S3.
    pub async fn start_speech_synthesis_task(
        &self,
        request: StartSynthesisTaskRequest,
    ) -> Result<SynthesisTask> {
        let params = self.merged(&request, true)?;
        let reply = self
            .execute(
                &START_SYNTHESIS_TASK,
                Call::query(Map::new()).with_payload(to_wire(params)),
            )
            .await?;
        let mut body = json_body(&START_SYNTHESIS_TASK, reply)?;
        let task = take_result(&START_SYNTHESIS_TASK, &mut body, "task")?;
        from_model(&START_SYNTHESIS_TASK, task)
    }

    pub async fn get_speech_synthesis_task(&self, task_id: &str) -> Result<SynthesisTask> {
        let mut params = Map::new();
        params.insert("TaskId".to_string(), Value::String(task_id.to_string()));
        let reply = self
            .execute(&GET_SYNTHESIS_TASK, Call::query(params))
            .await?;
        let mut body = json_body(&GET_SYNTHESIS_TASK, reply)?;
        let task = take_result(&GET_SYNTHESIS_TASK, &mut body, "task")?;
        from_model(&GET_SYNTHESIS_TASK, task)
    }

    pub async fn list_speech_synthesis_tasks(
        &self,
        request: ListSynthesisTasksRequest,
    ) -> Result<SynthesisTasksList> {
        let params = self.merged(&request, false)?;
        let reply = self
            .execute(&LIST_SYNTHESIS_TASKS, Call::query(to_wire(params)))
            .await?;
        from_model(&LIST_SYNTHESIS_TASKS, json_body(&LIST_SYNTHESIS_TASKS, reply)?)
    }

    // ---- Internals ----

    /// Serialize a request and merge it with the instance defaults (when `use_defaults`).
    fn merged<T: Serialize>(&self, request: &T, use_defaults: bool) -> Result<Map<String, Value>> {
        let call = to_param_map(request)?;
        let empty = Map::new();
        let defaults = if use_defaults {
            self.inner.defaults.as_map()
        } else {
            &empty
        };
        Ok(merge_params(call, defaults))
    }

    fn converter_for(
        &self,
        auto_convert: Option<bool>,
        params: &ConvertParams,
    ) -> Result<Option<Arc<dyn AudioConverter>>> {
        match &self.inner.converter {
            Some(converter) => {
                let convert = auto_convert == Some(true)
                    || (converter.auto_convert() && auto_convert != Some(false));
                Ok(convert.then(|| Arc::clone(converter)))
            }
            None if auto_convert == Some(true) || !params.is_empty() => {
                Err(PollyError::Configuration(
                    "Audio conversion was requested but no converter is configured; attach one with Polly::with_converter"
                        .to_string(),
                ))
            }
            None => Ok(None),
        }
    }

    async fn execute(&self, operation: &'static Operation, call: Call) -> Result<Reply> {
        let url = operation.resolve(&self.inner.base_url, &call.params)?;
        let body = call
            .payload
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| PollyError::Parameter(format!("Failed to serialize payload: {e}")))?;

        let mut headers = HeaderMap::new();
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        let credentials = self.inner.credentials.get().await?;
        let signed = RequestSigner::new(&credentials, self.inner.region.as_str()).sign(
            &operation.method,
            &url,
            &headers,
            body.as_deref(),
        )?;
        headers.extend(signed);

        let url_text = url.to_string();
        let payload_text = call.payload.as_ref().map(Value::to_string);
        debug!(
            operation = operation.name,
            method = %operation.method,
            url = %url_text,
            payload = payload_text.as_deref().unwrap_or(""),
            "Sending request"
        );

        let response = self
            .inner
            .transport
            .send(HttpRequest {
                method: operation.method.clone(),
                url,
                headers,
                body,
            })
            .await?;

        let status = response.status;
        debug!(operation = operation.name, status = status.as_u16(), "Received response");

        if !status.is_success() {
            let error_type = response.header(ERROR_TYPE_HEADER).map(str::to_string);
            let json = is_json(response.content_type());
            let raw = response.bytes().await?;
            let raw = String::from_utf8_lossy(&raw).into_owned();
            let message = if json { error_message(&raw) } else { None };

            let error = classify(&ErrorResponse {
                status: status.as_u16(),
                error_type: error_type.as_deref(),
                message: message.as_deref(),
                raw: Some(raw.as_str()).filter(|r| !r.is_empty()),
                url: &url_text,
                payload: payload_text.as_deref(),
            });
            debug!(operation = operation.name, kind = %error.kind, "Request failed");
            return Err(error.into());
        }

        let headers = response.headers.clone();
        let content_type = response.content_type().and_then(ContentType::from_header);

        if operation.no_body_on_success {
            return Ok(Reply {
                url: url_text,
                headers,
                content_type,
                decoded: Decoded::Empty,
            });
        }

        let raw_content_type = response.content_type().unwrap_or_default().to_string();
        let decoded = decode(response, &url_text, call.stream_audio).await?;

        if !content_type.is_some_and(|ct| operation.expects(ct)) {
            warn!(
                operation = operation.name,
                content_type = %raw_content_type,
                "Unexpected response content type"
            );
            return Err(PollyError::UnexpectedResponseType {
                url: url_text,
                content_type: raw_content_type,
                expected: operation
                    .expected_content_types
                    .iter()
                    .map(|ct| ct.as_mime())
                    .collect::<Vec<_>>()
                    .join(", "),
                body: describe_body(decoded),
            });
        }

        Ok(Reply {
            url: url_text,
            headers,
            content_type,
            decoded,
        })
    }
}

fn lexicon_params(name: &str) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("LexiconName".to_string(), Value::String(name.to_string()));
    params
}

fn to_wire(params: Map<String, Value>) -> Map<String, Value> {
    convert_map(params, KeyCase::Wire)
}

fn json_body(operation: &Operation, reply: Reply) -> Result<Value> {
    match reply.decoded {
        Decoded::Json(value) => Ok(value),
        Decoded::Empty => Ok(Value::Object(Map::new())),
        other => Err(PollyError::missing(
            operation.name,
            format!("JSON body, got {other:?}"),
        )),
    }
}

/// Remove and return the wrapped result for `logical` from a host-case body.
fn take_result(operation: &'static Operation, body: &mut Value, logical: &str) -> Result<Value> {
    let wire_key = operation
        .result_key(logical)
        .ok_or_else(|| PollyError::missing(operation.name, format!("result key '{logical}'")))?;
    body.as_object_mut()
        .and_then(|map| map.remove(&to_host_key(wire_key)))
        .filter(|value| !value.is_null())
        .ok_or_else(|| PollyError::missing(operation.name, format!("field '{wire_key}'")))
}

fn from_model<T: DeserializeOwned>(operation: &'static Operation, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| PollyError::model(operation.name, e))
}

fn speech_params(params: Map<String, Value>) -> Result<SpeechParams> {
    from_model(&SYNTHESIZE_SPEECH, Value::Object(params))
}

fn request_characters(headers: &HeaderMap) -> Result<u64> {
    headers
        .get(REQUEST_CHARACTERS_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| {
            PollyError::missing(
                SYNTHESIZE_SPEECH.name,
                "x-amzn-RequestCharacters header",
            )
        })
}

/// `message` of a JSON error body, in any key case.
fn error_message(raw: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let map = value.as_object()?;
    map.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("message"))
        .and_then(|(_, value)| value.as_str())
        .map(str::to_string)
}

fn describe_body(decoded: Decoded) -> String {
    match decoded {
        Decoded::Json(value) => value.to_string(),
        Decoded::Records(records) => records
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        Decoded::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Decoded::Text(text) => text,
        Decoded::Stream(_) => "<unread stream>".to_string(),
        Decoded::Empty => String::new(),
    }
}

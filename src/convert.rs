//! Pluggable audio conversion.
//!
//! The client does not transcode audio itself. An [`AudioConverter`] can be attached to a
//! [`Polly`](crate::client::Polly) client; synthesis calls then hand it the synthesized
//! speech together with the call's [`ConvertParams`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::types::Speech;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvertParams {
    /// Target format, e.g. `opus`.
    pub to_format: Option<String>,
    /// Target bitrate in kbit/s.
    pub out_bitrate: Option<u32>,
    /// Converter-specific options.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConvertParams {
    pub fn new(to_format: impl Into<String>) -> Self {
        Self {
            to_format: Some(to_format.into()),
            ..Self::default()
        }
    }

    pub fn with_bitrate(mut self, out_bitrate: u32) -> Self {
        self.out_bitrate = Some(out_bitrate);
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.to_format.is_none() && self.out_bitrate.is_none() && self.extra.is_empty()
    }
}

/// Details of a finished conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub to_format: String,
    pub out_bitrate: Option<u32>,
    pub duration_seconds: Option<f64>,
    /// Free-form converter output.
    pub info: Option<Value>,
}

impl Conversion {
    /// File extension of the converted audio.
    pub fn extension(&self) -> &str {
        &self.to_format
    }
}

#[async_trait]
pub trait AudioConverter: Send + Sync {
    /// Whether synthesis calls convert by default when they do not say otherwise.
    fn auto_convert(&self) -> bool {
        false
    }

    /// Convert `speech`, usually by calling [`Speech::with_conversion`].
    async fn convert(&self, speech: Speech, params: &ConvertParams) -> Result<Speech>;
}

//! Typed request parameters.
//!
//! Unset optional fields serialize as `null` so that the client can fill them from its
//! configured defaults before dispatch.

use bon::Builder;
use serde::Serialize;

use super::enums::{AudioFormat, Engine, SpeechMarkType, TaskStatus, TextType};
use crate::convert::ConvertParams;

#[derive(Debug, Clone, PartialEq, Serialize, Builder)]
pub struct SynthesizeSpeechRequest {
    #[builder(into)]
    pub text: String,
    #[builder(into)]
    pub voice_id: Option<String>,
    pub output_format: Option<AudioFormat>,
    #[builder(into)]
    pub sample_rate: Option<String>,
    pub speech_mark_types: Option<Vec<SpeechMarkType>>,
    pub text_type: Option<TextType>,
    #[builder(into)]
    pub language_code: Option<String>,
    pub lexicon_names: Option<Vec<String>>,
    pub engine: Option<Engine>,
    /// Force (`Some(true)`) or suppress (`Some(false)`) audio conversion for this call.
    #[serde(skip)]
    pub auto_convert: Option<bool>,
    #[serde(skip)]
    #[builder(default)]
    pub convert_params: ConvertParams,
}

impl SynthesizeSpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self::builder().text(text).build()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Builder)]
pub struct DescribeVoicesRequest {
    pub engine: Option<Engine>,
    #[builder(into)]
    pub language_code: Option<String>,
    pub include_additional_language_codes: Option<bool>,
    #[builder(into)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Builder)]
pub struct ListSynthesisTasksRequest {
    pub max_results: Option<u32>,
    #[builder(into)]
    pub next_token: Option<String>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Builder)]
pub struct StartSynthesisTaskRequest {
    #[builder(into)]
    pub text: String,
    #[builder(into)]
    pub output_s3_bucket_name: Option<String>,
    #[builder(into)]
    pub output_s3_key_prefix: Option<String>,
    #[builder(into)]
    pub voice_id: Option<String>,
    pub output_format: Option<AudioFormat>,
    #[builder(into)]
    pub sample_rate: Option<String>,
    pub speech_mark_types: Option<Vec<SpeechMarkType>>,
    pub text_type: Option<TextType>,
    #[builder(into)]
    pub language_code: Option<String>,
    pub lexicon_names: Option<Vec<String>>,
    #[builder(into)]
    pub sns_topic_arn: Option<String>,
    pub engine: Option<Engine>,
}

impl StartSynthesisTaskRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self::builder().text(text).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::params::to_param_map;
    use serde_json::json;

    #[test]
    fn unset_fields_serialize_as_null() {
        let request = SynthesizeSpeechRequest::builder()
            .text("Hello")
            .voice_id("Joanna")
            .auto_convert(true)
            .build();
        let params = to_param_map(&request).unwrap();

        assert_eq!(params["text"], json!("Hello"));
        assert_eq!(params["voice_id"], json!("Joanna"));
        assert_eq!(params["output_format"], json!(null));
        assert!(!params.contains_key("auto_convert"));
        assert!(!params.contains_key("convert_params"));
    }

    #[test]
    fn task_request_uses_wire_enum_names() {
        let request = ListSynthesisTasksRequest::builder()
            .status(TaskStatus::InProgress)
            .max_results(5)
            .build();
        let params = to_param_map(&request).unwrap();
        assert_eq!(params["status"], json!("inProgress"));
        assert_eq!(params["max_results"], json!(5));
    }
}

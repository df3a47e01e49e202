//! Registry of the service's REST operations.

use reqwest::Method;

use crate::http::endpoint::{Operation, Path};
use crate::types::{ContentType, SPEECH_CONTENT_TYPES};

const JSON: &[ContentType] = &[ContentType::ApplicationJson];
const TASK_KEYS: &[(&str, &str)] = &[("task", "SynthesisTask")];

pub static DELETE_LEXICON: Operation = Operation {
    name: "DeleteLexicon",
    method: Method::DELETE,
    path: Path::Template("/v1/lexicons/{LexiconName}"),
    expected_content_types: &[],
    no_body_on_success: true,
    query_params_allowed: false,
    result_keys: &[],
};

pub static PUT_LEXICON: Operation = Operation {
    name: "PutLexicon",
    method: Method::PUT,
    path: Path::Template("/v1/lexicons/{LexiconName}"),
    expected_content_types: &[],
    no_body_on_success: true,
    query_params_allowed: false,
    result_keys: &[],
};

pub static GET_LEXICON: Operation = Operation {
    name: "GetLexicon",
    method: Method::GET,
    path: Path::Template("/v1/lexicons/{LexiconName}"),
    expected_content_types: JSON,
    no_body_on_success: false,
    query_params_allowed: false,
    result_keys: &[("lexicon", "Lexicon"), ("attributes", "LexiconAttributes")],
};

pub static LIST_LEXICONS: Operation = Operation {
    name: "ListLexicons",
    method: Method::GET,
    path: Path::Fixed("/v1/lexicons"),
    expected_content_types: JSON,
    no_body_on_success: false,
    query_params_allowed: true,
    result_keys: &[],
};

pub static DESCRIBE_VOICES: Operation = Operation {
    name: "DescribeVoices",
    method: Method::GET,
    path: Path::Fixed("/v1/voices"),
    expected_content_types: JSON,
    no_body_on_success: false,
    query_params_allowed: true,
    result_keys: &[],
};

pub static SYNTHESIZE_SPEECH: Operation = Operation {
    name: "SynthesizeSpeech",
    method: Method::POST,
    path: Path::Fixed("/v1/speech"),
    expected_content_types: SPEECH_CONTENT_TYPES,
    no_body_on_success: false,
    query_params_allowed: false,
    result_keys: &[],
};

pub static START_SYNTHESIS_TASK: Operation = Operation {
    name: "StartSpeechSynthesisTask",
    method: Method::POST,
    path: Path::Fixed("/v1/synthesisTasks"),
    expected_content_types: JSON,
    no_body_on_success: false,
    query_params_allowed: false,
    result_keys: TASK_KEYS,
};

pub static GET_SYNTHESIS_TASK: Operation = Operation {
    name: "GetSpeechSynthesisTask",
    method: Method::GET,
    path: Path::Template("/v1/synthesisTasks/{TaskId}"),
    expected_content_types: JSON,
    no_body_on_success: false,
    query_params_allowed: false,
    result_keys: TASK_KEYS,
};

pub static LIST_SYNTHESIS_TASKS: Operation = Operation {
    name: "ListSpeechSynthesisTasks",
    method: Method::GET,
    path: Path::Fixed("/v1/synthesisTasks"),
    expected_content_types: JSON,
    no_body_on_success: false,
    query_params_allowed: true,
    result_keys: &[],
};

/// Every operation the client knows.
pub fn all() -> [&'static Operation; 9] {
    [
        &DELETE_LEXICON,
        &PUT_LEXICON,
        &GET_LEXICON,
        &LIST_LEXICONS,
        &DESCRIBE_VOICES,
        &SYNTHESIZE_SPEECH,
        &START_SYNTHESIS_TASK,
        &GET_SYNTHESIS_TASK,
        &LIST_SYNTHESIS_TASKS,
    ]
}

//! Asynchronous speech synthesis tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::{AudioFormat, Engine, SpeechMarkType, TaskStatus, TextType};
use super::timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisTask {
    pub task_id: String,
    pub task_status: TaskStatus,
    pub task_status_reason: Option<String>,
    pub output_uri: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub creation_time: Option<DateTime<Utc>>,
    pub request_characters: Option<u64>,
    pub sns_topic_arn: Option<String>,
    pub lexicon_names: Option<Vec<String>>,
    pub output_format: Option<AudioFormat>,
    pub sample_rate: Option<String>,
    pub speech_mark_types: Option<Vec<SpeechMarkType>>,
    pub text_type: Option<TextType>,
    pub voice_id: Option<String>,
    pub language_code: Option<String>,
    pub engine: Option<Engine>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of `ListSpeechSynthesisTasks` results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisTasksList {
    pub synthesis_tasks: Vec<SynthesisTask>,
    pub next_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SynthesisTasksList {
    pub fn iter(&self) -> std::slice::Iter<'_, SynthesisTask> {
        self.synthesis_tasks.iter()
    }

    /// Tasks on this page with the given status.
    pub fn with_status(&self, status: TaskStatus) -> impl Iterator<Item = &SynthesisTask> {
        self.synthesis_tasks
            .iter()
            .filter(move |task| task.task_status == status)
    }
}

impl IntoIterator for SynthesisTasksList {
    type Item = SynthesisTask;
    type IntoIter = std::vec::IntoIter<SynthesisTask>;

    fn into_iter(self) -> Self::IntoIter {
        self.synthesis_tasks.into_iter()
    }
}

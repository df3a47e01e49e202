//! Synthesized speech and speech marks.

use std::borrow::Cow;
use std::fmt;
use std::ops::Index;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use bon::Builder;
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::{AudioFormat, ContentType, Engine, SpeechMarkType, TextType};
use crate::client::Polly;
use crate::convert::{Conversion, ConvertParams};
use crate::error::Result;
use crate::http::transport::BodyStream;

const FILENAME_TEXT_LIMIT: usize = 100;

/// Parameters a piece of speech was synthesized with, as sent after defaults were applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechParams {
    pub text: String,
    pub voice_id: String,
    pub output_format: AudioFormat,
    pub sample_rate: Option<String>,
    pub speech_mark_types: Option<Vec<SpeechMarkType>>,
    pub text_type: Option<TextType>,
    pub language_code: Option<String>,
    pub lexicon_names: Option<Vec<String>>,
    pub engine: Option<Engine>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Synthesized audio.
#[derive(Debug, Clone)]
pub struct Speech {
    pub content_type: ContentType,
    /// Number of input characters the service billed for.
    pub request_characters: u64,
    pub audio: Bytes,
    pub params: SpeechParams,
    pub converted: bool,
    pub converted_audio: Option<Bytes>,
    pub conversion: Option<Conversion>,
}

/// Outcome of a synthesis call: audio, or speech marks when the output format is `json`.
#[derive(Debug, Clone)]
pub enum Synthesis {
    Audio(Speech),
    Marks(SpeechMarksList),
}

impl Synthesis {
    pub fn into_speech(self) -> Option<Speech> {
        match self {
            Self::Audio(speech) => Some(speech),
            Self::Marks(_) => None,
        }
    }

    pub fn into_marks(self) -> Option<SpeechMarksList> {
        match self {
            Self::Marks(marks) => Some(marks),
            Self::Audio(_) => None,
        }
    }
}

/// Where and how [`Speech::save`] writes audio.
#[derive(Debug, Clone, Builder)]
pub struct SaveOptions {
    #[builder(into)]
    pub directory: Option<PathBuf>,
    #[builder(into)]
    pub filename: Option<String>,
    /// Write the converted audio when there is one.
    #[builder(default = true)]
    pub converted: bool,
    #[builder(default)]
    pub overwrite: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn ssml_tags() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid SSML tag pattern"))
}

impl Speech {
    /// File extension of the audio currently held in `audio`.
    pub fn format(&self) -> &str {
        if self.is_holding_converted() {
            if let Some(conversion) = &self.conversion {
                return conversion.extension();
            }
        }
        self.params.output_format.extension()
    }

    fn is_holding_converted(&self) -> bool {
        self.converted && self.converted_audio.as_ref() == Some(&self.audio)
    }

    /// Input text without SSML markup.
    pub fn clean_text(&self) -> Cow<'_, str> {
        if self.params.text_type == Some(TextType::Text) {
            return Cow::Borrowed(&self.params.text);
        }
        let stripped = ssml_tags().replace_all(&self.params.text, " ");
        Cow::Owned(stripped.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    /// Default file name: `"{voice} - {text}.{ext}"`, with long text cut at a word boundary.
    pub fn filename(&self, converted: bool) -> String {
        let extension = match (&self.conversion, converted && self.converted) {
            (Some(conversion), true) => conversion.extension(),
            _ => self.params.output_format.extension(),
        };

        let mut name = self.clean_text().replace(['/', '\\'], "-");
        if name.chars().count() > FILENAME_TEXT_LIMIT {
            let head: String = name.chars().take(FILENAME_TEXT_LIMIT).collect();
            let words: Vec<&str> = head.split_whitespace().collect();
            // Drop the cut-off last word, unless it is the only one.
            let kept = match words.split_last() {
                Some((_, rest)) if !rest.is_empty() => rest.join(" "),
                _ => head.clone(),
            };
            name = format!("{kept}...");
        }

        format!("{} - {}.{}", self.params.voice_id, name, extension)
    }

    /// Write the audio to disk and return the path written.
    ///
    /// Unless `overwrite` is set, an existing file is never replaced; a time suffix is added
    /// to the name instead.
    pub async fn save(&self, options: &SaveOptions) -> Result<PathBuf> {
        let audio = match (&self.converted_audio, options.converted && self.converted) {
            (Some(converted), true) => converted,
            _ => &self.audio,
        };

        let filename = options
            .filename
            .clone()
            .unwrap_or_else(|| self.filename(options.converted));
        let mut path = match &options.directory {
            Some(directory) => directory.join(&filename),
            None => PathBuf::from(&filename),
        };

        while !options.overwrite && tokio::fs::try_exists(&path).await? {
            path = with_time_suffix(&path);
        }

        tracing::debug!(path = %path.display(), bytes = audio.len(), "Saving speech");
        tokio::fs::write(&path, audio).await?;
        Ok(path)
    }

    /// Convert this speech with the client's converter.
    pub async fn convert(self, polly: &Polly, params: &ConvertParams) -> Result<Speech> {
        polly.convert(self, params).await
    }

    /// Record the result of an audio conversion.
    ///
    /// With `keep_original` the original audio stays in `audio` and the converted bytes are
    /// only available through `converted_audio`.
    pub fn with_conversion(mut self, audio: Bytes, conversion: Conversion, keep_original: bool) -> Self {
        if !keep_original {
            self.audio = audio.clone();
        }
        self.converted_audio = Some(audio);
        self.converted = true;
        self.conversion = Some(conversion);
        self
    }
}

fn with_time_suffix(path: &Path) -> PathBuf {
    let stamp = chrono::Local::now().format("%S.%3f");
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(extension) => format!("{stem} ({stamp}).{}", extension.to_string_lossy()),
        None => format!("{stem} ({stamp})"),
    };
    path.with_file_name(name)
}

/// Synthesized audio whose body has not been read yet.
pub struct SpeechStream {
    pub content_type: ContentType,
    pub request_characters: u64,
    pub params: SpeechParams,
    pub body: BodyStream,
}

impl fmt::Debug for SpeechStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechStream")
            .field("content_type", &self.content_type)
            .field("request_characters", &self.request_characters)
            .field("params", &self.params)
            .field("body", &"..")
            .finish()
    }
}

impl SpeechStream {
    /// Read the rest of the body into a buffered [`Speech`].
    pub async fn into_speech(self) -> Result<Speech> {
        let audio = self
            .body
            .try_fold(BytesMut::new(), |mut buffer, chunk| async move {
                buffer.extend_from_slice(&chunk);
                Ok(buffer)
            })
            .await?
            .freeze();

        Ok(Speech {
            content_type: self.content_type,
            request_characters: self.request_characters,
            audio,
            params: self.params,
            converted: false,
            converted_audio: None,
            conversion: None,
        })
    }
}

/// A single speech mark. Fields keep the service's lower-case names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechMark {
    /// Offset from the start of the audio, in milliseconds.
    pub time: u64,
    #[serde(rename = "type")]
    pub mark_type: SpeechMarkType,
    pub value: String,
    pub start: Option<u64>,
    pub end: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeechMarksList {
    pub marks: Vec<SpeechMark>,
}

impl SpeechMarksList {
    /// Build from decoded newline-delimited records.
    pub fn from_records(records: Vec<Value>) -> serde_json::Result<Self> {
        let marks = records
            .into_iter()
            .map(serde_json::from_value)
            .collect::<serde_json::Result<Vec<SpeechMark>>>()?;
        Ok(Self { marks })
    }

    pub fn marks(&self, mark_type: SpeechMarkType) -> Vec<&SpeechMark> {
        self.marks
            .iter()
            .filter(|mark| mark.mark_type == mark_type)
            .collect()
    }

    pub fn values(&self, mark_type: SpeechMarkType) -> Vec<&str> {
        self.marks
            .iter()
            .filter(|mark| mark.mark_type == mark_type)
            .map(|mark| mark.value.as_str())
            .collect()
    }

    pub fn words(&self) -> Vec<&SpeechMark> {
        self.marks(SpeechMarkType::Word)
    }

    pub fn sentences(&self) -> Vec<&SpeechMark> {
        self.marks(SpeechMarkType::Sentence)
    }

    pub fn visemes(&self) -> Vec<&SpeechMark> {
        self.marks(SpeechMarkType::Viseme)
    }

    pub fn ssml(&self) -> Vec<&SpeechMark> {
        self.marks(SpeechMarkType::Ssml)
    }

    /// Time of the last mark, in milliseconds.
    pub fn total_time(&self) -> Option<u64> {
        self.marks.last().map(|mark| mark.time)
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpeechMark> {
        self.marks.iter()
    }
}

impl Index<usize> for SpeechMarksList {
    type Output = SpeechMark;

    fn index(&self, index: usize) -> &SpeechMark {
        &self.marks[index]
    }
}

impl IntoIterator for SpeechMarksList {
    type Item = SpeechMark;
    type IntoIter = std::vec::IntoIter<SpeechMark>;

    fn into_iter(self) -> Self::IntoIter {
        self.marks.into_iter()
    }
}

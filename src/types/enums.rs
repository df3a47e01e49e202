//! Enumerated wire values.
//!
//! Each value is declared once with its exact wire string. Values the service may add later
//! deserialize to `Unknown` instead of failing.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Output format of synthesized speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr)]
pub enum AudioFormat {
    /// Speech marks, returned as newline-delimited JSON.
    #[serde(rename = "json")]
    #[strum(serialize = "json")]
    Json,
    #[serde(rename = "mp3")]
    #[strum(serialize = "mp3")]
    Mp3,
    #[serde(rename = "ogg_vorbis")]
    #[strum(serialize = "ogg_vorbis")]
    OggVorbis,
    #[serde(rename = "pcm")]
    #[strum(serialize = "pcm")]
    Pcm,
    #[serde(other)]
    #[strum(serialize = "unknown")]
    Unknown,
}

impl AudioFormat {
    /// File extension for audio in this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Mp3 => "mp3",
            Self::OggVorbis => "ogg",
            Self::Pcm => "pcm",
            Self::Unknown => "bin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TextType {
    Text,
    Ssml,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SpeechMarkType {
    Sentence,
    Ssml,
    Viseme,
    Word,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum TaskStatus {
    Scheduled,
    InProgress,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    /// Whether the task will not change status any more.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum Gender {
    Female,
    Male,
    #[serde(other)]
    Unknown,
}

/// Phonetic alphabet of a pronunciation lexicon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Alphabet {
    Ipa,
    XSampa,
    XAmazonPinyin,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Engine {
    Standard,
    Neural,
    #[serde(other)]
    Unknown,
}

/// Response content types the client knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ContentType {
    #[strum(serialize = "application/json")]
    ApplicationJson,
    /// Newline-delimited JSON speech marks.
    #[strum(serialize = "application/x-json-stream")]
    JsonStream,
    /// Speech marks as sent by older API versions.
    #[strum(serialize = "audio/json")]
    AudioJson,
    #[strum(serialize = "audio/mpeg")]
    AudioMpeg,
    #[strum(serialize = "audio/ogg")]
    AudioOgg,
    #[strum(serialize = "audio/pcm")]
    AudioPcm,
    #[strum(serialize = "application/octet-stream")]
    OctetStream,
}

impl ContentType {
    /// Parse a `Content-Type` header value, ignoring parameters and case.
    pub fn from_header(value: &str) -> Option<Self> {
        normalize_mime(value).and_then(|mime| mime.parse().ok())
    }

    pub fn as_mime(self) -> &'static str {
        self.into()
    }

    /// Whether the body is newline-delimited speech marks.
    pub fn is_speech_marks(self) -> bool {
        matches!(self, Self::JsonStream | Self::AudioJson)
    }

    /// Output format that produces this content type.
    pub fn audio_format(self) -> Option<AudioFormat> {
        match self {
            Self::AudioMpeg => Some(AudioFormat::Mp3),
            Self::AudioOgg => Some(AudioFormat::OggVorbis),
            Self::AudioPcm => Some(AudioFormat::Pcm),
            Self::JsonStream | Self::AudioJson => Some(AudioFormat::Json),
            Self::ApplicationJson | Self::OctetStream => None,
        }
    }
}

/// Content types a successful speech synthesis may return.
pub const SPEECH_CONTENT_TYPES: &[ContentType] = &[
    ContentType::AudioMpeg,
    ContentType::AudioOgg,
    ContentType::AudioPcm,
    ContentType::JsonStream,
    ContentType::AudioJson,
];

/// Lower-cased MIME type without parameters, or `None` when blank.
pub fn normalize_mime(value: &str) -> Option<String> {
    let mime = value.split(';').next().map(str::trim).unwrap_or_default();
    if mime.is_empty() {
        return None;
    }
    Some(mime.to_ascii_lowercase())
}

//! Convenience re-exports for common use.

pub use crate::client::Polly;
pub use crate::config::{Credentials, ParamDefaults, PollyConfig};
pub use crate::convert::{AudioConverter, Conversion, ConvertParams};
pub use crate::error::{ApiErrorKind, ErrorCategory, PollyError, Result};
pub use crate::types::{
    Alphabet, AudioFormat, DescribeVoicesRequest, Engine, Lexeme, Lexicon, LexiconDocument,
    ListSynthesisTasksRequest, SaveOptions, Speech, SpeechMarkType, SpeechMarksList,
    StartSynthesisTaskRequest, Synthesis, SynthesisTask, SynthesizeSpeechRequest, TaskStatus,
    TextType, Voice, VoicesList,
};

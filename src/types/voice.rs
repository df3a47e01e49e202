//! Voice descriptions.

use std::ops::Index;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::{Engine, Gender};
use super::requests::SynthesizeSpeechRequest;
use super::speech::Synthesis;
use crate::client::Polly;
use crate::error::Result;

/// A voice available for synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub gender: Gender,
    pub language_code: String,
    pub language_name: String,
    pub additional_language_codes: Option<Vec<String>>,
    pub supported_engines: Option<Vec<Engine>>,
    /// Fields this version of the client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Voice {
    /// Synthesize `request` with this voice, overriding any voice set on the request.
    pub async fn synthesize(
        &self,
        polly: &Polly,
        mut request: SynthesizeSpeechRequest,
    ) -> Result<Synthesis> {
        request.voice_id = Some(self.id.clone());
        polly.synthesize_speech(request).await
    }
}

/// One page of `DescribeVoices` results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicesList {
    pub voices: Vec<Voice>,
    pub next_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VoicesList {
    pub fn iter(&self) -> std::slice::Iter<'_, Voice> {
        self.voices.iter()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Synthesize the same request with every voice in the list, concurrently.
    ///
    /// Returns one result per voice, in list order. A failure for one voice does not cancel
    /// the others.
    pub async fn synthesize_all(
        &self,
        polly: &Polly,
        request: SynthesizeSpeechRequest,
    ) -> Vec<Result<Synthesis>> {
        let requests = self
            .voices
            .iter()
            .map(|voice| {
                let mut request = request.clone();
                request.voice_id = Some(voice.id.clone());
                request
            })
            .collect();
        polly.synthesize_many(requests).await
    }
}

impl Index<usize> for VoicesList {
    type Output = Voice;

    fn index(&self, index: usize) -> &Voice {
        &self.voices[index]
    }
}

impl<'a> IntoIterator for &'a VoicesList {
    type Item = &'a Voice;
    type IntoIter = std::slice::Iter<'a, Voice>;

    fn into_iter(self) -> Self::IntoIter {
        self.voices.iter()
    }
}

impl IntoIterator for VoicesList {
    type Item = Voice;
    type IntoIter = std::vec::IntoIter<Voice>;

    fn into_iter(self) -> Self::IntoIter {
        self.voices.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::case::to_host_case;
    use serde_json::json;

    #[test]
    fn unknown_fields_are_kept_aside() {
        let wire = json!({
            "Voices": [{
                "Gender": "Female",
                "Id": "Joanna",
                "LanguageCode": "en-US",
                "LanguageName": "US English",
                "Name": "Joanna",
                "SupportedEngines": ["neural", "standard"],
                "StyleTags": ["news"]
            }]
        });
        let list: VoicesList = serde_json::from_value(to_host_case(wire)).unwrap();

        assert_eq!(list.len(), 1);
        assert!(list.next_token.is_none());
        let voice = &list[0];
        assert_eq!(voice.gender, Gender::Female);
        assert_eq!(
            voice.supported_engines.as_deref(),
            Some(&[Engine::Neural, Engine::Standard][..])
        );
        assert_eq!(voice.extra.get("style_tags"), Some(&json!(["news"])));
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let host = json!({"voices": [{"id": "Joanna", "name": "Joanna"}]});
        assert!(serde_json::from_value::<VoicesList>(host).is_err());
    }
}

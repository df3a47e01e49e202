//! Pronunciation lexicons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::enums::Alphabet;
use super::timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconAttributes {
    pub alphabet: Alphabet,
    pub language_code: String,
    #[serde(with = "timestamp")]
    pub last_modified: DateTime<Utc>,
    pub lexemes_count: u64,
    pub lexicon_arn: String,
    pub size: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A stored lexicon. `content` is only present when fetched individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lexicon {
    pub name: String,
    pub content: Option<String>,
    pub attributes: Option<LexiconAttributes>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of `ListLexicons` results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconsList {
    pub lexicons: Vec<Lexicon>,
    pub next_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LexiconsList {
    pub fn iter(&self) -> std::slice::Iter<'_, Lexicon> {
        self.lexicons.iter()
    }

    /// Find a lexicon on this page by name.
    pub fn get(&self, name: &str) -> Option<&Lexicon> {
        self.lexicons.iter().find(|lexicon| lexicon.name == name)
    }
}

impl IntoIterator for LexiconsList {
    type Item = Lexicon;
    type IntoIter = std::vec::IntoIter<Lexicon>;

    fn into_iter(self) -> Self::IntoIter {
        self.lexicons.into_iter()
    }
}

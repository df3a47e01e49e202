//! Building Pronunciation Lexicon Specification (PLS) documents.

use std::fmt::Write as _;

use super::enums::Alphabet;
use crate::error::{PollyError, Result};

const PLS_NAMESPACE: &str = "http://www.w3.org/2005/01/pronunciation-lexicon";

/// A single lexicon entry. Needs a phoneme or an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub grapheme: String,
    pub phoneme: Option<String>,
    pub alias: Option<String>,
}

impl Lexeme {
    pub fn with_phoneme(grapheme: impl Into<String>, phoneme: impl Into<String>) -> Self {
        Self {
            grapheme: grapheme.into(),
            phoneme: Some(phoneme.into()),
            alias: None,
        }
    }

    /// Pronounce `grapheme` as if `alias` had been written instead.
    pub fn with_alias(grapheme: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            grapheme: grapheme.into(),
            phoneme: None,
            alias: Some(alias.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconDocument {
    pub alphabet: Alphabet,
    /// Language of the lexicon, e.g. `en-US`.
    pub lang: String,
    pub lexemes: Vec<Lexeme>,
}

impl LexiconDocument {
    pub fn new(alphabet: Alphabet, lang: impl Into<String>) -> Self {
        Self {
            alphabet,
            lang: lang.into(),
            lexemes: Vec::new(),
        }
    }

    pub fn add_lexemes(mut self, lexemes: impl IntoIterator<Item = Lexeme>) -> Self {
        self.lexemes.extend(lexemes);
        self
    }

    /// Render the document as PLS XML.
    pub fn to_xml(&self) -> Result<String> {
        if self.lexemes.is_empty() {
            return Err(PollyError::Parameter(
                "A lexicon needs at least one lexeme".to_string(),
            ));
        }
        if self.alphabet == Alphabet::Unknown {
            return Err(PollyError::Parameter(
                "A lexicon needs a known phonetic alphabet".to_string(),
            ));
        }

        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        // Writing into a String cannot fail.
        let _ = writeln!(
            xml,
            "<lexicon version=\"1.0\" xmlns=\"{PLS_NAMESPACE}\" alphabet=\"{}\" xml:lang=\"{}\">",
            self.alphabet,
            escape(&self.lang)
        );

        for lexeme in &self.lexemes {
            if lexeme.grapheme.trim().is_empty() {
                return Err(PollyError::Parameter(
                    "Lexeme grapheme must not be empty".to_string(),
                ));
            }
            let _ = writeln!(xml, "  <lexeme>");
            let _ = writeln!(xml, "    <grapheme>{}</grapheme>", escape(&lexeme.grapheme));
            match (&lexeme.phoneme, &lexeme.alias) {
                (Some(phoneme), _) => {
                    let _ = writeln!(xml, "    <phoneme>{}</phoneme>", escape(phoneme));
                }
                (None, Some(alias)) => {
                    let _ = writeln!(xml, "    <alias>{}</alias>", escape(alias));
                }
                (None, None) => {
                    return Err(PollyError::Parameter(format!(
                        "Lexeme '{}' needs a phoneme or an alias",
                        lexeme.grapheme
                    )));
                }
            }
            let _ = writeln!(xml, "  </lexeme>");
        }

        xml.push_str("</lexicon>");
        Ok(xml)
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Lexicon content accepted by `put_lexicon`: raw PLS XML or a document to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexiconContent {
    Xml(String),
    Document(LexiconDocument),
}

impl LexiconContent {
    pub fn into_xml(self) -> Result<String> {
        match self {
            Self::Xml(xml) => Ok(xml),
            Self::Document(document) => document.to_xml(),
        }
    }
}

impl From<String> for LexiconContent {
    fn from(xml: String) -> Self {
        Self::Xml(xml)
    }
}

impl From<&str> for LexiconContent {
    fn from(xml: &str) -> Self {
        Self::Xml(xml.to_string())
    }
}

impl From<LexiconDocument> for LexiconContent {
    fn from(document: LexiconDocument) -> Self {
        Self::Document(document)
    }
}

//! Key-phrase vocabulary used by the coverage matcher.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Phrases shipped with the crate, tuned for small creative-business
/// interviews. Swap them out with [`KeyPhrases::load`].
const DEFAULT_PHRASES: &[&str] = &[
    "instagram",
    "pricing",
    "wedding",
    "social media",
    "marketing",
    "website",
    "email list",
    "newsletter",
    "branding",
    "photography",
    "wholesale",
    "subscription",
    "workshop",
    "farmers market",
    "sustainability",
    "burnout",
    "hiring",
    "side hustle",
    "etsy",
    "tiktok",
];

/// A vocabulary of domain key phrases, matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPhrases {
    #[serde(default, rename = "key_phrases")]
    phrases: Vec<String>,
}

impl Default for KeyPhrases {
    fn default() -> Self {
        Self::new(DEFAULT_PHRASES.iter().copied())
    }
}

impl KeyPhrases {
    /// Build a vocabulary, lower-casing and dropping blank phrases.
    pub fn new(phrases: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    /// Load a vocabulary from a TOML file with a `key_phrases` array.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse a vocabulary from a TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        let raw: KeyPhrases = toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))?;
        let phrases = Self::new(raw.phrases);
        if phrases.is_empty() {
            return Err(Error::Invalid("vocabulary contains no phrases".into()));
        }
        Ok(phrases)
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.phrases.iter().map(String::as_str)
    }

    /// Phrases found in `text`, in vocabulary order.
    pub fn found_in<'a>(&'a self, text: &str) -> Vec<&'a str> {
        let text = text.to_lowercase();
        self.iter()
            .filter(|phrase| contains_phrase(&text, phrase))
            .collect()
    }
}

/// Whether `phrase` occurs in `text` starting on a word boundary.
///
/// Only the leading edge is anchored so plurals ("weddings") still count.
fn contains_phrase(text: &str, phrase: &str) -> bool {
    text.match_indices(phrase).any(|(idx, _)| {
        text[..idx]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_vocabulary_is_lowercase() {
        let phrases = KeyPhrases::default();
        assert!(!phrases.is_empty());
        assert!(phrases.iter().all(|p| p == p.to_lowercase()));
    }

    #[test]
    fn finds_phrases_case_insensitively() {
        let phrases = KeyPhrases::new(["instagram", "pricing", "social media"]);
        let found = phrases.found_in("Instagram Pricing for Florists");
        assert_eq!(found, vec!["instagram", "pricing"]);
    }

    #[test]
    fn plural_matches_but_infix_does_not() {
        let phrases = KeyPhrases::new(["wedding", "seo"]);
        assert_eq!(phrases.found_in("Booking weddings early"), vec!["wedding"]);
        assert!(phrases.found_in("Flowers in Seoul").is_empty());
    }

    #[test]
    fn parse_toml() {
        let toml = r#"
key_phrases = ["Pottery", "  kiln  ", ""]
"#;
        let phrases = KeyPhrases::parse(toml).unwrap();
        assert_eq!(phrases.iter().collect::<Vec<_>>(), vec!["pottery", "kiln"]);
    }

    #[test]
    fn parse_rejects_empty_vocabulary() {
        let err = KeyPhrases::parse("key_phrases = []").unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
    }

    #[test]
    fn parse_rejects_bad_toml() {
        let err = KeyPhrases::parse("key_phrases = [").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}

//! Title matching policies.

use crate::KeyPhrases;
use std::collections::BTreeSet;

/// Shared key phrases needed before a candidate counts as covered.
pub const MIN_KEY_PHRASE_MATCHES: usize = 2;

/// Fraction of the candidate's long words that must reappear in an
/// existing title (strictly exceeded) before it counts as covered.
pub const WORD_OVERLAP_THRESHOLD: f64 = 0.6;

/// Words must be longer than this many characters to take part in overlap.
pub const MIN_WORD_LEN: usize = 4;

/// Outcome of [`check_exists`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistenceCheck {
    /// The first existing entry that matches exactly, if any.
    pub exact_match: Option<String>,
    /// Entries that merely contain (or are contained by) the candidate.
    pub similar: Vec<String>,
}

impl ExistenceCheck {
    pub fn exists(&self) -> bool {
        self.exact_match.is_some()
    }
}

/// Normalize a title into a URL slug.
///
/// Lower-cases, drops apostrophes, and collapses every other run of
/// non-alphanumeric characters into a single hyphen.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars().filter(|c| !matches!(c, '\'' | '\u{2019}')) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Check whether `candidate` already exists among `existing` titles or slugs.
///
/// An exact match is slug identity or case-insensitive equality. Entries
/// related only by substring containment are reported in `similar`.
pub fn check_exists<S: AsRef<str>>(candidate: &str, existing: &[S]) -> ExistenceCheck {
    let mut check = ExistenceCheck::default();
    let candidate_slug = slugify(candidate);
    let candidate_lower = candidate.trim().to_lowercase();
    if candidate_slug.is_empty() {
        return check;
    }

    for entry in existing {
        let entry = entry.as_ref();
        let entry_lower = entry.trim().to_lowercase();
        if entry_lower.is_empty() {
            continue;
        }

        let exact = slugify(entry) == candidate_slug || entry_lower == candidate_lower;
        if exact {
            if check.exact_match.is_none() {
                check.exact_match = Some(entry.to_string());
            }
        } else if entry_lower.contains(&candidate_lower) || candidate_lower.contains(&entry_lower)
        {
            check.similar.push(entry.to_string());
        }
    }

    check
}

/// Lower-cased words longer than [`MIN_WORD_LEN`] characters.
pub fn long_words(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > MIN_WORD_LEN)
        .map(str::to_lowercase)
        .collect()
}

/// Why a candidate was judged to be covered by an existing title.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlap {
    /// At least [`MIN_KEY_PHRASE_MATCHES`] vocabulary phrases appear in both.
    KeyPhrases(Vec<String>),
    /// The long words of the candidate largely reappear in the existing title.
    Words { shared: Vec<String>, ratio: f64 },
}

/// Heuristic topical-overlap matcher used before scheduling new articles.
#[derive(Debug, Clone, Default)]
pub struct CoverageMatcher {
    phrases: KeyPhrases,
}

impl CoverageMatcher {
    pub fn new(phrases: KeyPhrases) -> Self {
        Self { phrases }
    }

    /// Compare one candidate against one existing title.
    pub fn overlap(&self, candidate: &str, existing: &str) -> Option<Overlap> {
        let theirs = self.phrases.found_in(existing);
        let shared: Vec<String> = self
            .phrases
            .found_in(candidate)
            .into_iter()
            .filter(|p| theirs.contains(p))
            .map(str::to_string)
            .collect();
        if shared.len() >= MIN_KEY_PHRASE_MATCHES {
            return Some(Overlap::KeyPhrases(shared));
        }

        let ours = long_words(candidate);
        if ours.is_empty() {
            return None;
        }
        let theirs = long_words(existing);
        let shared: Vec<String> = ours.intersection(&theirs).cloned().collect();
        let ratio = shared.len() as f64 / ours.len() as f64;
        (ratio > WORD_OVERLAP_THRESHOLD).then_some(Overlap::Words { shared, ratio })
    }

    /// The first existing title that covers `candidate`, with the reason.
    pub fn find_covering<'a, S: AsRef<str>>(
        &self,
        candidate: &str,
        existing: &'a [S],
    ) -> Option<(&'a str, Overlap)> {
        existing.iter().find_map(|entry| {
            let entry = entry.as_ref();
            self.overlap(candidate, entry).map(|o| (entry, o))
        })
    }

    pub fn is_covered<S: AsRef<str>>(&self, candidate: &str, existing: &[S]) -> bool {
        self.find_covering(candidate, existing).is_some()
    }

    /// Items whose title is not yet covered, in their original order.
    pub fn uncovered<'a, T, S: AsRef<str>>(
        &self,
        items: &'a [T],
        title: impl Fn(&T) -> &str,
        existing: &[S],
    ) -> Vec<&'a T> {
        items
            .iter()
            .filter(|item| !self.is_covered(title(*item), existing))
            .collect()
    }
}

//! The article draft handed to the publishing store.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

const EXCERPT_MAX_CHARS: usize = 300;
const META_DESCRIPTION_MAX_CHARS: usize = 160;

static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p>").expect("valid regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    #[default]
    Draft,
    Published,
}

/// A publication-ready article. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub title: String,
    pub html: String,
    pub excerpt: String,
    pub meta_title: String,
    pub meta_description: String,
    /// Normalized, de-duplicated, in first-seen order.
    pub tags: Vec<String>,
    pub status: DraftStatus,
}

impl ArticleDraft {
    /// Fill empty metadata from the fields that are present.
    ///
    /// Meta title falls back to the title, the excerpt to the first
    /// paragraph of the body, and the meta description to the excerpt.
    pub fn fill_defaults(&mut self) {
        if self.meta_title.is_empty() {
            self.meta_title = self.title.clone();
        }
        if self.excerpt.is_empty() {
            self.excerpt = truncate_words(&first_paragraph(&self.html), EXCERPT_MAX_CHARS);
        }
        if self.meta_description.is_empty() {
            self.meta_description = truncate_words(&self.excerpt, META_DESCRIPTION_MAX_CHARS);
        }
    }
}

/// Plain text of the first non-empty `<p>` element.
pub fn first_paragraph(html: &str) -> String {
    PARAGRAPH
        .captures_iter(html)
        .map(|c| strip_tags(&c[1]))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

/// Remove markup and collapse whitespace.
pub fn strip_tags(html: &str) -> String {
    TAG.replace_all(html, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut `text` to at most `max` characters, backing off to a word boundary.
pub fn truncate_words(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(1)).collect();
    let cut = match cut.rfind(' ') {
        Some(idx) if idx > 0 => &cut[..idx],
        _ => cut.as_str(),
    };
    format!("{}…", cut.trim_end_matches([',', ';', ':', '.', ' ']))
}

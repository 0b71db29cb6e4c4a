//! Best-effort extraction of article fields from free-text model output.
//!
//! One-shot generation asks the model for a labelled layout, but models
//! drift: labels get bolded, titles turn into headings, the body loses its
//! code fence. Each field is therefore tried against a ladder of patterns
//! and the first hit wins. A field that matches nothing is left empty.

use crate::article::{ArticleDraft, strip_tags};
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Turns raw model output into an [`ArticleDraft`].
///
/// Never fails: unmatched fields come back as empty strings.
pub trait ResponseParser: Send + Sync {
    fn parse(&self, text: &str) -> ArticleDraft;
}

/// The default layered parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeTextParser;

impl ResponseParser for FreeTextParser {
    fn parse(&self, text: &str) -> ArticleDraft {
        parse_article(text)
    }
}

fn label(name: &str) -> Regex {
    Regex::new(&format!(
        r"(?im)^[ \t]*[*_]*[ \t]*{name}[ \t]*[*_]*[ \t]*:[ \t]*(.*?)[ \t]*$"
    ))
    .expect("valid regex")
}

static FENCED_HTML: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```[ \t]*html[ \t]*\r?\n(.*?)```").expect("valid regex"));
static OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[a-zA-Z][a-zA-Z0-9]*\b[^>]*>").expect("valid regex"));
static CLOSE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</[a-zA-Z][a-zA-Z0-9]*\s*>").expect("valid regex"));

static TITLE: LazyLock<Regex> = LazyLock::new(|| label("title"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#[ \t]+(.+?)[ \t#]*$").expect("valid regex"));
static SUGGESTED_TITLE: LazyLock<Regex> = LazyLock::new(|| label(r"suggested[ \t]+title"));
static H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1>").expect("valid regex"));
static H2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h2\b[^>]*>(.*?)</h2>").expect("valid regex"));
static BOLD_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*\n]{10,80})\*\*").expect("valid regex"));

static META_TITLE: LazyLock<Regex> = LazyLock::new(|| label(r"meta[ \t]+title"));
static META_DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| label(r"meta[ \t]+description"));
static EXCERPT: LazyLock<Regex> = LazyLock::new(|| label("excerpt"));
static TAGS: LazyLock<Regex> = LazyLock::new(|| label("tags"));

static BACKSLASH_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\\(["'_*n])"#).expect("valid regex"));
static DOUBLE_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&amp;(lt|gt|amp|quot|apos|nbsp|#[0-9]+|#x[0-9a-fA-F]+);").expect("valid regex")
});

/// Extract an [`ArticleDraft`] from model output.
pub fn parse_article(text: &str) -> ArticleDraft {
    let (html, rest) = extract_html(text);
    let html = unescape_html(&html);

    let draft = ArticleDraft {
        title: extract_title(&rest, &html),
        html,
        excerpt: label_value(&EXCERPT, &rest),
        meta_title: label_value(&META_TITLE, &rest),
        meta_description: label_value(&META_DESCRIPTION, &rest),
        tags: extract_tags(&rest),
        ..Default::default()
    };

    let missing = missing_fields(&draft);
    if !missing.is_empty() {
        warn!(fields = ?missing, "model output is missing article fields");
    }
    draft
}

/// Names of the fields the parser could not fill.
pub fn missing_fields(draft: &ArticleDraft) -> Vec<&'static str> {
    [
        ("title", draft.title.is_empty()),
        ("html", draft.html.is_empty()),
        ("excerpt", draft.excerpt.is_empty()),
        ("meta_title", draft.meta_title.is_empty()),
        ("meta_description", draft.meta_description.is_empty()),
        ("tags", draft.tags.is_empty()),
    ]
    .into_iter()
    .filter_map(|(name, empty)| empty.then_some(name))
    .collect()
}

/// Undo the escaping models tend to add to HTML payloads.
///
/// Backslash-escaped quotes, apostrophes, underscores, asterisks and
/// newlines are restored, and double-encoded entities (`&amp;lt;`) are
/// collapsed by one level. Already clean HTML passes through unchanged.
pub fn unescape_html(html: &str) -> String {
    let html = BACKSLASH_ESCAPE.replace_all(html, |caps: &regex::Captures<'_>| {
        match &caps[1] {
            "n" => "\n".to_string(),
            other => other.to_string(),
        }
    });
    DOUBLE_ENTITY.replace_all(&html, "&$1;").into_owned()
}

/// Returns the HTML body and the text with that body removed, so labels
/// are not picked up from inside the article.
fn extract_html(text: &str) -> (String, String) {
    if let Some(caps) = FENCED_HTML.captures(text) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        let rest = format!("{}\n{}", &text[..whole.start], &text[whole.end..]);
        return (caps[1].trim().to_string(), rest);
    }

    let Some(open) = OPEN_TAG.find(text) else {
        return (String::new(), text.to_string());
    };
    match CLOSE_TAG.find_iter(&text[open.start()..]).last() {
        Some(close) => {
            let end = open.start() + close.end();
            let rest = format!("{}\n{}", &text[..open.start()], &text[end..]);
            (text[open.start()..end].trim().to_string(), rest)
        }
        None => (String::new(), text.to_string()),
    }
}

fn extract_title(text: &str, html: &str) -> String {
    let labelled = [&*TITLE, &*HEADING, &*SUGGESTED_TITLE]
        .into_iter()
        .map(|re| first_capture(re, text));
    let from_html = [&*H1, &*H2]
        .into_iter()
        .map(|re| first_capture(re, html).map(|t| strip_tags(&t)));
    let bolded = std::iter::once_with(|| {
        BOLD_PHRASE
            .captures_iter(text)
            .map(|c| clean_value(&c[1]))
            .find(|t| !t.ends_with(':') && !t.is_empty())
    });

    labelled
        .chain(from_html)
        .chain(bolded)
        .flatten()
        .map(|t| clean_value(&t))
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text)
        .map(|c| clean_value(&c[1]))
        .find(|v| !v.is_empty())
}

fn label_value(re: &Regex, text: &str) -> String {
    first_capture(re, text).unwrap_or_default()
}

fn extract_tags(text: &str) -> Vec<String> {
    let Some(raw) = first_capture(&TAGS, text) else {
        return Vec::new();
    };
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').filter_map(normalize_tag) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// Lower-case a tag and strip wrapping punctuation (`#seo`, `"pricing"`).
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

/// Trim whitespace, markdown emphasis, and wrapping quotes.
fn clean_value(raw: &str) -> String {
    raw.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '*' | '_' | '`' | '"' | '\u{201c}' | '\u{201d}')
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labelled_response_round_trip() {
        let text = "Here is your article.\n\n\
            Title: Growing Peonies in Cold Climates\n\
            Tags: a, b, c\n\n\
            ```html\n<h1>Peonies</h1>\n<p>They love winter.</p>\n```\n";
        let draft = parse_article(text);
        assert_eq!(draft.title, "Growing Peonies in Cold Climates");
        assert_eq!(draft.html, "<h1>Peonies</h1>\n<p>They love winter.</p>");
        assert_eq!(draft.tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn no_markers_yields_empty_fields() {
        let draft = parse_article("I could not write that article, sorry.");
        assert_eq!(draft, ArticleDraft::default());
    }

    #[test]
    fn missing_fields_names_what_the_model_left_out() {
        let empty = parse_article("nothing here");
        assert_eq!(
            missing_fields(&empty),
            vec!["title", "html", "excerpt", "meta_title", "meta_description", "tags"]
        );

        let text = "Title: Winter Peonies\n\
            Tags: garden, peonies\n\n\
            ```html\n<p>They love winter.</p>\n```\n";
        let partial = parse_article(text);
        assert_eq!(
            missing_fields(&partial),
            vec!["excerpt", "meta_title", "meta_description"]
        );
    }

    #[test]
    fn bolded_labels_are_accepted() {
        let text = "**Title:** \"The Bloom Report\"\n\
            **Meta Description:** Weekly flower news.\n\
            **Excerpt**: A short one.\n\
            **Tags:** #Flowers, \"Weekly News\", flowers\n\
            <p>Body</p>";
        let draft = parse_article(text);
        assert_eq!(draft.title, "The Bloom Report");
        assert_eq!(draft.meta_description, "Weekly flower news.");
        assert_eq!(draft.excerpt, "A short one.");
        assert_eq!(draft.tags, vec!["flowers", "weekly news"]);
        assert_eq!(draft.html, "<p>Body</p>");
    }

    #[test]
    fn label_beats_heading() {
        let text = "# Heading Title\nTitle: Label Title\n";
        assert_eq!(parse_article(text).title, "Label Title");
    }

    #[test]
    fn heading_beats_suggested_title() {
        let text = "Suggested Title: Suggested\n# Heading Title\n";
        assert_eq!(parse_article(text).title, "Heading Title");
    }

    #[test]
    fn meta_title_is_not_a_title() {
        let text = "Meta Title: Only Meta\nSuggested Title: The Real One\n";
        let draft = parse_article(text);
        assert_eq!(draft.title, "The Real One");
        assert_eq!(draft.meta_title, "Only Meta");
    }

    #[test]
    fn falls_back_to_html_headings() {
        let text = "```html\n<h2>Second</h2><h1>First <em>Bloom</em></h1>\n```";
        assert_eq!(parse_article(text).title, "First Bloom");

        let text = "```html\n<h2>Only Second</h2><p>x</p>\n```";
        assert_eq!(parse_article(text).title, "Only Second");
    }

    #[test]
    fn falls_back_to_bold_phrase() {
        let text = "Some intro.\n**Note:**\n**A Season of Dahlias and Doubt** is my pick.";
        assert_eq!(parse_article(text).title, "A Season of Dahlias and Doubt");
    }

    #[test]
    fn short_bold_phrase_is_ignored() {
        assert_eq!(parse_article("**Too short** text").title, "");
    }

    #[test]
    fn labels_inside_html_are_ignored() {
        let text = "```html\n<p>\nTags: inner\n</p>\n```\nTags: outer";
        assert_eq!(parse_article(text).tags, vec!["outer"]);
    }

    #[test]
    fn unfenced_html_spans_first_open_to_last_close() {
        let text = "Sure! <h1>Hi</h1>\n<p>Body</p> Hope that helps.";
        assert_eq!(parse_article(text).html, "<h1>Hi</h1>\n<p>Body</p>");
    }

    #[test]
    fn html_is_unescaped() {
        let text = "```html\n<p class=\\\"lead\\\">It\\'s a \\_big\\_ day\\n&amp;lt;3</p>\n```";
        assert_eq!(
            parse_article(text).html,
            "<p class=\"lead\">It's a _big_ day\n&lt;3</p>"
        );
    }

    #[test]
    fn unescape_is_idempotent_on_clean_html() {
        let clean = "<p class=\"a\">Tom &amp; Jerry &lt;3 it's *fine*</p>\n<p>AT&amp;T;</p>";
        let once = unescape_html(clean);
        assert_eq!(once, clean);
        assert_eq!(unescape_html(&once), once);
    }

    #[test]
    fn normalize_tag_strips_wrapping_punctuation() {
        assert_eq!(normalize_tag("  #SEO "), Some("seo".into()));
        assert_eq!(normalize_tag("[Small  Business]"), Some("small business".into()));
        assert_eq!(normalize_tag(" ** "), None);
    }
}

//! System and user prompts.

use chrono::NaiveDate;

/// The labelled layout [`crate::parser::FreeTextParser`] reads back.
const OUTPUT_FORMAT: &str = "\
Respond in exactly this format:

Title: <article title>
Meta Title: <at most 60 characters>
Meta Description: <at most 160 characters>
Excerpt: <one or two sentences>
Tags: <comma-separated tags>

```html
<the full article body as HTML using <h2>, <p>, <ul> and <blockquote>; no <html> or <body> wrapper>
```";

/// System prompt for the tool-using content agent.
pub fn agent_system(today: NaiveDate) -> String {
    format!(
        "You are the content assistant for a small editorial team. Today is {today}.\n\
        \n\
        You can browse interview transcripts and idea notes, review the articles \
        already published, research topics on the web, and file new articles as \
        drafts in the CMS. Use the tools to gather facts instead of guessing.\n\
        \n\
        Before creating a draft, call check_existing_articles with your proposed \
        title. If an article with that title exists, choose a different angle. \
        Drafts are never published by you; an editor reviews them.\n\
        \n\
        When a tool returns an error, read the message and decide whether to \
        retry with different input, try another tool, or explain the problem.\n\
        \n\
        Finish with a short plain-text summary of what you found or did, \
        including the URL of any draft you created."
    )
}

/// System prompt for one-shot article generation.
pub fn generator_system() -> String {
    format!(
        "You are an experienced feature writer. You turn source material into \
        engaging, well-structured articles of 800 to 1200 words with a clear \
        headline, a strong opening paragraph and descriptive subheadings. Quote \
        the source where it helps, and never invent facts or quotes.\n\
        \n\
        {OUTPUT_FORMAT}"
    )
}

pub fn interview_request(transcript: &str) -> String {
    format!(
        "Write a profile article based on this interview transcript. Lead with \
        the most interesting story in it.\n\n<transcript>\n{transcript}\n</transcript>"
    )
}

pub fn idea_request(notes: &str) -> String {
    format!(
        "Develop these notes into a practical article for our readers.\n\n\
        <notes>\n{notes}\n</notes>"
    )
}

/// `research` is rendered search results; it may be empty.
pub fn topic_request(topic: &str, research: &str) -> String {
    if research.is_empty() {
        return format!("Write an article about: {topic}");
    }
    format!(
        "Write an article about: {topic}\n\n\
        Use this research where relevant and cite sources by name.\n\n\
        <research>\n{research}\n</research>"
    )
}

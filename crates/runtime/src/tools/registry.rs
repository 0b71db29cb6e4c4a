//! The fixed catalog of tools offered to the model.

use crate::model::ToolSpec;
use crate::tools::ToolError;
use serde_json::{Map, Value, json};

/// Every tool the content agent knows, plus a catch-all for anything else
/// the model asks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolName {
    ListInterviews,
    ListIdeas,
    ReadDocument,
    ListArticles,
    CheckExistingArticles,
    SearchWeb,
    CreateDraft,
    Unknown(String),
}

impl ToolName {
    /// All known tools, in catalog order.
    pub const KNOWN: [ToolName; 7] = [
        ToolName::ListInterviews,
        ToolName::ListIdeas,
        ToolName::ReadDocument,
        ToolName::ListArticles,
        ToolName::CheckExistingArticles,
        ToolName::SearchWeb,
        ToolName::CreateDraft,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ToolName::ListInterviews => "list_interviews",
            ToolName::ListIdeas => "list_ideas",
            ToolName::ReadDocument => "read_document",
            ToolName::ListArticles => "list_articles",
            ToolName::CheckExistingArticles => "check_existing_articles",
            ToolName::SearchWeb => "search_web",
            ToolName::CreateDraft => "create_draft",
            ToolName::Unknown(name) => name,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            ToolName::ListInterviews => {
                "List interview transcripts available for this run, newest first. \
                 Returns id, title and creation time for each document."
            }
            ToolName::ListIdeas => {
                "List article idea notes, newest first. Only available when the run \
                 has an ideas folder."
            }
            ToolName::ReadDocument => {
                "Read the full text of one interview or idea document by id. \
                 Long documents are truncated."
            }
            ToolName::ListArticles => {
                "List articles already in the CMS (published and drafts), most recent \
                 first, with title, slug and publish date."
            }
            ToolName::CheckExistingArticles => {
                "Check whether an article with this title already exists. Reports an \
                 exact match (which blocks drafting) and loosely similar titles (advisory)."
            }
            ToolName::SearchWeb => {
                "Search the web for background research, statistics or recent news. \
                 Returns title, url, snippet and source for each result."
            }
            ToolName::CreateDraft => {
                "Save a finished article as a draft in the CMS. The body must be HTML. \
                 Fails if an article with the same title already exists."
            }
            ToolName::Unknown(_) => "",
        }
    }

    fn input_schema(&self) -> Value {
        let limit = json!({
            "type": "integer",
            "description": "Maximum number of entries to return"
        });
        match self {
            ToolName::ListInterviews | ToolName::ListIdeas | ToolName::ListArticles => json!({
                "type": "object",
                "properties": { "limit": limit },
                "required": []
            }),
            ToolName::ReadDocument => json!({
                "type": "object",
                "properties": {
                    "document_id": {"type": "string", "description": "Id from list_interviews or list_ideas"}
                },
                "required": ["document_id"]
            }),
            ToolName::CheckExistingArticles => json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Candidate article title"}
                },
                "required": ["title"]
            }),
            ToolName::SearchWeb => json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The search query"},
                    "max_results": {"type": "integer", "description": "1-10, default 5"}
                },
                "required": ["query"]
            }),
            ToolName::CreateDraft => json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "html": {"type": "string", "description": "Article body as HTML"},
                    "excerpt": {"type": "string"},
                    "meta_title": {"type": "string"},
                    "meta_description": {"type": "string", "description": "At most 160 characters"},
                    "tags": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["title", "html"]
            }),
            ToolName::Unknown(_) => json!({"type": "object", "properties": {}}),
        }
    }

    pub fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.as_str().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

impl From<&str> for ToolName {
    fn from(name: &str) -> Self {
        ToolName::KNOWN
            .into_iter()
            .find(|known| known.as_str() == name)
            .unwrap_or_else(|| ToolName::Unknown(name.to_string()))
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The catalog supplied with every model call of a run.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    specs: Vec<ToolSpec>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ToolRegistry {
    /// The full content-agent catalog.
    pub fn standard() -> Self {
        Self {
            specs: ToolName::KNOWN.iter().map(ToolName::spec).collect(),
        }
    }

    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// Check `input` against the declared schema of `name`.
    ///
    /// Input must be an object carrying every required field; unknown
    /// fields are ignored. Returns the object for further decoding.
    pub fn validate<'a>(
        &self,
        name: &str,
        input: &'a Value,
    ) -> Result<&'a Map<String, Value>, ToolError> {
        let spec = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        let fields = input
            .as_object()
            .ok_or_else(|| ToolError::InvalidInput(format!("{name} expects a JSON object")))?;

        let required = spec.input_schema["required"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_str);
        for field in required {
            match fields.get(field) {
                None | Some(Value::Null) => {
                    return Err(ToolError::InvalidInput(format!(
                        "{name}: missing required field `{field}`"
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for name in ToolName::KNOWN {
            assert_eq!(ToolName::from(name.as_str()), name);
        }
        assert_eq!(
            ToolName::from("delete_everything"),
            ToolName::Unknown("delete_everything".into())
        );
    }

    #[test]
    fn standard_catalog_is_unique_and_described() {
        let registry = ToolRegistry::standard();
        let mut names: Vec<_> = registry.specs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), 7);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 7);
        assert!(registry.specs().iter().all(|s| !s.description.is_empty()));
        assert!(registry
            .specs()
            .iter()
            .all(|s| s.input_schema["type"] == "object"));
    }

    #[test]
    fn validate_requires_fields() {
        let registry = ToolRegistry::standard();
        let err = registry
            .validate("read_document", &json!({"other": 1}))
            .unwrap_err();
        assert!(err.to_string().contains("document_id"));

        let err = registry
            .validate("read_document", &json!({"document_id": null}))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }

    #[test]
    fn validate_ignores_unknown_fields() {
        let registry = ToolRegistry::standard();
        let input = json!({"query": "dahlias", "colour": "red"});
        assert!(registry.validate("search_web", &input).is_ok());
    }

    #[test]
    fn validate_rejects_non_objects_and_unknown_tools() {
        let registry = ToolRegistry::standard();
        assert!(matches!(
            registry.validate("search_web", &json!("dahlias")),
            Err(ToolError::InvalidInput(_))
        ));
        assert!(matches!(
            registry.validate("nope", &json!({})),
            Err(ToolError::NotFound(_))
        ));
    }
}

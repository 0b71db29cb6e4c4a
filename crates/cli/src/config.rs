//! Configuration loading from draftsmith.toml.

use crate::error::{Error, Result};
use connectors::{BraveSearch, DEFAULT_BRAVE_ENDPOINT, GhostPublishingStore, LocalDocumentStore};
use dedupe::KeyPhrases;
use runtime::{AgentConfig, AnthropicAuth, AnthropicBackend, DEFAULT_MODEL, Services};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const CONFIG_FILE: &str = "draftsmith.toml";

pub const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";
pub const GHOST_KEY_VAR: &str = "GHOST_ADMIN_API_KEY";
pub const BRAVE_KEY_VAR: &str = "BRAVE_API_KEY";

/// Top-level configuration. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub agent: AgentSection,
    pub documents: DocumentsConfig,
    pub cms: CmsConfig,
    pub search: SearchConfig,
    pub dedupe: DedupeConfig,
    pub journal: JournalConfig,
}

/// Language model settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub model: String,

    /// Standard Anthropic API key. Mutually exclusive with auth_token.
    pub api_key: Option<String>,

    /// Bearer token for a gateway in front of the Messages API.
    /// Mutually exclusive with api_key.
    pub auth_token: Option<String>,

    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub base_url: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            auth_token: None,
            max_tokens: 4096,
            timeout_secs: 120,
            base_url: None,
        }
    }
}

/// Bounds for agent runs.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    pub max_iterations: u32,
    pub tool_timeout_secs: u64,
    /// Characters of tool output handed back to the model.
    pub max_tool_output: usize,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            tool_timeout_secs: 60,
            max_tool_output: 20_000,
        }
    }
}

/// Where source documents live.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    pub root: PathBuf,
    pub interviews_folder: String,
    pub ideas_folder: Option<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("documents"),
            interviews_folder: "interviews".to_string(),
            ideas_folder: Some("ideas".to_string()),
        }
    }
}

/// Ghost site the drafts go to.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    pub url: Option<String>,
    /// `<id>:<secret>` admin API key.
    pub admin_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub exclude_domains: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_BRAVE_ENDPOINT.to_string(),
            exclude_domains: Vec::new(),
        }
    }
}

/// Coverage vocabulary: an inline list, a file, or the built-in default.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DedupeConfig {
    pub key_phrases: Option<Vec<String>>,
    pub key_phrases_file: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Defaults to `runs.db` in the user data directory.
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load `explicit` if given, else `draftsmith.toml` when present, else
    /// defaults. Environment secrets are applied on top.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Override secrets from the environment. Empty values are ignored,
    /// and `ANTHROPIC_API_KEY` is not applied when `backend.auth_token` is set.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        // A configured gateway token wins over an ambient API key.
        if self.backend.auth_token.is_none()
            && let Some(key) = var(ANTHROPIC_KEY_VAR)
        {
            self.backend.api_key = Some(key);
        }
        if let Some(key) = var(GHOST_KEY_VAR) {
            self.cms.admin_api_key = Some(key);
        }
        if let Some(key) = var(BRAVE_KEY_VAR) {
            self.search.api_key = Some(key);
        }
    }

    /// Build the authentication from config.
    ///
    /// Requires exactly one of api_key or auth_token to be set.
    pub fn auth(&self) -> Result<AnthropicAuth> {
        match (&self.backend.api_key, &self.backend.auth_token) {
            (Some(key), None) => Ok(AnthropicAuth::ApiKey(key.clone())),
            (None, Some(token)) => Ok(AnthropicAuth::Bearer(token.clone())),
            (Some(_), Some(_)) => Err(Error::Config(
                "set either backend.api_key or backend.auth_token, not both".into(),
            )),
            (None, None) => Err(Error::Config(format!(
                "no model credentials: set {ANTHROPIC_KEY_VAR} or backend.api_key"
            ))),
        }
    }

    pub fn backend(&self) -> Result<AnthropicBackend> {
        let mut builder = AnthropicBackend::builder(self.auth()?, &self.backend.model)
            .max_tokens(self.backend.max_tokens)
            .timeout(Duration::from_secs(self.backend.timeout_secs));
        if let Some(url) = &self.backend.base_url {
            builder = builder.base_url(url);
        }
        Ok(builder.build()?)
    }

    pub fn agent_config(&self) -> AgentConfig {
        let mut config = AgentConfig {
            max_iterations: self.agent.max_iterations,
            model_timeout: Duration::from_secs(self.backend.timeout_secs),
            ..AgentConfig::default()
        };
        config.tools.timeout = Duration::from_secs(self.agent.tool_timeout_secs);
        config.tools.max_output = self.agent.max_tool_output;
        config
    }

    pub fn documents(&self) -> LocalDocumentStore {
        LocalDocumentStore::new(&self.documents.root)
    }

    pub fn publishing(&self) -> Result<GhostPublishingStore> {
        let url = self
            .cms
            .url
            .as_deref()
            .ok_or_else(|| Error::Config("cms.url is not set".into()))?;
        let key = self.cms.admin_api_key.as_deref().ok_or_else(|| {
            Error::Config(format!("no cms credentials: set {GHOST_KEY_VAR} or cms.admin_api_key"))
        })?;
        Ok(GhostPublishingStore::new(url, key)?)
    }

    /// A missing search key is not fatal; searches then fail as tool errors.
    pub fn search(&self) -> Result<BraveSearch> {
        Ok(BraveSearch::new(self.search.api_key.clone().unwrap_or_default())?
            .with_endpoint(&self.search.endpoint)
            .with_excluded_domains(&self.search.exclude_domains))
    }

    pub fn services(&self) -> Result<Services> {
        Ok(Services::new(
            Arc::new(self.documents()),
            Arc::new(self.publishing()?),
            Arc::new(self.search()?),
        ))
    }

    pub fn key_phrases(&self) -> Result<KeyPhrases> {
        if let Some(path) = &self.dedupe.key_phrases_file {
            return Ok(KeyPhrases::load(path)?);
        }
        match &self.dedupe.key_phrases {
            Some(list) => {
                let phrases = KeyPhrases::new(list);
                if phrases.is_empty() {
                    return Err(Error::Config("dedupe.key_phrases is empty".into()));
                }
                Ok(phrases)
            }
            None => Ok(KeyPhrases::default()),
        }
    }
}

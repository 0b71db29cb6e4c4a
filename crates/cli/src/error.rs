//! CLI error types.

use std::path::PathBuf;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The journal database does not exist.
    ///
    /// This typically means no run has been journaled yet.
    #[error("journal not found at {path}. Run 'draftsmith run' first")]
    JournalNotFound { path: PathBuf },

    /// No run was found matching the given prefix.
    #[error("no run found matching '{prefix}'")]
    RunNotFound { prefix: String },

    /// Multiple runs match the given prefix.
    ///
    /// The user should provide a longer prefix to disambiguate.
    #[error("multiple runs match '{prefix}': {matches:?}")]
    AmbiguousRun {
        prefix: String,
        matches: Vec<String>,
    },

    /// Configuration is invalid or missing required fields.
    #[error("config error: {0}")]
    Config(String),

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// A collaborator could not be reached or built.
    #[error(transparent)]
    Service(#[from] runtime::ServiceError),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),

    /// The key-phrase vocabulary could not be loaded.
    #[error(transparent)]
    Dedupe(#[from] dedupe::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<runtime::ModelError> for Error {
    fn from(err: runtime::ModelError) -> Self {
        Self::Runtime(err.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

use crate::model::ModelError;
use crate::services::ServiceError;
use thiserror::Error;

/// Errors that end an agent run or a generation.
///
/// Tool failures never show up here; they are handed back to the model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("\"{title}\" already exists as \"{existing}\"")]
    Duplicate { title: String, existing: String },
}

pub type Result<T> = std::result::Result<T, Error>;

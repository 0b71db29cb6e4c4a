//! Matcher configuration errors.

use thiserror::Error;

/// Errors raised while loading matcher configuration.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The vocabulary is unusable (e.g. every phrase is blank).
    #[error("invalid key phrases: {0}")]
    Invalid(String),

    /// Failed to parse a vocabulary file.
    #[error("failed to parse key phrases: {0}")]
    Parse(String),

    /// An I/O error occurred while reading the vocabulary.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

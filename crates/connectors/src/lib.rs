//! Concrete collaborators for the draftsmith runtime.
//!
//! - [`LocalDocumentStore`]: interview transcripts and idea notes kept as
//!   Markdown or text files, one sub-directory per folder.
//! - [`GhostPublishingStore`]: the Ghost Admin API.
//! - [`BraveSearch`]: the Brave web search API.

mod docs;
mod ghost;
mod http;
mod search;

pub use docs::LocalDocumentStore;
pub use ghost::GhostPublishingStore;
pub use search::{BraveSearch, DEFAULT_BRAVE_ENDPOINT};

//! Documents stored as files under a root directory.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use runtime::{DocumentStore, DocumentSummary, ServiceError};
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

const EXTENSIONS: &[&str] = &["md", "markdown", "txt"];
/// Only this much of a file is decoded when looking for its title.
const TITLE_SCAN_BYTES: usize = 4096;

/// A document store backed by a directory tree.
///
/// A folder id names a sub-directory of the root. A document id is the
/// path of the file relative to the root, e.g. `interviews/sarah.md`.
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `relative` inside the root, refusing anything that escapes it.
    fn resolve(&self, relative: &str) -> Result<PathBuf, ServiceError> {
        let path = Path::new(relative);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative.is_empty() || escapes {
            return Err(ServiceError::NotFound(relative.to_string()));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn list_documents(&self, folder_id: &str) -> Result<Vec<DocumentSummary>, ServiceError> {
        let dir = self.resolve(folder_id)?;
        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| io_error(folder_id, e))?;

        let mut documents = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(folder_id, e))?
        {
            let path = entry.path();
            if !is_document(&path) {
                continue;
            }
            let metadata = entry.metadata().await.map_err(|e| io_error(folder_id, e))?;
            if !metadata.is_file() {
                continue;
            }
            let bytes = fs::read(&path).await.map_err(|e| io_error(folder_id, e))?;
            let head = &bytes[..bytes.len().min(TITLE_SCAN_BYTES)];
            let file_name = entry.file_name().to_string_lossy().into_owned();

            documents.push(DocumentSummary {
                id: format!("{}/{file_name}", folder_id.trim_end_matches('/')),
                title: title_of(&String::from_utf8_lossy(head), &path),
                created_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        debug!(folder = folder_id, count = documents.len(), "listed documents");
        Ok(documents)
    }

    async fn get_document_text(&self, id: &str) -> Result<String, ServiceError> {
        let path = self.resolve(id)?;
        if !is_document(&path) {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        let bytes = fs::read(&path).await.map_err(|e| io_error(id, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// First non-empty line without heading markers, else the file stem.
fn title_of(text: &str, path: &Path) -> String {
    text.lines()
        .map(|line| line.trim().trim_start_matches('#').trim())
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_default()
}

fn io_error(what: &str, err: io::Error) -> ServiceError {
    match err.kind() {
        io::ErrorKind::NotFound => ServiceError::NotFound(what.to_string()),
        _ => ServiceError::Other(format!("{what}: {err}")),
    }
}

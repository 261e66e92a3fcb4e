//! Shared application state and the disk-backed `FileStore` (spec §6:
//! "file blobs in a flat content directory keyed by file_id").

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use db::{DbError, Repository};
use scheduler::Scheduler;
use services::{FileStore, LoadedFile, Services, ServiceError};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn Repository>,
    pub scheduler: Scheduler,
    pub services: Services,
    pub upload_dir: PathBuf,
}

/// Reads uploaded bytes from the content directory, looking up the stored
/// path/mime type through the repository. Stateless: re-reads from disk on
/// every call (spec §9 open question — extractors cache nothing).
pub struct DiskFileStore {
    repository: Arc<dyn Repository>,
}

impl DiskFileStore {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl FileStore for DiskFileStore {
    async fn load(&self, file_id: Uuid) -> Result<LoadedFile, ServiceError> {
        let file = self.repository.get_uploaded_file(file_id).await.map_err(|err| match err {
            DbError::NotFound => ServiceError::FileNotFound(file_id),
            other => ServiceError::Io(other.to_string()),
        })?;

        let bytes = tokio::fs::read(&file.path).await.map_err(|e| ServiceError::Io(e.to_string()))?;

        Ok(LoadedFile { mime_type: file.mime_type, size_bytes: file.size_bytes as u64, bytes })
    }
}

/// Path the uploaded file's bytes are written to under `upload_dir`.
pub fn content_path(upload_dir: &Path, file_id: Uuid) -> PathBuf {
    upload_dir.join(file_id.to_string())
}

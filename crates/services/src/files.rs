//! File store capability — the "PDF store" named in spec §4.2's services
//! bundle. Defined here (not in `db`) so `nodes` can depend on a capability
//! trait without depending on the persistence layer; `engine` wires a
//! repository-backed implementation at startup.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ServiceError;

/// An uploaded file's metadata plus its bytes, read fresh on every call
/// (spec §9 open question: extractors are stateless, no caching by `file_id`).
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub mime_type: String,
    pub size_bytes: u64,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn load(&self, file_id: Uuid) -> Result<LoadedFile, ServiceError>;
}

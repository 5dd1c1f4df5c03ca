use async_trait::async_trait;
use thiserror::Error;

pub mod in_memory;
pub mod naming;
pub mod sas;

/// Stable address of a stored object. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocator {
    pub container: String,
    pub key: String,
    pub created_at_millis: i64,
}

#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    pub content_type: String,
    pub etag: String,
    pub size: u64,
    pub last_modified_unix_secs: i64,
}

/// Access level a container is created with. Public-read containers serve
/// objects at their base URL without a signature; private containers
/// require a signed access grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerAccess {
    Private,
    PublicRead,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),
    #[error("object not found: {container}/{key}")]
    ObjectNotFound { container: String, key: String },
    #[error("invalid object name: {0}")]
    InvalidName(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Blob storage seam. One network round-trip per call, no retries; the
/// caller owns retry/backoff policy.
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Create-if-absent. Safe under concurrent first-callers; returns
    /// whether the container was newly created. The access mode of an
    /// existing container is left untouched.
    async fn ensure_container(
        &self,
        container: &str,
        access: ContainerAccess,
    ) -> Result<bool, StorageError>;

    /// Write an object, lazily creating its container. Last write wins on
    /// equal keys.
    async fn put_object(
        &self,
        container: &str,
        key: &str,
        data: bytes::Bytes,
        content_type: &str,
    ) -> Result<ObjectLocator, StorageError>;

    async fn get_object(
        &self,
        container: &str,
        key: &str,
    ) -> Result<(bytes::Bytes, ObjectMetadata), StorageError>;

    async fn object_exists(&self, container: &str, key: &str) -> Result<bool, StorageError>;

    async fn container_access(&self, container: &str) -> Result<ContainerAccess, StorageError>;

    async fn list_containers(&self) -> Result<Vec<String>, StorageError>;
}

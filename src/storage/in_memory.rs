use crate::storage::{
    BlobStore, ContainerAccess, ObjectLocator, ObjectMetadata, StorageError,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    meta: ObjectMetadata,
}

/// In-memory blob store.
///
/// Data structures:
/// - `containers`: container name => access mode
/// - `objects`: BTreeMap keyed by (container, key) => StoredObject
///
/// BTreeMap gives deterministic iteration order, which keeps tests and
/// container listings predictable.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStore {
    containers: Arc<RwLock<BTreeMap<String, ContainerAccess>>>,
    objects: Arc<RwLock<BTreeMap<(String, String), StoredObject>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn validate_container(container: &str) -> Result<(), StorageError> {
    if container.is_empty() {
        return Err(StorageError::InvalidInput(
            "container must be non-empty".into(),
        ));
    }
    Ok(())
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidInput("key must be non-empty".into()));
    }
    Ok(())
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn ensure_container(
        &self,
        container: &str,
        access: ContainerAccess,
    ) -> Result<bool, StorageError> {
        validate_container(container)?;
        let mut c = self.containers.write().await;
        if c.contains_key(container) {
            return Ok(false);
        }
        c.insert(container.to_string(), access);
        Ok(true)
    }

    async fn put_object(
        &self,
        container: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<ObjectLocator, StorageError> {
        validate_container(container)?;
        validate_key(key)?;
        if content_type.is_empty() {
            return Err(StorageError::InvalidInput(
                "content_type must be non-empty".into(),
            ));
        }

        // Lazy create-if-absent; concurrent first writers must not fail
        // each other.
        {
            let mut c = self.containers.write().await;
            c.entry(container.to_string())
                .or_insert(ContainerAccess::Private);
        }

        let now = Utc::now();
        let size = data.len() as u64;
        let digest = md5::compute(&data);
        let meta = ObjectMetadata {
            content_type: content_type.to_string(),
            etag: format!("{:x}", digest),
            size,
            last_modified_unix_secs: now.timestamp(),
        };

        let mut objs = self.objects.write().await;
        objs.insert(
            (container.to_string(), key.to_string()),
            StoredObject { data, meta },
        );

        Ok(ObjectLocator {
            container: container.to_string(),
            key: key.to_string(),
            created_at_millis: now.timestamp_millis(),
        })
    }

    async fn get_object(
        &self,
        container: &str,
        key: &str,
    ) -> Result<(Bytes, ObjectMetadata), StorageError> {
        validate_container(container)?;
        validate_key(key)?;
        let objs = self.objects.read().await;
        let obj = objs
            .get(&(container.to_string(), key.to_string()))
            .ok_or_else(|| StorageError::ObjectNotFound {
                container: container.to_string(),
                key: key.to_string(),
            })?;
        Ok((obj.data.clone(), obj.meta.clone()))
    }

    async fn object_exists(&self, container: &str, key: &str) -> Result<bool, StorageError> {
        validate_container(container)?;
        validate_key(key)?;
        let objs = self.objects.read().await;
        Ok(objs.contains_key(&(container.to_string(), key.to_string())))
    }

    async fn container_access(&self, container: &str) -> Result<ContainerAccess, StorageError> {
        validate_container(container)?;
        let c = self.containers.read().await;
        c.get(container)
            .copied()
            .ok_or_else(|| StorageError::ContainerNotFound(container.to_string()))
    }

    async fn list_containers(&self) -> Result<Vec<String>, StorageError> {
        let c = self.containers.read().await;
        Ok(c.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_roundtrip() {
        let store = InMemoryBlobStore::new();
        let loc = store
            .put_object("videos", "k1", Bytes::from_static(b"hello"), "video/mp4")
            .await
            .unwrap();
        assert_eq!(loc.container, "videos");
        assert_eq!(loc.key, "k1");

        let (data, meta) = store.get_object("videos", "k1").await.unwrap();
        assert_eq!(&data[..], b"hello");
        assert_eq!(meta.size, 5);
        assert_eq!(meta.content_type, "video/mp4");
    }

    #[tokio::test]
    async fn ensure_container_is_idempotent() {
        let store = InMemoryBlobStore::new();
        assert!(store
            .ensure_container("videos", ContainerAccess::Private)
            .await
            .unwrap());
        assert!(!store
            .ensure_container("videos", ContainerAccess::Private)
            .await
            .unwrap());
        assert_eq!(
            store.container_access("videos").await.unwrap(),
            ContainerAccess::Private
        );
    }

    #[tokio::test]
    async fn ensure_container_keeps_existing_access_mode() {
        let store = InMemoryBlobStore::new();
        store
            .ensure_container("thumbnails", ContainerAccess::PublicRead)
            .await
            .unwrap();
        store
            .ensure_container("thumbnails", ContainerAccess::Private)
            .await
            .unwrap();
        assert_eq!(
            store.container_access("thumbnails").await.unwrap(),
            ContainerAccess::PublicRead
        );
    }

    #[tokio::test]
    async fn put_creates_container_lazily() {
        let store = InMemoryBlobStore::new();
        store
            .put_object("fresh", "k", Bytes::from_static(b"x"), "text/plain")
            .await
            .unwrap();
        assert_eq!(
            store.container_access("fresh").await.unwrap(),
            ContainerAccess::Private
        );
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let store = InMemoryBlobStore::new();
        store
            .ensure_container("videos", ContainerAccess::Private)
            .await
            .unwrap();
        assert!(!store.object_exists("videos", "nope").await.unwrap());
        let err = store.get_object("videos", "nope").await.unwrap_err();
        assert!(matches!(err, StorageError::ObjectNotFound { .. }));
    }

    #[tokio::test]
    async fn last_write_wins_on_equal_keys() {
        let store = InMemoryBlobStore::new();
        store
            .put_object("videos", "k", Bytes::from_static(b"one"), "text/plain")
            .await
            .unwrap();
        store
            .put_object("videos", "k", Bytes::from_static(b"two"), "text/plain")
            .await
            .unwrap();
        let (data, _) = store.get_object("videos", "k").await.unwrap();
        assert_eq!(&data[..], b"two");
    }
}

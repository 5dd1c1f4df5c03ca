use crate::catalog::metadata::MetadataStore;
use crate::catalog::taxonomy::CategoryStore;
use crate::catalog::uploads::UploadStore;
use crate::storage::sas::UrlSigner;
use crate::storage::BlobStore;
use chrono::Duration;
use std::sync::Arc;

/// Shared components handed to every request handler. Built once at
/// startup; everything here is cheap to clone and safe for concurrent use.
#[derive(Clone)]
pub struct BaseHandler {
    pub storage: Arc<dyn BlobStore>,
    pub signer: Arc<UrlSigner>,
    pub categories: CategoryStore,
    pub metadata: MetadataStore,
    pub uploads: UploadStore,
    pub video_container: String,
    pub thumbnail_container: String,
    pub sas_ttl: Duration,
}

impl BaseHandler {
    pub fn new(
        storage: Arc<dyn BlobStore>,
        signer: Arc<UrlSigner>,
        video_container: impl Into<String>,
        thumbnail_container: impl Into<String>,
        sas_ttl: Duration,
    ) -> Self {
        Self {
            storage,
            signer,
            categories: CategoryStore::new(),
            metadata: MetadataStore::new(),
            uploads: UploadStore::new(),
            video_container: video_container.into(),
            thumbnail_container: thumbnail_container.into(),
            sas_ttl,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// One row per stored object, written at upload time. Listings re-derive
/// access URLs rather than serving the one issued at upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub file_name: String,
    pub original_name: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Page/limit pair as received from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub q: Option<String>,
}

impl PageParams {
    /// Clamp to page >= 1 and 1 <= limit <= 100 (default 20).
    pub fn clamped(&self) -> (usize, usize) {
        let page = self.page.unwrap_or(1).max(1) as usize;
        let limit = self.limit.unwrap_or(20).clamp(1, 100) as usize;
        (page, limit)
    }
}

#[derive(Debug, Clone, Default)]
pub struct UploadStore {
    records: Arc<RwLock<Vec<UploadRecord>>>,
}

impl UploadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, record: UploadRecord) {
        let mut records = self.records.write().await;
        records.push(record);
    }

    /// Newest-first page of records, optionally filtered by a
    /// case-insensitive substring match on the original name. The second
    /// return value reports whether a further page may exist.
    pub async fn list(
        &self,
        query: Option<&str>,
        page: usize,
        limit: usize,
    ) -> (Vec<UploadRecord>, bool) {
        let needle = query.map(str::trim).filter(|q| !q.is_empty()).map(|q| q.to_lowercase());

        let records = self.records.read().await;
        let mut matched: Vec<UploadRecord> = records
            .iter()
            .filter(|r| match &needle {
                Some(n) => r.original_name.to_lowercase().contains(n),
                None => true,
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));

        let skip = (page - 1) * limit;
        let items: Vec<UploadRecord> = matched.into_iter().skip(skip).take(limit).collect();
        let has_more = items.len() == limit;
        (items, has_more)
    }
}

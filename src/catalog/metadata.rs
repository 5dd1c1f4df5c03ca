use crate::catalog::ids::id_candidates;
use crate::catalog::CatalogError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInfo {
    pub file_name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub duration: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_id: Option<String>,
    #[serde(default)]
    pub path: Vec<String>,
}

/// Stored descriptive record for one uploaded video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub video: VideoInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnail>,
    pub title: String,
    #[serde(default)]
    pub instructor: String,
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub announcement: String,
    pub uploaded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPatch {
    pub file_name: Option<String>,
    pub url: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThumbnailPatch {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    pub major_id: Option<String>,
    pub middle_id: Option<String>,
    pub minor_id: Option<String>,
    pub path: Option<Vec<String>>,
}

/// Incoming create/update payload. Every field is optional so updates can
/// express "leave untouched" (absent) versus "overwrite" (present, even
/// when empty).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDraft {
    pub video: Option<VideoPatch>,
    pub thumbnail: Option<ThumbnailPatch>,
    pub title: Option<String>,
    pub instructor: Option<String>,
    pub estimated_time: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub category: Option<CategoryPatch>,
    pub tags: Option<Vec<String>>,
    pub announcement: Option<String>,
    pub uploaded_at: Option<DateTime<Utc>>,
}

/// Optional category filter for listings; present fields are ANDed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFilter {
    pub major_id: Option<String>,
    pub middle_id: Option<String>,
    pub minor_id: Option<String>,
}

impl MetadataFilter {
    fn matches(&self, record: &VideoRecord) -> bool {
        let category = record.category.as_ref();
        let field_matches = |want: &Option<String>, got: Option<&String>| match want {
            Some(w) => got == Some(w),
            None => true,
        };
        field_matches(&self.major_id, category.and_then(|c| c.major_id.as_ref()))
            && field_matches(&self.middle_id, category.and_then(|c| c.middle_id.as_ref()))
            && field_matches(&self.minor_id, category.and_then(|c| c.minor_id.as_ref()))
    }
}

fn category_from_patch(patch: CategoryPatch) -> CategoryRef {
    CategoryRef {
        major_id: patch.major_id,
        middle_id: patch.middle_id,
        minor_id: patch.minor_id,
        path: patch.path.unwrap_or_default(),
    }
}

/// Video metadata records keyed by their store-assigned id.
#[derive(Debug, Clone, Default)]
pub struct MetadataStore {
    records: Arc<RwLock<BTreeMap<String, VideoRecord>>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, draft: VideoDraft) -> Result<String, CatalogError> {
        let title = draft.title.filter(|t| !t.is_empty());
        let file_name = draft
            .video
            .as_ref()
            .and_then(|v| v.file_name.clone())
            .filter(|f| !f.is_empty());
        let (Some(title), Some(file_name)) = (title, file_name) else {
            return Err(CatalogError::Validation(
                "title and video.fileName are required".into(),
            ));
        };

        let video = draft.video.unwrap_or_default();
        let now = Utc::now();
        let record = VideoRecord {
            id: Uuid::new_v4().simple().to_string(),
            video: VideoInfo {
                file_name,
                url: video.url.unwrap_or_default(),
                duration: video.duration.unwrap_or_default(),
            },
            thumbnail: draft
                .thumbnail
                .and_then(|t| t.url)
                .filter(|u| !u.is_empty())
                .map(|url| Thumbnail { url }),
            title,
            instructor: draft.instructor.unwrap_or_default(),
            estimated_time: draft.estimated_time.unwrap_or_default(),
            summary: draft.summary.unwrap_or_default(),
            description: draft.description.unwrap_or_default(),
            category: draft.category.map(category_from_patch),
            tags: draft.tags.unwrap_or_default(),
            announcement: draft.announcement.unwrap_or_default(),
            uploaded_at: draft.uploaded_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };

        let id = record.id.clone();
        let mut records = self.records.write().await;
        records.insert(id.clone(), record);
        Ok(id)
    }

    /// Records matching the filter, newest first by creation time.
    pub async fn list(&self, filter: &MetadataFilter) -> Vec<VideoRecord> {
        let records = self.records.read().await;
        let mut out: Vec<VideoRecord> = records
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    pub async fn get_by_id(&self, id_param: &str) -> Result<VideoRecord, CatalogError> {
        let records = self.records.read().await;
        for candidate in id_candidates(id_param) {
            if let Some(record) = records.get(&candidate) {
                return Ok(record.clone());
            }
        }
        Err(CatalogError::NotFound(id_param.to_string()))
    }

    /// Field-level partial update. Present scalars replace the stored
    /// value (present-but-empty overwrites); present sub-objects replace
    /// the stored sub-object wholesale, built only from the supplied
    /// inner fields. Supplying `video.url` alone therefore drops the
    /// stored `video.fileName`.
    pub async fn update_by_id(
        &self,
        id_param: &str,
        draft: VideoDraft,
    ) -> Result<(), CatalogError> {
        let mut records = self.records.write().await;
        for candidate in id_candidates(id_param) {
            if let Some(record) = records.get_mut(&candidate) {
                apply_patch(record, draft);
                record.updated_at = Utc::now();
                return Ok(());
            }
        }
        Err(CatalogError::NotFound(id_param.to_string()))
    }

    pub async fn delete_by_id(&self, id_param: &str) -> Result<u64, CatalogError> {
        let mut records = self.records.write().await;
        for candidate in id_candidates(id_param) {
            if records.remove(&candidate).is_some() {
                return Ok(1);
            }
        }
        Err(CatalogError::NotFound(id_param.to_string()))
    }
}

fn apply_patch(record: &mut VideoRecord, draft: VideoDraft) {
    if let Some(title) = draft.title {
        record.title = title;
    }
    if let Some(instructor) = draft.instructor {
        record.instructor = instructor;
    }
    if let Some(estimated_time) = draft.estimated_time {
        record.estimated_time = estimated_time;
    }
    if let Some(summary) = draft.summary {
        record.summary = summary;
    }
    if let Some(description) = draft.description {
        record.description = description;
    }
    if let Some(tags) = draft.tags {
        record.tags = tags;
    }
    if let Some(announcement) = draft.announcement {
        record.announcement = announcement;
    }
    if let Some(uploaded_at) = draft.uploaded_at {
        record.uploaded_at = uploaded_at;
    }
    // Sub-objects are replaced whole, not deep-merged. Inner fields the
    // caller left out are reset, matching the observed contract.
    if let Some(video) = draft.video {
        record.video = VideoInfo {
            file_name: video.file_name.unwrap_or_default(),
            url: video.url.unwrap_or_default(),
            duration: video.duration.unwrap_or_default(),
        };
    }
    if let Some(thumbnail) = draft.thumbnail {
        record.thumbnail = Some(Thumbnail {
            url: thumbnail.url.unwrap_or_default(),
        });
    }
    if let Some(category) = draft.category {
        record.category = Some(category_from_patch(category));
    }
}

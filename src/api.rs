use crate::catalog::metadata::{MetadataFilter, VideoDraft};
use crate::catalog::taxonomy::CategoryNode;
use crate::catalog::uploads::{PageParams, UploadRecord};
use crate::catalog::{CatalogError, CategoryKind};
use crate::handler::BaseHandler;
use crate::observability::{health, metrics};
use crate::storage::{naming, ContainerAccess, StorageError};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// HTTP handler wrapping BaseHandler
#[derive(Clone)]
pub struct ApiHandler {
    handler: Arc<BaseHandler>,
}

impl ApiHandler {
    pub fn new(handler: BaseHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Create the router for the HTTP API
    pub fn router(self) -> Router {
        Router::new()
            .route("/healthz", get(healthz))
            .route("/metrics", get(metrics_text))
            .route("/api/upload", post(upload_video))
            .route("/api/upload-thumbnail", post(upload_thumbnail))
            .route("/api/videos", get(list_videos))
            .route("/api/video-sas/:file_name", get(video_sas))
            .route("/api/categories", post(create_category))
            .route(
                "/api/categories/:kind",
                get(list_categories).delete(delete_category),
            )
            .route("/api/categories/middle/:major_id", get(list_middle_by_major))
            .route(
                "/api/categories/minor/:major_id/:middle_id",
                get(list_minor_by_parents),
            )
            .route("/api/metadata", post(create_metadata).get(list_metadata))
            .route(
                "/api/metadata/:id",
                get(get_metadata).put(update_metadata).delete(delete_metadata),
            )
            .with_state(self.handler)
    }
}

#[derive(Debug)]
enum ApiError {
    Validation(String),
    NotFound(String),
    Conflict(String),
    Unavailable(String),
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::ContainerNotFound(c) => {
                ApiError::NotFound(format!("container not found: {c}"))
            }
            StorageError::ObjectNotFound { container, key } => {
                ApiError::NotFound(format!("object not found: {container}/{key}"))
            }
            StorageError::InvalidName(n) => ApiError::Validation(format!("invalid name: {n}")),
            StorageError::InvalidInput(msg) => ApiError::Validation(msg),
            StorageError::Unavailable(msg) => ApiError::Unavailable(msg),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Validation(msg) => ApiError::Validation(msg),
            CatalogError::NotFound(what) => ApiError::NotFound(format!("not found: {what}")),
            CatalogError::AlreadyExists(what) => {
                ApiError::Conflict(format!("already exists: {what}"))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

fn content_type_or(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(fallback)
        .to_string()
}

#[derive(Deserialize)]
struct UploadQuery {
    filename: Option<String>,
}

/// POST /api/upload?filename= - store a video object, return its key and
/// a time-limited read URL
async fn upload_video(
    State(handler): State<Arc<BaseHandler>>,
    Query(params): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if body.is_empty() {
        return Err(ApiError::Validation("file payload is required".into()));
    }
    let original = params.filename.unwrap_or_else(|| "upload.bin".to_string());
    let content_type = content_type_or(&headers, "application/octet-stream");
    let size = body.len() as u64;

    handler
        .storage
        .ensure_container(&handler.video_container, ContainerAccess::Private)
        .await?;

    let key = naming::unique_object_key(&original)?;
    let locator = handler
        .storage
        .put_object(&handler.video_container, &key, body, &content_type)
        .await?;

    let url = handler
        .signer
        .read_url(&handler.video_container, &locator.key, handler.sas_ttl);

    handler
        .uploads
        .record(UploadRecord {
            file_name: locator.key.clone(),
            original_name: original,
            content_type,
            size,
            uploaded_at: Utc::now(),
        })
        .await;

    metrics::record_upload(&handler.video_container, size);
    metrics::record_grant_issued(&handler.video_container);
    tracing::info!(key = %locator.key, size, "stored video object");

    Ok(Json(json!({ "fileName": locator.key, "url": url })))
}

/// POST /api/upload-thumbnail?filename= - store into the public-read
/// container and return the anonymous URL
async fn upload_thumbnail(
    State(handler): State<Arc<BaseHandler>>,
    Query(params): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if body.is_empty() {
        return Err(ApiError::Validation("file payload is required".into()));
    }
    let original = params
        .filename
        .unwrap_or_else(|| "thumbnail.png".to_string());
    let content_type = content_type_or(&headers, "image/png");
    let size = body.len() as u64;

    handler
        .storage
        .ensure_container(&handler.thumbnail_container, ContainerAccess::PublicRead)
        .await?;

    let key = naming::unique_object_key(&original)?;
    let locator = handler
        .storage
        .put_object(&handler.thumbnail_container, &key, body, &content_type)
        .await?;

    metrics::record_upload(&handler.thumbnail_container, size);
    tracing::info!(key = %locator.key, size, "stored thumbnail object");

    // Public-read container: the base URL is the whole grant.
    let url = handler
        .signer
        .base_url(&handler.thumbnail_container, &locator.key);
    Ok(Json(json!({ "url": url })))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoListing {
    #[serde(flatten)]
    record: UploadRecord,
    url: String,
}

/// GET /api/videos?page=&limit=&q= - newest-first upload listing with
/// fresh read URLs
async fn list_videos(
    State(handler): State<Arc<BaseHandler>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let (page, limit) = params.clamped();
    let (records, has_more) = handler
        .uploads
        .list(params.q.as_deref(), page, limit)
        .await;

    let items: Vec<VideoListing> = records
        .into_iter()
        .map(|record| {
            let url = handler
                .signer
                .read_url(&handler.video_container, &record.file_name, handler.sas_ttl);
            metrics::record_grant_issued(&handler.video_container);
            VideoListing { record, url }
        })
        .collect();

    Ok(Json(json!({
        "items": items,
        "page": page,
        "limit": limit,
        "hasMore": has_more,
    })))
}

/// GET /api/video-sas/:file_name - signed read URL for an existing object
async fn video_sas(
    State(handler): State<Arc<BaseHandler>>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let safe = file_name.trim_start_matches(['/', '\\']);
    if safe.is_empty() {
        return Err(ApiError::Validation("file name is required".into()));
    }

    let exists = handler
        .storage
        .object_exists(&handler.video_container, safe)
        .await?;
    if !exists {
        return Err(ApiError::NotFound(format!("file not found: {safe}")));
    }

    let url = handler
        .signer
        .read_url(&handler.video_container, safe, handler.sas_ttl);
    metrics::record_grant_issued(&handler.video_container);
    Ok(Json(json!({ "url": url })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryDraft {
    #[serde(rename = "_id")]
    id: Option<String>,
    org_id: Option<String>,
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<CategoryKind>,
    parent_id: Option<String>,
    path: Option<Vec<String>>,
}

/// POST /api/categories - create a taxonomy node with a caller-assigned id
async fn create_category(
    State(handler): State<Arc<BaseHandler>>,
    Json(draft): Json<CategoryDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(id), Some(name), Some(kind)) = (draft.id, draft.name, draft.kind) else {
        return Err(ApiError::Validation(
            "_id, name and type are required".into(),
        ));
    };

    let node = CategoryNode {
        id,
        org_id: draft.org_id,
        name,
        kind,
        parent_id: draft.parent_id,
        path: draft.path.unwrap_or_default(),
    };
    let category = handler.categories.create(node).await?;
    metrics::record_catalog_op("categories", "create");
    Ok(Json(json!({ "success": true, "category": category })))
}

/// GET /api/categories/:kind - all nodes of one level, name-ascending
async fn list_categories(
    State(handler): State<Arc<BaseHandler>>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let kind: CategoryKind = kind.parse()?;
    let items = handler.categories.list_by_kind(kind).await;
    Ok(Json(json!({ "items": items })))
}

/// GET /api/categories/middle/:major_id - middle nodes under a major node
async fn list_middle_by_major(
    State(handler): State<Arc<BaseHandler>>,
    Path(major_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if major_id.is_empty() {
        return Err(ApiError::Validation("majorId is required".into()));
    }
    let items = handler
        .categories
        .list_by_ancestor(CategoryKind::Middle, &major_id)
        .await;
    Ok(Json(json!({ "items": items })))
}

/// GET /api/categories/minor/:major_id/:middle_id - minor nodes whose path
/// contains both ancestors
async fn list_minor_by_parents(
    State(handler): State<Arc<BaseHandler>>,
    Path((major_id, middle_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    if major_id.is_empty() || middle_id.is_empty() {
        return Err(ApiError::Validation(
            "majorId and middleId are required".into(),
        ));
    }
    let items = handler
        .categories
        .list_by_ancestors(CategoryKind::Minor, &[major_id, middle_id])
        .await;
    Ok(Json(json!({ "items": items })))
}

/// DELETE /api/categories/:id - id may be raw or URL-safe base64
async fn delete_category(
    State(handler): State<Arc<BaseHandler>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = handler.categories.delete_by_id(&id).await?;
    metrics::record_catalog_op("categories", "delete");
    Ok(Json(json!({ "success": true, "deletedCount": deleted })))
}

/// POST /api/metadata
async fn create_metadata(
    State(handler): State<Arc<BaseHandler>>,
    Json(draft): Json<VideoDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let id = handler.metadata.create(draft).await?;
    metrics::record_catalog_op("metadata", "create");
    Ok(Json(json!({ "success": true, "id": id })))
}

/// GET /api/metadata?majorId=&middleId=&minorId= - filters are ANDed
async fn list_metadata(
    State(handler): State<Arc<BaseHandler>>,
    Query(filter): Query<MetadataFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let items = handler.metadata.list(&filter).await;
    Ok(Json(json!({ "items": items })))
}

/// GET /api/metadata/:id - id may be raw or URL-safe base64
async fn get_metadata(
    State(handler): State<Arc<BaseHandler>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = handler.metadata.get_by_id(&id).await?;
    Ok(Json(record))
}

/// PUT /api/metadata/:id - field-level partial update
async fn update_metadata(
    State(handler): State<Arc<BaseHandler>>,
    Path(id): Path<String>,
    Json(draft): Json<VideoDraft>,
) -> Result<impl IntoResponse, ApiError> {
    handler.metadata.update_by_id(&id, draft).await?;
    metrics::record_catalog_op("metadata", "update");
    Ok(Json(json!({
        "success": true,
        "matchedCount": 1,
        "modifiedCount": 1,
    })))
}

/// DELETE /api/metadata/:id
async fn delete_metadata(
    State(handler): State<Arc<BaseHandler>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = handler.metadata.delete_by_id(&id).await?;
    metrics::record_catalog_op("metadata", "delete");
    Ok(Json(json!({ "success": true, "deletedCount": deleted })))
}

/// GET /healthz
async fn healthz(State(handler): State<Arc<BaseHandler>>) -> impl IntoResponse {
    let status = health::get_health_status(&handler).await;
    let code = if status.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// GET /metrics - prometheus text exposition
async fn metrics_text() -> Response {
    match metrics::render() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => ApiError::Internal(format!("metrics encoding failed: {e}")).into_response(),
    }
}

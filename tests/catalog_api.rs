use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Duration;
use clipstore::api::ApiHandler;
use clipstore::catalog::ids::encode_id;
use clipstore::handler::BaseHandler;
use clipstore::storage::in_memory::InMemoryBlobStore;
use clipstore::storage::sas::{SharedKeyCredential, UrlSigner};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const CONN: &str = "AccountName=mediaacct;AccountKey=dGhpcy1pcy1hLXRlc3Qta2V5;";

fn app() -> Router {
    let storage = Arc::new(InMemoryBlobStore::new());
    let signer = Arc::new(UrlSigner::new(
        SharedKeyCredential::from_connection_string(CONN).unwrap(),
    ));
    let handler = BaseHandler::new(
        storage,
        signer,
        "videos",
        "thumbnails",
        Duration::minutes(60),
    );
    ApiHandler::new(handler).router()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn category(id: &str, name: &str, kind: &str, path: &[&str]) -> Value {
    json!({
        "_id": id,
        "orgId": "org001",
        "name": name,
        "type": kind,
        "path": path,
    })
}

async fn seed_taxonomy(app: &Router) {
    for (id, name, kind, path) in [
        ("cat001", "Tech", "major", vec!["cat001"]),
        ("cat002", "Databases", "middle", vec!["cat001", "cat002"]),
        ("cat099", "Networking", "middle", vec!["cat001", "cat099"]),
        ("cat003", "Postgres", "minor", vec!["cat001", "cat002", "cat003"]),
        ("cat004", "Redis", "minor", vec!["cat001", "cat099", "cat004"]),
    ] {
        let (status, _) = send(
            app,
            "POST",
            "/api/categories",
            Some(category(id, name, kind, &path)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn category_crud_round_trip() {
    let app = app();

    let (status, json) = send(
        &app,
        "POST",
        "/api/categories",
        Some(category("cat001", "Tech", "major", &[])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    // path defaults to the node's own id
    assert_eq!(json["category"]["path"], json!(["cat001"]));

    // duplicate id conflicts
    let (status, _) = send(
        &app,
        "POST",
        "/api/categories",
        Some(category("cat001", "Tech again", "major", &[])),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = send(&app, "GET", "/api/categories/major", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["items"].as_array().unwrap().len(), 1);

    // delete with the base64url form of the id
    let encoded = encode_id("cat001");
    let (status, json) = send(&app, "DELETE", &format!("/api/categories/{encoded}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deletedCount"], 1);

    let (status, _) = send(&app, "DELETE", "/api/categories/cat001", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn hierarchy_queries_use_path_containment() {
    let app = app();
    seed_taxonomy(&app).await;

    let (status, json) = send(&app, "GET", "/api/categories/middle/cat001", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Databases", "Networking"]);

    // only the minor under both cat001 and cat002 matches
    let (status, json) = send(&app, "GET", "/api/categories/minor/cat001/cat002", None).await;
    assert_eq!(status, StatusCode::OK);
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["_id"], "cat003");
}

#[tokio::test]
async fn metadata_crud_and_lossy_sub_object_update() {
    let app = app();

    let draft = json!({
        "title": "Intro to Databases",
        "instructor": "Ada",
        "video": { "fileName": "intro.mp4", "url": "http://old", "duration": "600" },
        "category": { "majorId": "cat001", "middleId": "cat002", "path": ["cat001", "cat002"] },
        "tags": ["db", "intro"],
    });
    let (status, json) = send(&app, "POST", "/api/metadata", Some(draft)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let id = json["id"].as_str().unwrap().to_string();

    // fetch with the encoded id form
    let encoded = encode_id(&id);
    let (status, record) = send(&app, "GET", &format!("/api/metadata/{encoded}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["_id"], id.as_str());
    assert_eq!(record["video"]["fileName"], "intro.mp4");

    // partial update: scalar merges, sub-object replaces wholesale
    let patch = json!({
        "title": "Intro to Databases v2",
        "video": { "url": "http://new" },
    });
    let (status, json) = send(&app, "PUT", &format!("/api/metadata/{id}"), Some(patch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["matchedCount"], 1);

    let (_, record) = send(&app, "GET", &format!("/api/metadata/{id}"), None).await;
    assert_eq!(record["title"], "Intro to Databases v2");
    assert_eq!(record["instructor"], "Ada");
    assert_eq!(record["video"]["url"], "http://new");
    // fileName and duration were dropped by the whole-object replace
    assert_eq!(record["video"]["fileName"], "");
    assert_eq!(record["video"]["duration"], "");

    let (status, json) = send(&app, "DELETE", &format!("/api/metadata/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["deletedCount"], 1);

    let (status, _) = send(&app, "GET", &format!("/api/metadata/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metadata_listing_filters_by_category() {
    let app = app();

    for (title, major, middle) in [
        ("A", "cat001", "cat002"),
        ("B", "cat001", "cat099"),
        ("C", "cat777", "cat888"),
    ] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/metadata",
            Some(json!({
                "title": title,
                "video": { "fileName": format!("{title}.mp4") },
                "category": { "majorId": major, "middleId": middle },
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, json) = send(&app, "GET", "/api/metadata?majorId=cat001", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["items"].as_array().unwrap().len(), 2);

    let (_, json) = send(
        &app,
        "GET",
        "/api/metadata?majorId=cat001&middleId=cat002",
        None,
    )
    .await;
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "A");
}

#[tokio::test]
async fn metadata_create_requires_title_and_file_name() {
    let app = app();

    let (status, _) = send(
        &app,
        "POST",
        "/api/metadata",
        Some(json!({ "title": "No video here" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/metadata",
        Some(json!({ "video": { "fileName": "orphan.mp4" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use sharelist::build_router;
use sharelist::config::UploadConfig;
use sharelist::db::Database;
use sharelist::handler::AppState;
use sharelist::images::ImageStore;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "sharelist-test-boundary";

struct TestApp {
    dir: TempDir,
    router: Router,
}

impl TestApp {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = Database::open(&dir.path().join("api.db"), None).await.unwrap();
        let uploads = UploadConfig {
            dir: dir.path().join("uploads"),
            ..UploadConfig::default()
        };
        let images = ImageStore::new(&uploads);
        let state = AppState {
            db: Arc::new(db),
            images: Arc::new(images),
        };
        let router = build_router(state, &uploads);
        TestApp { dir, router }
    }

    fn upload_path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join("uploads").join(name)
    }

    async fn send(&self, req: Request<Body>) -> (StatusCode, Vec<u8>, Option<String>) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec(), location)
    }

    async fn json(&self, req: Request<Body>) -> (StatusCode, Value) {
        let (status, body, _) = self.send(req).await;
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create_list(&self) -> String {
        let req = Request::post("/create_list").body(Body::empty()).unwrap();
        let (status, _, location) = self.send(req).await;
        assert!(status.is_redirection());
        let location = location.unwrap();
        location.trim_start_matches("/list/").to_string()
    }
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

fn multipart(method: &str, uri: &str, parts: &[Part]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
                );
            }
            Part::File(filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn urlencoded(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_home_and_list_pages() {
    let app = TestApp::new().await;

    let (status, body, _) = app.send(get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&body).contains("/create_list"));

    let share_id = app.create_list().await;
    assert_eq!(share_id.len(), 10);

    let (status, body, _) = app.send(get(&format!("/list/{share_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8_lossy(&body);
    assert!(html.contains(&format!("data-share-id=\"{share_id}\"")));
    assert!(html.contains("Family list"));

    let (status, _, _) = app.send(get("/list/doesnotexist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_item_lifecycle_over_http() {
    let app = TestApp::new().await;
    let share_id = app.create_list().await;
    let items_uri = format!("/api/list/{share_id}/items");

    let (status, created) = app
        .json(multipart(
            "POST",
            &items_uri,
            &[Part::Text("text", "Bread"), Part::Text("category", "Bakery"), Part::Text("urgent", "")],
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["text"], "Bread");
    assert_eq!(created["quantity"], "1");
    assert_eq!(created["urgent"], true);
    assert_eq!(created["completed"], false);
    assert_eq!(created["description"], "");
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app
        .json(json_request("PUT", &format!("/api/item/{id}"), json!({ "completed": true })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (_, items) = app.json(get(&items_uri)).await;
    assert_eq!(items.as_array().unwrap().len(), 1);
    assert_eq!(items[0]["completed"], true);

    let (status, updated) = app
        .json(urlencoded("PUT", &items_uri, &format!("item_id={id}&text=Rye+bread&quantity=2")))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["text"], "Rye bread");
    assert_eq!(updated["quantity"], "2");
    assert_eq!(updated["category"], "Other");
    assert_eq!(updated["urgent"], false);
    assert_eq!(updated["completed"], true);

    let (status, _) = app
        .json(Request::delete(format!("/api/item/{id}")).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, items) = app.json(get(&items_uri)).await;
    assert_eq!(items, json!([]));

    let (status, body) = app
        .json(Request::delete(format!("/api/item/{id}")).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "item not found");
}

#[tokio::test]
async fn test_validation_and_not_found_errors() {
    let app = TestApp::new().await;
    let share_id = app.create_list().await;
    let items_uri = format!("/api/list/{share_id}/items");

    let (status, body) = app.json(multipart("POST", &items_uri, &[Part::Text("text", "  ")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("required"));

    let (status, _) = app.json(urlencoded("PUT", &items_uri, "text=Milk")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.json(urlencoded("PUT", &items_uri, "item_id=999&text=Milk")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.json(get("/api/list/nope/items")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "list not found");

    let (status, _) = app
        .json(json_request("PUT", "/api/item/999", json!({ "completed": true })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_item_requests_get_json_errors() {
    let app = TestApp::new().await;

    let (status, body) = app
        .json(json_request("PUT", "/api/item/abc", json!({ "completed": true })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "item not found");

    let (status, body) = app
        .json(Request::delete("/api/item/abc").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "item not found");

    let share_id = app.create_list().await;
    let (_, created) = app
        .json(urlencoded("POST", &format!("/api/list/{share_id}/items"), "text=Milk"))
        .await;
    let id = created["id"].as_i64().unwrap();

    let bad_body = Request::builder()
        .method("PUT")
        .uri(format!("/api/item/{id}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.json(bad_body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app.json(urlencoded("PUT", "/api/list/nope/items", "text=Milk")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "list not found");
}

#[tokio::test]
async fn test_cross_list_update_is_not_found() {
    let app = TestApp::new().await;
    let owner = app.create_list().await;
    let intruder = app.create_list().await;

    let (_, created) = app
        .json(urlencoded("POST", &format!("/api/list/{owner}/items"), "text=Milk"))
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, _) = app
        .json(urlencoded(
            "PUT",
            &format!("/api/list/{intruder}/items"),
            &format!("item_id={id}&text=Stolen"),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_image_upload_replace_and_remove() {
    let app = TestApp::new().await;
    let share_id = app.create_list().await;
    let items_uri = format!("/api/list/{share_id}/items");

    let (_, rejected) = app
        .json(multipart(
            "POST",
            &items_uri,
            &[Part::Text("text", "Notes"), Part::File("list.txt", b"plain text")],
        ))
        .await;
    assert_eq!(rejected["image_filename"], Value::Null);

    let (_, created) = app
        .json(multipart(
            "POST",
            &items_uri,
            &[Part::Text("text", "Cake"), Part::File("cake.png", b"png-bytes")],
        ))
        .await;
    let first = created["image_filename"].as_str().unwrap().to_string();
    assert!(app.upload_path(&first).exists());
    let id = created["id"].as_i64().unwrap();

    let (status, body, _) = app.send(get(&format!("/static/uploads/{first}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"png-bytes");

    let id_str = id.to_string();
    let (_, replaced) = app
        .json(multipart(
            "PUT",
            &items_uri,
            &[
                Part::Text("item_id", &id_str),
                Part::Text("text", "Cake"),
                Part::File("cake.gif", b"gif-bytes"),
            ],
        ))
        .await;
    let second = replaced["image_filename"].as_str().unwrap().to_string();
    assert!(!app.upload_path(&first).exists());
    assert!(app.upload_path(&second).exists());

    let (_, removed) = app
        .json(multipart(
            "PUT",
            &items_uri,
            &[
                Part::Text("item_id", &id_str),
                Part::Text("text", "Cake"),
                Part::Text("remove_image", "true"),
                Part::File("", b""),
            ],
        ))
        .await;
    assert_eq!(removed["image_filename"], Value::Null);
    assert!(!app.upload_path(&second).exists());
}

#[tokio::test]
async fn test_deleting_item_keeps_its_image() {
    let app = TestApp::new().await;
    let share_id = app.create_list().await;

    let (_, created) = app
        .json(multipart(
            "POST",
            &format!("/api/list/{share_id}/items"),
            &[Part::Text("text", "Jam"), Part::File("jam.jpg", b"jpg-bytes")],
        ))
        .await;
    let image = created["image_filename"].as_str().unwrap().to_string();
    let id = created["id"].as_i64().unwrap();

    let (status, _) = app
        .json(Request::delete(format!("/api/item/{id}")).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.upload_path(&image).exists());
}

#[tokio::test]
async fn test_statistics_endpoint() {
    let app = TestApp::new().await;
    let share_id = app.create_list().await;
    let items_uri = format!("/api/list/{share_id}/items");

    for body in ["text=a&category=A", "text=b&category=A", "text=c&category=B"] {
        let (status, _) = app.json(urlencoded("POST", &items_uri, body)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, stats) = app.json(get(&format!("/api/list/{share_id}/stats"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({ "total_items": 3, "completed_items": 0, "categories": { "A": 2, "B": 1 } })
    );
}

#[tokio::test]
async fn test_delete_list_endpoint() {
    let app = TestApp::new().await;
    let share_id = app.create_list().await;
    let list_uri = format!("/api/list/{share_id}");

    let (status, list) = app.json(get(&list_uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["share_id"], share_id.as_str());

    app.json(urlencoded("POST", &format!("{list_uri}/items"), "text=Milk")).await;

    let (status, _) = app
        .json(Request::delete(list_uri.as_str()).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.json(get(&format!("{list_uri}/items"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = TestApp::new().await;
    let share_id = app.create_list().await;
    let big = vec![0u8; 8 * 1024 * 1024 + 1];

    let (status, _, _) = app
        .send(multipart(
            "POST",
            &format!("/api/list/{share_id}/items"),
            &[Part::Text("text", "Huge"), Part::File("huge.png", &big)],
        ))
        .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let (_, items) = app.json(get(&format!("/api/list/{share_id}/items"))).await;
    assert_eq!(items, json!([]));
}

#[tokio::test]
async fn test_healthcheck() {
    let app = TestApp::new().await;
    let (status, body) = app.json(get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

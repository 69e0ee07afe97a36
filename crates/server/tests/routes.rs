use std::path::PathBuf;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tower::ServiceExt;

use engine::{Engine, PatchFile};
use migration::MigratorTrait;
use server::{ServerState, router, run_with_listener};

struct Harness {
    app: Router,
    patch_dir: PathBuf,
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.patch_dir);
    }
}

fn files(ids: &[i64]) -> Vec<PatchFile> {
    ids.iter()
        .map(|&base_id| PatchFile {
            base_id,
            version: 0,
        })
        .collect()
}

async fn harness(name: &str) -> Harness {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();

    engine
        .load_patches(&files(&[1, 2]), &files(&[1, 2]), false)
        .await
        .unwrap();
    engine.add_member("alice", "s3cret").await.unwrap();

    let patch_dir =
        std::env::temp_dir().join(format!("patchpair_routes_{name}_{}", std::process::id()));
    std::fs::create_dir_all(patch_dir.join("real")).unwrap();
    std::fs::create_dir_all(patch_dir.join("fake")).unwrap();
    std::fs::write(patch_dir.join("real/1.png"), b"real-one").unwrap();

    let app = router(ServerState::new(engine, patch_dir.clone()));
    Harness { app, patch_dir }
}

fn basic(username: &str, password: &str) -> String {
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {token}")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, basic("alice", "s3cret"))
        .body(Body::empty())
        .unwrap()
}

fn post_form(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/classification")
        .header(header::AUTHORIZATION, basic("alice", "s3cret"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn requests_without_credentials_are_rejected() {
    let h = harness("noauth").await;
    let request = Request::builder()
        .uri("/classification")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let h = harness("badpw").await;
    let request = Request::builder()
        .uri("/classification")
        .header(header::AUTHORIZATION, basic("alice", "guess"))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send_json(&h.app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn pair_is_offered_in_either_order() {
    let h = harness("pair").await;

    let (status, body) = send_json(&h.app, get("/classification")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["real_patch_id"], 2);
    assert_eq!(body["fake_patch_id"], 3);
    assert_eq!(body["classification_count"], 0);

    let mut shown = [body["patch1"].as_i64().unwrap(), body["patch2"].as_i64().unwrap()];
    shown.sort();
    assert_eq!(shown, [2, 3]);
}

#[tokio::test]
async fn posted_verdict_advances_the_pair() {
    let h = harness("post").await;

    let (status, body) = send_json(
        &h.app,
        post_form("real_patch_id=2&fake_patch_id=3&classification=real"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send_json(&h.app, get("/classification")).await;
    assert_eq!(body["real_patch_id"], 4);
    assert_eq!(body["fake_patch_id"], 5);
    assert_eq!(body["classification_count"], 1);
}

#[tokio::test]
async fn exhausted_member_gets_null_ids() {
    let h = harness("done").await;
    for form in [
        "real_patch_id=2&fake_patch_id=3&classification=real",
        "real_patch_id=4&fake_patch_id=5&classification=fake",
    ] {
        let (status, _) = send(&h.app, post_form(form)).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send_json(&h.app, get("/classification")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["real_patch_id"].is_null());
    assert!(body["patch1"].is_null());
    assert_eq!(body["classification_count"], 2);
}

#[tokio::test]
async fn missing_field_is_a_bad_request() {
    let h = harness("missing").await;

    let (status, body) = send_json(&h.app, post_form("real_patch_id=2&fake_patch_id=3")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Missing data");
}

#[tokio::test]
async fn unknown_or_swapped_ids_are_invalid() {
    let h = harness("invalid").await;

    for form in [
        "real_patch_id=98&fake_patch_id=3&classification=real",
        "real_patch_id=3&fake_patch_id=2&classification=real",
        "real_patch_id=abc&fake_patch_id=3&classification=real",
    ] {
        let (status, body) = send_json(&h.app, post_form(form)).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{form}");
        assert_eq!(body["message"], "Invalid patch IDs");
    }
}

#[tokio::test]
async fn patch_image_is_served_as_png() {
    let h = harness("image").await;

    let response = h.app.clone().oneshot(get("/patch?id=2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"real-one");
}

#[tokio::test]
async fn patch_lookup_errors() {
    let h = harness("image_err").await;

    let (status, _) = send(&h.app, get("/patch")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&h.app, get("/patch?id=100")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Stored, but fake/1.png was never written.
    let (status, _) = send(&h.app, get("/patch?id=3")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listener_serves_the_router() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    let state = ServerState::new(engine, std::env::temp_dir());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(run_with_listener(state, listener));

    let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /classification HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 401"), "{response}");
}

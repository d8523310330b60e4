//! HTTP API tests against a node without a running peer

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::Router;
use http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use cbn_node::http_server::{self, Config};
use cbn_node::ServiceState;
use common::bucket::{serialize_bucket, serialize_domain_record, DomainRecord};
use common::controller::Controller;
use common::crypto::SecretKey;
use common::p2p::{new_p2p_controller, BlockStore, MemoryReplicatedMap, P2PConfig, P2PDomainRegistry};
use common::peer::BlobsStore;
use common::source::ReplicatedMap;

async fn controller_over(map: Arc<dyn ReplicatedMap>) -> Controller {
    let blobs = BlobsStore::memory().await.unwrap();
    new_p2p_controller(
        SecretKey::generate(),
        map,
        BlockStore::local(blobs),
        P2PConfig::default(),
    )
}

async fn setup() -> (Router, Controller) {
    let map: Arc<dyn ReplicatedMap> = Arc::new(MemoryReplicatedMap::new());
    let controller = controller_over(map.clone()).await;
    let state = ServiceState::new(controller.clone(), Arc::new(P2PDomainRegistry::new(map)));
    let config = Config::new(SocketAddr::from(([127, 0, 0, 1], 0)));
    (http_server::router(&config, state), controller)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, req).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

async fn create(app: &Router, name: &str) -> (StatusCode, Value) {
    let body = json!({ "name": name }).to_string();
    send_json(app, post("/buckets", "application/json", body)).await
}

#[tokio::test]
async fn test_status_routes() {
    let (app, controller) = setup().await;

    let (status, body) = send_json(&app, get("/_status/livez")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send_json(&app, get("/_status/identity")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["node_id"], controller.identity().public().to_hex());
}

#[tokio::test]
async fn test_create_list_and_content() {
    let (app, _controller) = setup().await;

    let (status, body) = create(&app, "photos").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["Name"], "photos");
    assert!(body["time"].as_i64().unwrap() > 0);
    let hash = body["data"]["Hash"].as_str().unwrap().to_string();

    let (status, body) = send_json(&app, get("/buckets")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["Hash"], hash.as_str());

    let (status, body) = send_json(&app, get(&format!("/buckets/{}", hash))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_create_twice_conflicts() {
    let (app, _controller) = setup().await;

    let (status, _) = create(&app, "docs").await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = create(&app, "docs").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, _) = create(&app, "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_download_remove() {
    let (app, _controller) = setup().await;
    let (_, body) = create(&app, "site").await;
    let hash = body["data"]["Hash"].as_str().unwrap().to_string();
    let uri = format!("/buckets/{}/index.html", hash);

    let page = b"<html>hello</html>".to_vec();
    let (status, body) = send_json(&app, post(&uri, "text/html", page.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["Header"]["Filename"], "index.html");
    assert_eq!(body["data"]["Header"]["Size"], page.len());

    let resp = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/html");
    assert_eq!(
        resp.headers()[header::CONTENT_LENGTH],
        page.len().to_string().as_str()
    );
    let downloaded = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(downloaded.as_ref(), page.as_slice());

    let (_, body) = send_json(&app, get(&format!("/buckets/{}", hash))).await;
    assert_eq!(body["data"], json!(["index.html"]));

    let delete = Request::builder()
        .method("DELETE")
        .uri(&uri)
        .body(Body::empty())
        .unwrap();
    let (status, _) = send_json(&app, delete).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

fn chunked(data: &[u8], chunk: usize) -> Body {
    let chunks: Vec<Result<Vec<u8>, std::io::Error>> =
        data.chunks(chunk).map(|c| Ok(c.to_vec())).collect();
    Body::from_stream(futures::stream::iter(chunks))
}

#[tokio::test]
async fn test_upload_streams_chunked_body() {
    let (app, _controller) = setup().await;
    let (_, body) = create(&app, "media").await;
    let hash = body["data"]["Hash"].as_str().unwrap().to_string();
    let uri = format!("/buckets/{}/clip.bin", hash);

    let clip: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    let (status, body) = send_json(
        &app,
        post(&uri, "application/octet-stream", chunked(&clip, 7_000)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["Header"]["Size"], clip.len());

    let (status, downloaded) = send(&app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(downloaded, clip);
}

#[tokio::test]
async fn test_missing_bucket_is_not_found() {
    let (app, _controller) = setup().await;
    let missing = "00".repeat(32);

    let (status, _) = send(&app, get(&format!("/buckets/{}", missing))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/buckets/{}/a.txt", missing);
    let (status, _) = send(&app, post(&uri, "text/plain", "data")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_data_outside_buckets() {
    let (app, _controller) = setup().await;

    let (status, body) =
        send_json(&app, post("/data/notes.txt", "text/plain", "some notes")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["Header"]["Filename"], "notes.txt");
    assert_eq!(body["data"]["Header"]["Type"], "text/plain");
    assert_eq!(body["data"]["Header"]["Size"], 10);

    let (status, _) = send(&app, post("/file", "text/plain", "not multipart")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_multipart_file() {
    let (app, _controller) = setup().await;
    let boundary = "XBOUNDARY";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         hello\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let content_type = format!("multipart/form-data; boundary={}", boundary);

    let (status, body) = send_json(&app, post("/file", &content_type, body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["Header"]["Filename"], "a.txt");
    assert_eq!(body["data"]["Header"]["Size"], 5);
}

#[tokio::test]
async fn test_upload_multipart_file_in_pieces() {
    let (app, _controller) = setup().await;
    let boundary = "YBOUNDARY";
    let content: Vec<u8> = (0..50_000u32).map(|i| b'a' + (i % 26) as u8).collect();

    let mut body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"note\"\r\n\r\n\
         skipped\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"letters.txt\"\r\n\
         Content-Type: text/plain\r\n\r\n",
        b = boundary
    )
    .into_bytes();
    body.extend_from_slice(&content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    let content_type = format!("multipart/form-data; boundary={}", boundary);

    let (status, body) = send_json(&app, post("/file", &content_type, chunked(&body, 4_096))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["Header"]["Filename"], "letters.txt");
    assert_eq!(body["data"]["Header"]["Type"], "text/plain");
    assert_eq!(body["data"]["Header"]["Size"], content.len());

    let (status, _) = send(&app, post("/file", &content_type, format!("--{}--\r\n", boundary))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_save_signed_bucket() {
    let (app, controller) = setup().await;

    // a bucket built and signed by another node
    let remote = controller_over(Arc::new(MemoryReplicatedMap::new())).await;
    let bucket = remote.create_bucket("shared", None).await.unwrap();
    let raw = serialize_bucket(&bucket).unwrap();

    let (status, _) = send(
        &app,
        post(&format!("/buckets/{}", "ab".repeat(32)), "application/json", raw.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/buckets/{}", bucket.hash());
    let (status, body) = send_json(&app, post(&uri, "application/json", raw.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let echoed = body["data"].as_str().unwrap();
    assert_eq!(echoed.as_bytes(), raw.as_slice());

    let loaded = controller.load_bucket(&bucket.hash()).await.unwrap();
    assert_eq!(loaded.name(), "shared");
}

#[tokio::test]
async fn test_domains() {
    let (app, _controller) = setup().await;
    let publisher = SecretKey::generate();
    let mut record = DomainRecord::new(&"cd".repeat(32), "docs.example", &publisher.public());
    record.sign(&publisher).unwrap();
    let raw = serialize_domain_record(&record).unwrap();

    let (status, body) = send_json(&app, post("/domains", "application/json", raw.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"], "cd".repeat(32));

    let (status, _) = send(&app, post("/domains", "application/json", raw)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send_json(&app, get("/domains/docs.example")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["Domain"], "docs.example");

    let (status, _) = send(&app, get("/domains/unknown.example")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fallback_not_found() {
    let (app, _controller) = setup().await;

    let (status, body) = send_json(&app, get("/nope/deeper")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not found: /nope/deeper");
}

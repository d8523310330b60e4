//! The API client against a node's router served on a loopback port

use std::net::SocketAddr;
use std::sync::Arc;

use http::StatusCode;
use url::Url;

use cbn_node::http_server::api::{ApiClient, ClientError};
use cbn_node::http_server::{self, Config};
use cbn_node::ServiceState;
use common::crypto::SecretKey;
use common::p2p::{new_p2p_controller, BlockStore, MemoryReplicatedMap, P2PConfig, P2PDomainRegistry};
use common::peer::BlobsStore;
use common::source::ReplicatedMap;

async fn serve() -> ApiClient {
    let map: Arc<dyn ReplicatedMap> = Arc::new(MemoryReplicatedMap::new());
    let blobs = BlobsStore::memory().await.unwrap();
    let controller = new_p2p_controller(
        SecretKey::generate(),
        map.clone(),
        BlockStore::local(blobs),
        P2PConfig::default(),
    );
    let state = ServiceState::new(controller, Arc::new(P2PDomainRegistry::new(map)));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = http_server::router(&Config::new(SocketAddr::from(([127, 0, 0, 1], 0))), state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    ApiClient::new(&Url::parse(&format!("http://{}/", addr)).unwrap()).unwrap()
}

#[tokio::test]
async fn test_bucket_round_trip() {
    let client = serve().await;

    let created = client.create_bucket("notes").await.unwrap();
    assert_eq!(created.name, "notes");
    assert_eq!(client.resolve_bucket("notes").await.unwrap(), created.hash);
    assert_eq!(client.resolve_bucket(&created.hash).await.unwrap(), created.hash);

    let listed = client.list_buckets().await.unwrap();
    assert_eq!(listed, vec![created.clone()]);
    assert!(client.bucket_content(&created.hash).await.unwrap().is_empty());

    let data_ref = client
        .upload(&created.hash, "todo.txt", "text/plain", "buy milk")
        .await
        .unwrap();
    assert_eq!(data_ref.header.filename, "todo.txt");
    assert_eq!(data_ref.header.size, 8);
    assert_eq!(
        client.bucket_content(&created.hash).await.unwrap(),
        vec!["todo.txt".to_string()]
    );

    let response = client.download(&created.hash, "todo.txt").await.unwrap();
    assert_eq!(response.headers()[http::header::CONTENT_TYPE], "text/plain");
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"buy milk");
}

#[tokio::test]
async fn test_errors_carry_status_and_message() {
    let client = serve().await;
    client.create_bucket("dup").await.unwrap();

    match client.create_bucket("dup").await {
        Err(ClientError::HttpStatus(status, msg)) => {
            assert_eq!(status, StatusCode::CONFLICT);
            assert!(!msg.is_empty());
            assert!(!msg.contains("\"error\""));
        }
        other => panic!("expected a conflict, got {:?}", other),
    }

    let missing = "00".repeat(32);
    assert!(matches!(
        client.download(&missing, "a.txt").await,
        Err(ClientError::HttpStatus(StatusCode::NOT_FOUND, _))
    ));
    assert!(matches!(
        client.resolve_bucket("nobody").await,
        Err(ClientError::UnknownBucket(_))
    ));
}

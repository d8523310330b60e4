//! Shared setup for controller and protocol integration tests
#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use common::controller::Controller;
use common::crypto::SecretKey;
use common::p2p::{new_p2p_controller, BlockStore, MemoryReplicatedMap, P2PConfig};
use common::peer::BlobsStore;
use common::source::{ByteStream, DataReader};
use tempfile::TempDir;
use tokio::io::AsyncReadExt;

/// A controller backed by an fs blobs store and its own replicated map.
pub async fn setup_test_env() -> (Controller, MemoryReplicatedMap, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let blobs = BlobsStore::fs(&temp_dir.path().join("blobs")).await.unwrap();
    let map = MemoryReplicatedMap::new();
    let controller = controller_over(map.clone(), blobs);
    (controller, map, temp_dir)
}

/// A controller sharing `map` with others, with its own in-memory blobs.
pub async fn setup_peer(map: MemoryReplicatedMap) -> Controller {
    let blobs = BlobsStore::memory().await.unwrap();
    controller_over(map, blobs)
}

fn controller_over(map: MemoryReplicatedMap, blobs: BlobsStore) -> Controller {
    new_p2p_controller(
        SecretKey::generate(),
        Arc::new(map),
        BlockStore::local(blobs),
        P2PConfig::default(),
    )
}

/// Split `data` into small chunks so uploads cross chunk boundaries.
pub fn byte_stream(data: &[u8]) -> ByteStream {
    let chunks: Vec<std::io::Result<Bytes>> = data
        .chunks(7)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    Box::pin(futures::stream::iter(chunks))
}

pub async fn read_all(mut reader: DataReader) -> Vec<u8> {
    let mut out = Vec::new();
    reader.read_to_end(&mut out).await.unwrap();
    out
}

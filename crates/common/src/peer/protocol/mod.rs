//! Request/response protocols peers use to exchange buckets and file
//! content. Each protocol has its own ALPN and carries exactly one
//! length-prefixed request and one response per stream.

use crate::bucket::BucketError;
use crate::controller::ControllerError;
use crate::pointer::PointerError;

mod client;
mod framing;
mod handler;
mod handlers;
mod sync;

pub use client::{
    download, get_bucket_content, list_buckets, request_bucket_content, request_download,
    request_list, request_save, save_bucket,
};
pub use framing::{read_frame, write_frame};
pub use handler::BucketProtocol;
pub use handlers::{
    handle_download, handle_get_content, handle_list, handle_save, serve, BucketContent,
};
pub use sync::{merge_buckets, pull_buckets, SyncReport};

pub const LIST_ALPN: &[u8] = b"/buckets/p2p/list/0.0.1";
pub const SAVE_ALPN: &[u8] = b"/buckets/p2p/save/0.0.1";
pub const READ_ALPN: &[u8] = b"/buckets/p2p/read/0.0.1";
pub const DOWNLOAD_ALPN: &[u8] = b"/data/download/p2p/0.0.1";

/// Upper bound on a single framed message. Downloads are not framed and
/// are not subject to it.
pub const MAX_MESSAGE_SIZE: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolKind {
    List,
    Save,
    GetContent,
    Download,
}

impl ProtocolKind {
    pub const ALL: [ProtocolKind; 4] = [
        ProtocolKind::List,
        ProtocolKind::Save,
        ProtocolKind::GetContent,
        ProtocolKind::Download,
    ];

    pub fn alpn(&self) -> &'static [u8] {
        match self {
            ProtocolKind::List => LIST_ALPN,
            ProtocolKind::Save => SAVE_ALPN,
            ProtocolKind::GetContent => READ_ALPN,
            ProtocolKind::Download => DOWNLOAD_ALPN,
        }
    }

    pub fn from_alpn(alpn: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.alpn() == alpn)
    }
}

impl std::fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // alpns are ascii
        f.write_str(&String::from_utf8_lossy(self.alpn()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("message of {0} bytes exceeds the frame limit")]
    MessageTooLarge(usize),
    #[error("invalid pointer: {0}")]
    Pointer(#[from] PointerError),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("controller error: {0}")]
    Controller(#[from] ControllerError),
    #[error("bucket error: {0}")]
    Bucket(#[from] BucketError),
    #[error("request is not utf-8")]
    NotUtf8,
    #[error("connection failed: {0}")]
    Connect(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpn_lookup() {
        for kind in ProtocolKind::ALL {
            assert_eq!(ProtocolKind::from_alpn(kind.alpn()), Some(kind));
        }
        assert_eq!(ProtocolKind::from_alpn(b"/iroh-bytes/4"), None);
    }

    #[test]
    fn test_display_is_alpn() {
        assert_eq!(ProtocolKind::Save.to_string(), "/buckets/p2p/save/0.0.1");
    }
}

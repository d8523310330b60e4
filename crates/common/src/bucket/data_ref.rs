use serde::{Deserialize, Serialize};

use crate::linked_data::ContentId;

/// Metadata describing a stored file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileHeader {
    pub filename: String,
    pub size: u64,
    #[serde(rename = "Type")]
    pub content_type: String,
}

impl FileHeader {
    /// Header with an unknown size; the size is filled in once the content is stored.
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            size: 0,
            content_type: content_type.into(),
        }
    }
}

/// Reference to one file's content plus its header.
///
/// Immutable once built. Its JSON encoding is the leaf a directory node
/// links to under the file's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataRef {
    pub header: FileHeader,
    pub cid: ContentId,
    /// Id of the data source that holds the content
    pub src: String,
}

impl DataRef {
    pub fn new(cid: ContentId, src: impl Into<String>, header: FileHeader) -> Self {
        Self {
            header,
            cid,
            src: src.into(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let mut header = FileHeader::new("a.txt", "text/plain");
        header.size = 5;
        let dr = DataRef::new(ContentId::from_bytes([4u8; 32]), "p2p", header);
        let value: serde_json::Value = serde_json::from_slice(&dr.to_bytes().unwrap()).unwrap();
        assert_eq!(value["Header"]["Filename"], "a.txt");
        assert_eq!(value["Header"]["Size"], 5);
        assert_eq!(value["Header"]["Type"], "text/plain");
        assert_eq!(value["Src"], "p2p");
        assert_eq!(value["Cid"], dr.cid.to_string());
        assert_eq!(DataRef::from_bytes(&dr.to_bytes().unwrap()).unwrap(), dr);
    }
}

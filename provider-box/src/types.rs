//! Box API response types
//!
//! Data structures for deserializing Box Content API 2.0 responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Box file resource (mini/standard representation)
///
/// See: https://developer.box.com/reference/resources/file/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxFile {
    /// File ID
    pub id: String,

    /// Always `"file"`
    #[serde(rename = "type", default)]
    pub item_type: String,

    /// File name including extension
    pub name: String,

    /// File size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Last modification time (ISO 8601)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

/// Entry of a folder listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderItem {
    /// `"file"`, `"folder"` or `"web_link"`
    #[serde(rename = "type")]
    pub item_type: String,
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl FolderItem {
    pub fn is_file(&self) -> bool {
        self.item_type == "file"
    }
}

/// `GET /folders/{id}/items` response
///
/// See: https://developer.box.com/reference/get-folders-id-items/
#[derive(Debug, Deserialize)]
pub struct FolderItemsResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub entries: Vec<FolderItem>,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
}

/// `GET /files/{id}/metadata` response
///
/// Instances are relayed as opaque JSON.
#[derive(Debug, Deserialize)]
pub struct MetadataInstances {
    #[serde(default)]
    pub entries: Vec<Value>,
}

/// Metadata instances of one file in a folder listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileMetadataSummary {
    pub file_id: String,
    pub file_name: String,
    pub metadata: Vec<Value>,
}

/// JSON Patch operation used to update a metadata instance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataPatchOp {
    pub op: &'static str,
    pub path: String,
    pub value: Value,
}

impl MetadataPatchOp {
    pub fn add(key: &str, value: Value) -> Self {
        Self {
            op: "add",
            path: format!("/{}", key),
            value,
        }
    }

    pub fn replace(key: &str, value: Value) -> Self {
        Self {
            op: "replace",
            path: format!("/{}", key),
            value,
        }
    }
}

/// Box error body
///
/// See: https://developer.box.com/reference/resources/client-error/
#[derive(Debug, Deserialize)]
pub(crate) struct ClientError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

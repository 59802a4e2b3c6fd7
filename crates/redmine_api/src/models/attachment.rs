//! Attachment metadata and upload handles.

use serde::{Deserialize, Serialize};

use super::User;

/// Represents attachment metadata embedded in an issue detail, including file name, size, content type, download URL, author and creation time.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Attachment {
    pub id: u64,
    pub filename: String,
    #[serde(default)]
    pub filesize: u64,
    pub content_type: Option<String>,
    pub description: Option<String>,
    pub content_url: Option<String>,
    pub author: Option<User>,
    pub created_on: Option<String>,
}

/// Token issued by `/uploads.json` for a single binary upload.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct UploadReceipt {
    pub id: Option<u64>,
    pub token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadResponse {
    pub upload: UploadReceipt,
}

/// Reference to a completed upload, attached to an issue-creation payload
/// instead of re-sending the file bytes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UploadHandle {
    pub token: String,
    pub filename: String,
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

//! Core types shared across the collection store, index, and evaluation view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// CollectionId: stable identifier of one stored archive blob
pub type CollectionId = Uuid;

/// UserId: opaque identifier of a teacher or student, owned by the caller's auth layer
pub type UserId = String;

/// Kind of a decoded archive record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VirtualFileType {
    File,
    Directory,
    Symlink,
}

/// VirtualFile: one flat record of a collection archive
///
/// `content` is `Some` iff `file_type` is [`VirtualFileType::File`]. Hierarchy is
/// never stored; consumers rebuild it from `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualFile {
    pub path: String,
    #[serde(rename = "type")]
    pub file_type: VirtualFileType,
    pub last_modified: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<u8>>,
    /// Link name recorded in the archive header. Never resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_target: Option<String>,
}

impl VirtualFile {
    pub fn file(path: impl Into<String>, last_modified: DateTime<Utc>, content: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            file_type: VirtualFileType::File,
            last_modified,
            content: Some(content),
            link_target: None,
        }
    }

    pub fn directory(path: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            file_type: VirtualFileType::Directory,
            last_modified,
            content: None,
            link_target: None,
        }
    }

    pub fn symlink(
        path: impl Into<String>,
        last_modified: DateTime<Utc>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            file_type: VirtualFileType::Symlink,
            last_modified,
            content: None,
            link_target: Some(target.into()),
        }
    }

    pub fn is_file(&self) -> bool {
        self.file_type == VirtualFileType::File
    }

    pub fn is_directory(&self) -> bool {
        self.file_type == VirtualFileType::Directory
    }

    /// Content length in bytes; zero for directories and symlinks
    pub fn size(&self) -> u64 {
        self.content.as_ref().map(|c| c.len() as u64).unwrap_or(0)
    }
}

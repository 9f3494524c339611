//! Directory tree node types

use crate::types::{VirtualFile, VirtualFileType};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Index into the tree arena
pub type NodeId = usize;

/// The root directory always occupies slot 0.
pub const ROOT: NodeId = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeKind {
    File { size: u64 },
    Directory,
    Symlink { target: Option<String> },
}

/// One arena slot
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub path: String,
    pub name: String,
    pub kind: NodeKind,
    /// `None` for directories synthesized from path prefixes
    pub last_modified: Option<DateTime<Utc>>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub(crate) fn root() -> Self {
        Self {
            path: String::new(),
            name: String::new(),
            kind: NodeKind::Directory,
            last_modified: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn directory(path: &str, name: &str, parent: NodeId) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            kind: NodeKind::Directory,
            last_modified: None,
            parent: Some(parent),
            children: Vec::new(),
        }
    }

    pub(crate) fn from_file(file: &VirtualFile, path: &str, name: &str, parent: NodeId) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            kind: kind_of(file),
            last_modified: Some(file.last_modified),
            parent: Some(parent),
            children: Vec::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}

pub(crate) fn kind_of(file: &VirtualFile) -> NodeKind {
    match file.file_type {
        VirtualFileType::File => NodeKind::File { size: file.size() },
        VirtualFileType::Directory => NodeKind::Directory,
        VirtualFileType::Symlink => NodeKind::Symlink {
            target: file.link_target.clone(),
        },
    }
}

/// Serializable view of a node, as shown in a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingEntry {
    pub path: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl From<&TreeNode> for ListingEntry {
    fn from(node: &TreeNode) -> Self {
        Self {
            path: node.path.clone(),
            name: node.name.clone(),
            kind: node.kind.clone(),
            last_modified: node.last_modified,
        }
    }
}

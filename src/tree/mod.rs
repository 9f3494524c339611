//! Directory Materializer
//!
//! Rebuilds hierarchy from a flat collection listing for presentation. The
//! tree is transient: an arena of nodes indexed by path, built per request and
//! never stored.

pub mod browser;
pub mod node;

pub use browser::{FileBrowser, Opened};
pub use node::{ListingEntry, NodeId, NodeKind, TreeNode, ROOT};

use crate::path;
use crate::types::VirtualFile;
use node::kind_of;
use serde::Serialize;
use std::collections::HashMap;

/// One step of the breadcrumb trail. Paths are absolute (`/`, `/src`, `/src/pkg`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub label: String,
    pub path: String,
}

/// One-level listing of a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryListing {
    pub current: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub children: Vec<ListingEntry>,
}

/// Arena of directory nodes keyed by normalized path
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    nodes: Vec<TreeNode>,
    by_path: HashMap<String, NodeId>,
}

impl Default for DirectoryTree {
    fn default() -> Self {
        let mut by_path = HashMap::new();
        by_path.insert(String::new(), ROOT);
        Self {
            nodes: vec![TreeNode::root()],
            by_path,
        }
    }
}

impl DirectoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the tree from flat records. Missing parent directories are synthesized.
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a VirtualFile>,
    {
        let mut tree = Self::new();
        for file in entries {
            tree.insert(file);
        }
        tree
    }

    /// Add one record.
    ///
    /// A path that already has children stays a directory whatever the record
    /// says; a later record otherwise replaces the earlier one.
    pub fn insert(&mut self, file: &VirtualFile) -> Option<NodeId> {
        let normalized = path::normalize(&file.path);
        if normalized.is_empty() {
            return None;
        }
        let parent = self.ensure_directory(path::parent(&normalized).unwrap_or(""));
        match self.by_path.get(&normalized).copied() {
            Some(id) => {
                let node = &mut self.nodes[id];
                if node.children.is_empty() {
                    node.kind = kind_of(file);
                }
                node.last_modified = Some(file.last_modified);
                Some(id)
            }
            None => {
                let name = path::base_name(&normalized);
                let node = TreeNode::from_file(file, &normalized, name, parent);
                Some(self.push(node))
            }
        }
    }

    /// Create a directory and any missing ancestors. Returns `None` for the root
    /// or a path escaping it.
    pub fn create_directory(&mut self, dir: &str) -> Option<NodeId> {
        let normalized = path::normalize(dir);
        if normalized.is_empty() || path::has_parent_segment(&normalized) {
            return None;
        }
        Some(self.ensure_directory(&normalized))
    }

    fn ensure_directory(&mut self, normalized: &str) -> NodeId {
        if let Some(&id) = self.by_path.get(normalized) {
            self.nodes[id].kind = NodeKind::Directory;
            return id;
        }
        let parent = self.ensure_directory(path::parent(normalized).unwrap_or(""));
        let node = TreeNode::directory(normalized, path::base_name(normalized), parent);
        self.push(node)
    }

    fn push(&mut self, node: TreeNode) -> NodeId {
        let id = self.nodes.len();
        if let Some(parent) = node.parent {
            self.nodes[parent].children.push(id);
        }
        self.by_path.insert(node.path.clone(), id);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, file_path: &str) -> Option<&TreeNode> {
        self.by_path
            .get(&path::normalize(file_path))
            .map(|&id| &self.nodes[id])
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Immediate children of `dir` sorted by path, with breadcrumbs.
    ///
    /// Returns `None` when `dir` does not exist or is not a directory.
    pub fn list(&self, dir: &str) -> Option<DirectoryListing> {
        let normalized = path::normalize(dir);
        let &id = self.by_path.get(&normalized)?;
        let node = &self.nodes[id];
        if !node.is_directory() {
            return None;
        }

        let mut children: Vec<ListingEntry> = node
            .children
            .iter()
            .map(|&child| ListingEntry::from(&self.nodes[child]))
            .collect();
        children.sort_by(|a, b| a.path.cmp(&b.path));

        Some(DirectoryListing {
            current: format!("/{}", normalized),
            breadcrumbs: breadcrumbs(&normalized),
            children,
        })
    }
}

/// Root crumb followed by one crumb per segment of `dir`.
pub fn breadcrumbs(dir: &str) -> Vec<Breadcrumb> {
    let normalized = path::normalize(dir);
    let mut crumbs = vec![Breadcrumb {
        label: "/".to_string(),
        path: "/".to_string(),
    }];
    if normalized.is_empty() {
        return crumbs;
    }
    let mut prefix = String::new();
    for segment in normalized.split('/') {
        prefix.push('/');
        prefix.push_str(segment);
        crumbs.push(Breadcrumb {
            label: segment.to_string(),
            path: prefix.clone(),
        });
    }
    crumbs
}

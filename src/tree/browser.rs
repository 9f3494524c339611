//! Navigation and selection state over a [`DirectoryTree`].

use super::{DirectoryListing, DirectoryTree, ListingEntry};
use crate::path;
use std::collections::BTreeSet;

/// Result of opening an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opened {
    /// A directory was entered; holds its normalized path.
    Directory(String),
    File(ListingEntry),
}

/// Current directory plus the selected entries of that directory
#[derive(Debug, Clone)]
pub struct FileBrowser {
    tree: DirectoryTree,
    current: String,
    selected: BTreeSet<String>,
}

impl FileBrowser {
    pub fn new(tree: DirectoryTree) -> Self {
        Self {
            tree,
            current: String::new(),
            selected: BTreeSet::new(),
        }
    }

    pub fn tree(&self) -> &DirectoryTree {
        &self.tree
    }

    /// Normalized path of the current directory; `""` is the root.
    pub fn current_dir(&self) -> &str {
        &self.current
    }

    pub fn listing(&self) -> DirectoryListing {
        self.tree
            .list(&self.current)
            .unwrap_or_else(|| DirectoryListing {
                current: format!("/{}", self.current),
                breadcrumbs: super::breadcrumbs(&self.current),
                children: Vec::new(),
            })
    }

    /// Enter `dir`. Clears the selection. Returns false if `dir` is not a directory.
    pub fn navigate(&mut self, dir: &str) -> bool {
        let normalized = path::normalize(dir);
        match self.tree.get(&normalized) {
            Some(node) if node.is_directory() => {
                self.current = normalized;
                self.selected.clear();
                true
            }
            _ => false,
        }
    }

    /// Go to the parent directory. Returns false at the root.
    pub fn up(&mut self) -> bool {
        match path::parent(&self.current) {
            Some(parent) => {
                let parent = parent.to_string();
                self.navigate(&parent)
            }
            None => false,
        }
    }

    /// Directories are entered, anything else is handed back to the caller.
    pub fn open(&mut self, entry: &str) -> Option<Opened> {
        let node = self.tree.get(entry)?;
        if node.is_directory() {
            let dir = node.path.clone();
            self.navigate(&dir);
            Some(Opened::Directory(dir))
        } else {
            Some(Opened::File(ListingEntry::from(node)))
        }
    }

    fn is_child(&self, normalized: &str) -> bool {
        path::parent(normalized) == Some(self.current.as_str())
            && self.tree.get(normalized).is_some()
    }

    /// Flip selection of an entry in the current directory. Returns whether it
    /// is now selected.
    pub fn toggle(&mut self, entry: &str) -> bool {
        let normalized = path::normalize(entry);
        if !self.is_child(&normalized) {
            return false;
        }
        if !self.selected.remove(&normalized) {
            self.selected.insert(normalized);
            return true;
        }
        false
    }

    pub fn is_selected(&self, entry: &str) -> bool {
        self.selected.contains(&path::normalize(entry))
    }

    pub fn select_all(&mut self) {
        self.selected = self
            .listing()
            .children
            .into_iter()
            .map(|entry| entry.path)
            .collect();
    }

    pub fn unselect_all(&mut self) {
        self.selected.clear();
    }

    /// True when every entry of the current directory is selected.
    pub fn all_selected(&self) -> bool {
        self.selected.len() == self.listing().children.len()
    }

    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    /// Create an empty directory relative to the current one.
    pub fn create_directory(&mut self, name: &str) -> Option<String> {
        let relative = path::normalize(name);
        if relative.is_empty() {
            return None;
        }
        let full = if self.current.is_empty() {
            relative
        } else {
            format!("{}/{}", self.current, relative)
        };
        let id = self.tree.create_directory(&full)?;
        Some(self.tree.node(id).path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VirtualFile;
    use chrono::{DateTime, Utc};

    fn browser() -> FileBrowser {
        let at = DateTime::<Utc>::from_timestamp(0, 0).unwrap();
        let files = vec![
            VirtualFile::file("src/Main.java", at, b"main".to_vec()),
            VirtualFile::file("src/Util.java", at, b"util".to_vec()),
            VirtualFile::file("README.md", at, b"readme".to_vec()),
        ];
        FileBrowser::new(DirectoryTree::from_entries(&files))
    }

    #[test]
    fn test_open_directory_navigates_and_clears_selection() {
        let mut browser = browser();
        assert!(browser.toggle("README.md"));
        assert_eq!(browser.open("src"), Some(Opened::Directory("src".into())));
        assert_eq!(browser.current_dir(), "src");
        assert_eq!(browser.selected().count(), 0);
        assert_eq!(browser.listing().breadcrumbs.len(), 2);
    }

    #[test]
    fn test_open_file_returns_entry() {
        let mut browser = browser();
        match browser.open("README.md") {
            Some(Opened::File(entry)) => assert_eq!(entry.name, "README.md"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(browser.current_dir(), "");
        assert!(browser.open("missing").is_none());
    }

    #[test]
    fn test_toggle_and_select_all() {
        let mut browser = browser();
        browser.navigate("/src");
        assert!(browser.toggle("src/Main.java"));
        assert!(!browser.all_selected());
        assert!(!browser.toggle("src/Main.java"));
        assert!(!browser.toggle("README.md"));

        browser.select_all();
        assert!(browser.all_selected());
        assert!(browser.is_selected("src/Util.java"));
        browser.unselect_all();
        assert_eq!(browser.selected().count(), 0);
    }

    #[test]
    fn test_navigate_rejects_files_and_up_stops_at_root() {
        let mut browser = browser();
        assert!(!browser.navigate("README.md"));
        assert!(browser.navigate("src"));
        assert!(browser.up());
        assert_eq!(browser.current_dir(), "");
        assert!(!browser.up());
    }

    #[test]
    fn test_create_directory_relative_to_current() {
        let mut browser = browser();
        browser.navigate("src");
        assert_eq!(browser.create_directory("gen/"), Some("src/gen".to_string()));
        let names: Vec<_> = browser
            .listing()
            .children
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Main.java", "Util.java", "gen"]);
        assert!(browser.create_directory("").is_none());
    }
}

//! In-memory remote namespace
//!
//! A complete [`RemoteNamespace`] held in process memory. Listing order is
//! creation order, pages are cut at a configurable size, and individual
//! moves or listing pages can be made to fail.

use crate::drive::{Entry, Page, RemoteNamespace};
use crate::error::{MigrateError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Default number of entries per listing page
const DEFAULT_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<String>,
    is_folder: bool,
}

#[derive(Debug, Default)]
struct State {
    nodes: HashMap<String, Node>,
    /// Ids in creation order
    order: Vec<String>,
    next_id: u64,
    denied_moves: HashSet<String>,
    /// container id -> page index whose fetch fails
    failing_lists: HashMap<String, usize>,
}

impl State {
    fn insert(&mut self, name: &str, parent: Option<&str>, is_folder: bool) -> String {
        self.next_id += 1;
        let id = format!("id-{}", self.next_id);
        self.nodes.insert(
            id.clone(),
            Node {
                name: name.to_string(),
                parent: parent.map(str::to_string),
                is_folder,
            },
        );
        self.order.push(id.clone());
        id
    }

    fn children(&self, container_id: &str, folders_only: bool) -> Vec<Entry> {
        self.order
            .iter()
            .filter_map(|id| {
                let node = &self.nodes[id];
                let matches = node.parent.as_deref() == Some(container_id)
                    && (!folders_only || node.is_folder);
                matches.then(|| Entry {
                    name: node.name.clone(),
                    id: id.clone(),
                    is_folder: node.is_folder,
                })
            })
            .collect()
    }

    fn require_folder(&self, id: &str) -> Result<()> {
        match self.nodes.get(id) {
            Some(node) if node.is_folder => Ok(()),
            Some(_) => Err(MigrateError::Api {
                status: 400,
                reason: "notAFolder".to_string(),
                message: format!("{} is not a folder", id),
            }),
            None => Err(MigrateError::NotFound(id.to_string())),
        }
    }
}

/// Remote namespace kept entirely in memory
#[derive(Debug)]
pub struct MemoryNamespace {
    state: Mutex<State>,
    page_size: usize,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl Default for MemoryNamespace {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryNamespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            page_size: DEFAULT_PAGE_SIZE,
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
        }
    }

    /// Set the number of entries per listing page (minimum 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only means a panicking test; the data is still usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a parentless folder
    pub fn add_root(&self, name: &str) -> String {
        self.lock().insert(name, None, true)
    }

    /// Add a folder under `parent_id`
    pub fn add_folder(&self, parent_id: &str, name: &str) -> String {
        self.lock().insert(name, Some(parent_id), true)
    }

    /// Add a file under `parent_id`
    pub fn add_file(&self, parent_id: &str, name: &str) -> String {
        self.lock().insert(name, Some(parent_id), false)
    }

    /// Make every move of `entry_id` fail with a permission error
    pub fn deny_move(&self, entry_id: &str) {
        self.lock().denied_moves.insert(entry_id.to_string());
    }

    /// Make fetching page `page_index` (0-based) of `container_id` fail
    pub fn fail_listing(&self, container_id: &str, page_index: usize) {
        self.lock()
            .failing_lists
            .insert(container_id.to_string(), page_index);
    }

    /// All children of a container, unpaged
    pub fn children(&self, container_id: &str) -> Vec<Entry> {
        self.lock().children(container_id, false)
    }

    /// Children of a container with the given name
    pub fn children_named(&self, container_id: &str, name: &str) -> Vec<Entry> {
        self.children(container_id)
            .into_iter()
            .filter(|e| e.name == name)
            .collect()
    }

    /// Parent of an entry, if it exists and has one
    pub fn parent_of(&self, entry_id: &str) -> Option<String> {
        self.lock()
            .nodes
            .get(entry_id)
            .and_then(|node| node.parent.clone())
    }

    /// Number of `list_page` calls served
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    /// Number of folders created through `create_folder`
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::Relaxed)
    }
}

fn parse_token(token: &str) -> Result<(usize, usize)> {
    token
        .split_once(':')
        .and_then(|(page, cursor)| Some((page.parse().ok()?, cursor.parse().ok()?)))
        .ok_or_else(|| MigrateError::Api {
            status: 400,
            reason: "invalidPageToken".to_string(),
            message: format!("bad page token '{}'", token),
        })
}

impl RemoteNamespace for MemoryNamespace {
    fn list_page(
        &self,
        container_id: &str,
        page_token: Option<&str>,
        folders_only: bool,
    ) -> Result<Page> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        let state = self.lock();
        state.require_folder(container_id)?;

        // Tokens are "<page index>:<position in creation order>" cursors, so
        // entries moved away from earlier pages do not shift later ones
        let (page_index, cursor) = match page_token {
            Some(token) => parse_token(token)?,
            None => (0, 0),
        };

        if state.failing_lists.get(container_id) == Some(&page_index) {
            return Err(MigrateError::Api {
                status: 500,
                reason: "backendError".to_string(),
                message: format!("listing {} failed", container_id),
            });
        }

        let mut matching = state
            .order
            .iter()
            .enumerate()
            .skip(cursor)
            .filter(|(_, id)| {
                let node = &state.nodes[*id];
                node.parent.as_deref() == Some(container_id) && (!folders_only || node.is_folder)
            });

        let mut entries = Vec::new();
        let mut last_position = cursor;
        for (position, id) in matching.by_ref().take(self.page_size) {
            let node = &state.nodes[id];
            entries.push(Entry {
                name: node.name.clone(),
                id: id.clone(),
                is_folder: node.is_folder,
            });
            last_position = position;
        }

        let next_page_token = matching
            .next()
            .map(|_| format!("{}:{}", page_index + 1, last_position + 1));

        Ok(Page {
            entries,
            next_page_token,
        })
    }

    fn create_folder(&self, name: &str, parent_id: &str) -> Result<String> {
        let mut state = self.lock();
        state.require_folder(parent_id)?;
        self.create_calls.fetch_add(1, Ordering::Relaxed);
        Ok(state.insert(name, Some(parent_id), true))
    }

    fn move_entry(&self, source_id: &str, destination_id: &str, entry_id: &str) -> Result<()> {
        let mut state = self.lock();
        state.require_folder(destination_id)?;
        if state.denied_moves.contains(entry_id) {
            return Err(MigrateError::permission_denied(
                entry_id,
                "The user does not have sufficient permissions for this file.",
            ));
        }
        let node = state
            .nodes
            .get_mut(entry_id)
            .ok_or_else(|| MigrateError::NotFound(entry_id.to_string()))?;
        if node.parent.as_deref() != Some(source_id) {
            return Err(MigrateError::Api {
                status: 400,
                reason: "invalidParent".to_string(),
                message: format!("{} is not a child of {}", entry_id, source_id),
            });
        }
        node.parent = Some(destination_id.to_string());
        Ok(())
    }

    fn copy_entry(&self, entry_id: &str, destination_id: &str) -> Result<String> {
        let mut state = self.lock();
        state.require_folder(destination_id)?;
        let node = state
            .nodes
            .get(entry_id)
            .cloned()
            .ok_or_else(|| MigrateError::NotFound(entry_id.to_string()))?;
        if node.is_folder {
            return Err(MigrateError::Api {
                status: 403,
                reason: "fileNotCopyable".to_string(),
                message: "Folders cannot be copied".to_string(),
            });
        }
        Ok(state.insert(&node.name, Some(destination_id), false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::{MigrationPolicy, Relocation};

    #[test]
    fn test_move_and_copy() {
        let ns = MemoryNamespace::new();
        let src = ns.add_root("src");
        let dst = ns.add_root("dst");
        let a = ns.add_file(&src, "a.txt");
        let b = ns.add_file(&src, "b.txt");

        ns.move_entry(&src, &dst, &a).unwrap();
        assert_eq!(ns.parent_of(&a).as_deref(), Some(dst.as_str()));

        let copy = ns.copy_entry(&b, &dst).unwrap();
        assert_ne!(copy, b);
        assert_eq!(ns.parent_of(&b).as_deref(), Some(src.as_str()));
        assert_eq!(ns.children_named(&dst, "b.txt").len(), 1);
    }

    #[test]
    fn test_relocate_falls_back_to_copy() {
        let ns = MemoryNamespace::new();
        let src = ns.add_root("src");
        let dst = ns.add_root("dst");
        let f = ns.add_file(&src, "locked.pdf");
        ns.deny_move(&f);

        let outcome = ns
            .relocate(&src, &dst, &f, MigrationPolicy::copy_on_permission_error())
            .unwrap();
        assert!(matches!(outcome, Relocation::Copied { .. }));
        assert_eq!(ns.parent_of(&f).as_deref(), Some(src.as_str()));
        assert_eq!(ns.children_named(&dst, "locked.pdf").len(), 1);
    }

    #[test]
    fn test_relocate_propagates_without_policy() {
        let ns = MemoryNamespace::new();
        let src = ns.add_root("src");
        let dst = ns.add_root("dst");
        let f = ns.add_file(&src, "locked.pdf");
        ns.deny_move(&f);

        let err = ns
            .relocate(&src, &dst, &f, MigrationPolicy::default())
            .unwrap_err();
        assert!(err.is_permission_error());
        assert!(ns.children(&dst).is_empty());
    }

    #[test]
    fn test_create_folder_under_missing_parent() {
        let ns = MemoryNamespace::new();
        let err = ns.create_folder("Reports", "nope").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(ns.create_calls(), 0);
    }

    #[test]
    fn test_bad_page_token() {
        let ns = MemoryNamespace::new();
        let root = ns.add_root("root");
        assert!(ns.list_page(&root, Some("garbage"), false).is_err());
    }
}

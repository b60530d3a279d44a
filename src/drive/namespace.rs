//! Remote namespace model
//!
//! The migration engine only ever talks to a [`RemoteNamespace`]. The
//! Drive HTTP client and the in-memory namespace both implement it.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// MIME type Drive uses to mark folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// A named child of a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Display name (not unique within a container)
    pub name: String,
    /// Opaque identifier
    pub id: String,
    /// Whether this entry is itself a container
    pub is_folder: bool,
}

impl Entry {
    /// Create a folder entry
    pub fn folder(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            is_folder: true,
        }
    }

    /// Create a file entry
    pub fn file(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            is_folder: false,
        }
    }
}

/// One page of a child listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Entries in the order the remote returned them
    pub entries: Vec<Entry>,
    /// Token for the next page, absent on the last page
    pub next_page_token: Option<String>,
}

/// Run-wide policy for relocating files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPolicy {
    /// Copy a file instead of failing when it may not be moved
    pub copy_on_permission_error: bool,
}

impl MigrationPolicy {
    /// Policy that copies when a move is refused
    pub fn copy_on_permission_error() -> Self {
        Self {
            copy_on_permission_error: true,
        }
    }
}

/// How a file ended up under the destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relocation {
    /// The entry itself now lives under the destination
    Moved,
    /// The original stayed put and a copy was created under the destination
    Copied {
        /// Identifier of the new copy
        copy_id: String,
    },
}

/// Operations the migration needs from a hierarchical remote store
pub trait RemoteNamespace {
    /// Fetch one page of `container_id`'s children
    fn list_page(
        &self,
        container_id: &str,
        page_token: Option<&str>,
        folders_only: bool,
    ) -> Result<Page>;

    /// Create a folder named `name` under `parent_id`, returning its id
    fn create_folder(&self, name: &str, parent_id: &str) -> Result<String>;

    /// Re-parent `entry_id` from `source_id` to `destination_id`
    fn move_entry(&self, source_id: &str, destination_id: &str, entry_id: &str) -> Result<()>;

    /// Copy `entry_id` into `destination_id`, returning the copy's id
    fn copy_entry(&self, entry_id: &str, destination_id: &str) -> Result<String>;

    /// Move `entry_id` into `destination_id`, falling back to a copy when
    /// the move is refused and the policy allows it.
    fn relocate(
        &self,
        source_id: &str,
        destination_id: &str,
        entry_id: &str,
        policy: MigrationPolicy,
    ) -> Result<Relocation> {
        match self.move_entry(source_id, destination_id, entry_id) {
            Ok(()) => Ok(Relocation::Moved),
            Err(e) if e.is_permission_error() && policy.copy_on_permission_error => {
                tracing::warn!("Cannot move {} ({}), copying instead", entry_id, e);
                let copy_id = self.copy_entry(entry_id, destination_id)?;
                Ok(Relocation::Copied { copy_id })
            }
            Err(e) => Err(e),
        }
    }
}

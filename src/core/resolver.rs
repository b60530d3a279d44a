//! Destination folder resolution
//!
//! Finds the folder a source folder merges into: the first destination
//! child folder with exactly the same name, or a newly created one.

use crate::drive::{list_all, RemoteNamespace};
use crate::error::Result;
use std::collections::HashMap;

/// Outcome of resolving a folder name under a destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderResolution {
    /// An existing folder with that name was found
    Merged(String),
    /// No folder matched and one was created
    Created(String),
}

impl FolderResolution {
    /// Identifier of the resolved folder
    pub fn id(&self) -> &str {
        match self {
            Self::Merged(id) | Self::Created(id) => id,
        }
    }

    /// Consume into the folder identifier
    pub fn into_id(self) -> String {
        match self {
            Self::Merged(id) | Self::Created(id) => id,
        }
    }
}

/// Find-or-create resolver with an optional per-run cache
///
/// The cache is keyed by (destination id, name). Only the first folder
/// seen for a name during a scan is recorded, so duplicate names keep
/// resolving to the first one in listing order.
pub struct FolderResolver<'a, C: RemoteNamespace + ?Sized> {
    client: &'a C,
    cache: Option<HashMap<(String, String), String>>,
}

impl<'a, C: RemoteNamespace + ?Sized> FolderResolver<'a, C> {
    /// Create a resolver; `use_cache` enables the per-run cache
    pub fn new(client: &'a C, use_cache: bool) -> Self {
        Self {
            client,
            cache: use_cache.then(HashMap::new),
        }
    }

    /// Number of cached (destination, name) pairs
    pub fn cached(&self) -> usize {
        self.cache.as_ref().map_or(0, HashMap::len)
    }

    /// Resolve `name` under `destination_id`, creating the folder if needed
    pub fn resolve(&mut self, name: &str, destination_id: &str) -> Result<FolderResolution> {
        let key = (destination_id.to_string(), name.to_string());

        if let Some(id) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            return Ok(FolderResolution::Merged(id.clone()));
        }

        for entry in list_all(self.client, destination_id, true) {
            let entry = entry?;
            // Only folders can be merged into
            if !entry.is_folder {
                continue;
            }
            let is_match = entry.name == name;
            if let Some(cache) = self.cache.as_mut() {
                cache
                    .entry((destination_id.to_string(), entry.name))
                    .or_insert_with(|| entry.id.clone());
            }
            if is_match {
                return Ok(FolderResolution::Merged(entry.id));
            }
        }

        let id = self.client.create_folder(name, destination_id)?;
        tracing::info!("Created folder {} in {}", name, destination_id);
        if let Some(cache) = self.cache.as_mut() {
            cache.insert(key, id.clone());
        }
        Ok(FolderResolution::Created(id))
    }
}

/// Resolve a single folder without caching
pub fn find_or_create_folder<C: RemoteNamespace + ?Sized>(
    client: &C,
    name: &str,
    destination_id: &str,
) -> Result<String> {
    FolderResolver::new(client, false)
        .resolve(name, destination_id)
        .map(FolderResolution::into_id)
}

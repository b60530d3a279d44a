//! Tree migration engine
//!
//! Walks a source folder depth-first, merging each subfolder into the
//! same-named destination folder and relocating every file. The walk uses
//! an explicit stack of open listings instead of call recursion, which
//! keeps the visiting order of a recursive pre-order walk while bounding
//! native stack use and giving a place to check for cancellation.

use crate::core::{FolderResolution, FolderResolver};
use crate::drive::{list_all, Listing, MigrationPolicy, RemoteNamespace, Relocation};
use crate::error::{MigrateError, Result};
use crate::progress::ProgressReporter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters for a completed migration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    /// Source folders walked, including the top-level one
    pub folders_scanned: u64,
    /// Destination folders created
    pub folders_created: u64,
    /// Source folders merged into an existing destination folder
    pub folders_merged: u64,
    /// Files moved
    pub files_moved: u64,
    /// Files copied because they could not be moved
    pub files_copied: u64,
    /// Deepest folder nesting reached below the top-level source
    pub max_depth: usize,
    /// Total duration
    pub duration: Duration,
}

impl MigrationSummary {
    /// Files relocated either way
    pub fn files_relocated(&self) -> u64 {
        self.files_moved + self.files_copied
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        println!("\n=== Migration Summary ===");
        println!("Folders walked:  {}", self.folders_scanned);
        println!("Folders created: {}", self.folders_created);
        println!("Folders merged:  {}", self.folders_merged);
        println!("Files moved:     {}", self.files_moved);
        println!("Files copied:    {}", self.files_copied);
        println!("Max depth:       {}", self.max_depth);
        println!(
            "Duration:        {}",
            humantime::format_duration(Duration::from_secs(self.duration.as_secs()))
        );
    }
}

/// One open source folder on the walk stack
struct Frame<'a, C: RemoteNamespace + ?Sized> {
    listing: Listing<'a, C>,
    destination_id: String,
}

/// Depth-first migration engine
pub struct TreeMigrator<'a, C: RemoteNamespace + ?Sized> {
    /// Remote namespace
    client: &'a C,
    /// Relocation policy, fixed for the whole run
    policy: MigrationPolicy,
    /// Cache destination folder lookups
    cache_folders: bool,
    /// Progress reporter
    progress: Option<ProgressReporter>,
    /// Cancellation flag
    cancelled: Arc<AtomicBool>,
}

impl<'a, C: RemoteNamespace + ?Sized> TreeMigrator<'a, C> {
    /// Create a migrator over `client`
    pub fn new(client: &'a C, policy: MigrationPolicy) -> Self {
        Self {
            client,
            policy,
            cache_folders: true,
            progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Enable or disable the per-run destination folder cache
    pub fn with_folder_cache(mut self, enabled: bool) -> Self {
        self.cache_folders = enabled;
        self
    }

    /// Set progress reporter
    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Get cancellation flag for external control
    pub fn cancellation_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Cancel the operation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn open(&self, source_id: &str, destination_id: String) -> Frame<'a, C> {
        tracing::info!("Moving from {} to {}", source_id, destination_id);
        if let Some(progress) = &self.progress {
            progress.increment_folders();
        }
        Frame {
            listing: list_all(self.client, source_id, false),
            destination_id,
        }
    }

    /// Move everything under `source_id` into `destination_id`
    ///
    /// Stops at the first error. Work already done stays done.
    pub fn migrate(&self, source_id: &str, destination_id: &str) -> Result<MigrationSummary> {
        if source_id == destination_id {
            return Err(MigrateError::config(format!(
                "source and destination are the same folder: {}",
                source_id
            )));
        }

        let start_time = Instant::now();
        let result = self.walk(source_id, destination_id);

        if let Some(progress) = &self.progress {
            progress.finish();
        }

        let mut summary = result?;
        summary.duration = start_time.elapsed();
        Ok(summary)
    }

    fn walk(&self, source_id: &str, destination_id: &str) -> Result<MigrationSummary> {
        let mut summary = MigrationSummary::default();
        let mut resolver = FolderResolver::new(self.client, self.cache_folders);
        let mut stack = vec![self.open(source_id, destination_id.to_string())];
        summary.folders_scanned += 1;

        while let Some(frame) = stack.last_mut() {
            if self.is_cancelled() {
                return Err(MigrateError::Cancelled);
            }

            let entry = match frame.listing.next() {
                Some(entry) => entry?,
                None => {
                    stack.pop();
                    continue;
                }
            };

            if let Some(progress) = &self.progress {
                progress.set_current(&entry.name);
            }

            if entry.is_folder {
                let destination_id = frame.destination_id.clone();
                let resolved = resolver.resolve(&entry.name, &destination_id)?;
                match resolved {
                    FolderResolution::Created(_) => summary.folders_created += 1,
                    FolderResolution::Merged(_) => summary.folders_merged += 1,
                }

                tracing::info!("Recursing into {}", entry.name);
                let child = self.open(&entry.id, resolved.into_id());
                stack.push(child);
                summary.folders_scanned += 1;
                summary.max_depth = summary.max_depth.max(stack.len() - 1);
            } else {
                tracing::info!("Moving {}", entry.name);
                let relocation = self.client.relocate(
                    frame.listing.container_id(),
                    &frame.destination_id,
                    &entry.id,
                    self.policy,
                )?;
                match relocation {
                    Relocation::Moved => {
                        summary.files_moved += 1;
                        if let Some(progress) = &self.progress {
                            progress.increment_moved();
                        }
                    }
                    Relocation::Copied { copy_id } => {
                        tracing::info!("Copied {} as {}", entry.name, copy_id);
                        summary.files_copied += 1;
                        if let Some(progress) = &self.progress {
                            progress.increment_copied();
                        }
                    }
                }
            }
        }

        Ok(summary)
    }
}

/// Migrate `source_id` into `destination_id` with default settings
pub fn migrate<C: RemoteNamespace + ?Sized>(
    client: &C,
    source_id: &str,
    destination_id: &str,
    policy: MigrationPolicy,
) -> Result<MigrationSummary> {
    TreeMigrator::new(client, policy).migrate(source_id, destination_id)
}

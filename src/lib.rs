//! # DriveMove - Folder Tree Migration for Google Drive
//!
//! DriveMove moves the contents of one Drive folder into another. The
//! folder structure is preserved and merged by name into whatever already
//! exists at the destination; files are moved, or copied when a move is
//! refused and the policy allows it.
//!
//! ## Features
//!
//! - **Folder Merging**: Subfolders land in the first same-named destination folder
//! - **Copy Fallback**: Files that may not be moved can be copied instead
//! - **Lazy Pagination**: Listings are streamed page by page
//! - **Substitutable Backend**: Everything runs against the [`drive::RemoteNamespace`] trait
//!
//! ## Quick Start
//!
//! ```no_run
//! use drivemove::drive::{
//!     acquire_credentials, CredentialSource, DriveClient, DriveConfig, MigrationPolicy,
//! };
//! use drivemove::core::migrate;
//!
//! let session = acquire_credentials(&CredentialSource::from_env()).unwrap();
//! let client = DriveClient::new(session, DriveConfig::default()).unwrap();
//!
//! let summary = migrate(&client, "source-folder-id", "destination-folder-id",
//!     MigrationPolicy::copy_on_permission_error()).unwrap();
//! summary.print_summary();
//! ```
//!
//! ## Testing Against Memory
//!
//! ```
//! use drivemove::drive::{MemoryNamespace, MigrationPolicy};
//! use drivemove::core::TreeMigrator;
//!
//! let ns = MemoryNamespace::new();
//! let src = ns.add_root("src");
//! let dst = ns.add_root("dst");
//! let reports = ns.add_folder(&src, "Reports");
//! ns.add_file(&reports, "q1.pdf");
//!
//! let summary = TreeMigrator::new(&ns, MigrationPolicy::default())
//!     .migrate(&src, &dst)
//!     .unwrap();
//! assert_eq!(summary.files_moved, 1);
//! assert_eq!(ns.children_named(&dst, "Reports").len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod drive;
pub mod error;
pub mod progress;

// Re-export commonly used types
pub use crate::config::{CliArgs, MigrationConfig};
pub use crate::core::{migrate, MigrationSummary, TreeMigrator};
pub use crate::drive::{DriveClient, Entry, MigrationPolicy, RemoteNamespace};
pub use crate::error::{MigrateError, Result};
pub use crate::progress::ProgressReporter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Remote namespace module
//!
//! The boundary to the hierarchical store being migrated: the
//! [`RemoteNamespace`] trait, the Google Drive client behind it, credential
//! handling, the lazy paginated [`Listing`], and an in-memory namespace.

mod auth;
mod client;
mod lister;
mod memory;
mod namespace;

pub use auth::*;
pub use client::*;
pub use lister::*;
pub use memory::*;
pub use namespace::*;

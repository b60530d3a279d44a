//! Core migration module
//!
//! Provides destination folder resolution and the depth-first engine
//! that moves a folder tree.

mod migrator;
mod resolver;

pub use migrator::*;
pub use resolver::*;

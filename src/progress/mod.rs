//! Progress reporting module
//!
//! Provides a live spinner with running counters for migrations.

mod reporter;

pub use reporter::*;

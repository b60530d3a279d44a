//! Configuration module for DriveMove
//!
//! Provides CLI argument parsing and the runtime settings built from it.

mod settings;

pub use settings::*;

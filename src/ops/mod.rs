//! High-level operations.
//!
//! This module contains the implementation of modfleet commands.

pub mod discover;
pub mod manifest;
pub mod version;

pub use discover::{discover_local, discover_remote, DiscoverOptions};
pub use manifest::{expand_file, validate_file};
pub use version::{resolve_version, VersionOptions, VersionStrategy};

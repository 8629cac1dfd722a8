//! Command implementations

pub mod completions;
pub mod discover;
pub mod manifest;
pub mod version;

//! modfleet - dependent discovery and version resolution for Go module fleets
//!
//! This crate finds the repositories that depend on a Go module, either in a
//! local workspace or across a GitHub organization, and resolves the version
//! of that module they should move to. It also validates and expands the
//! fleet manifest that records the result.

pub mod core;
pub mod discovery;
pub mod hosting;
pub mod modfile;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities and mocks for modfleet unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides mock implementations for process execution, the hosting API and
/// remote ref listing, plus workspace fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{DependentDescriptor, DiscoveryRequest, Manifest, VersionResolution};
pub use discovery::{Discovery, DiscoveryEngine, DiscoveryError};
pub use resolver::{ResolveError, VersionEngine, VersionResolver};
pub use util::cancel::CancelToken;
pub use util::context::GlobalContext;

//! Core data structures for modfleet.
//!
//! This module contains the types shared by every engine:
//! - Discovery requests and the modules and dependents they produce
//! - Version resolutions and their provenance
//! - The fleet manifest, its defaults expansion and validation

pub mod defaults;
pub mod dependent;
pub mod manifest;
pub mod module;
pub mod request;
pub mod resolution;
pub mod validate;

pub use defaults::{expand_dependent, expand_manifest};
pub use dependent::DependentDescriptor;
pub use manifest::{Defaults, Dependent, Manifest, Module, MANIFEST_NAME};
pub use module::DiscoveredModule;
pub use request::{DiscoveryRequest, DiscoveryScope, RequestError};
pub use resolution::{VersionResolution, VersionSource};
pub use validate::{validate, ValidationError};

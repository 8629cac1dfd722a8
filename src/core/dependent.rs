//! The normalized discovery result handed to manifest generation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::manifest::Dependent;
use crate::core::module::{clone_url, infer_repository, path_within_repo};

/// A repository found to depend on the target module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependentDescriptor {
    /// Repository as `host/owner/name`
    pub repository: String,

    /// HTTPS clone URL
    pub clone_url: String,

    /// Module path of the dependent itself
    pub module: String,

    /// Directory of the module within the repository (`.` for the root)
    pub module_path: String,

    /// Version of the target module currently pinned, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,

    /// Checkout location for workspace discovery
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_commands: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

impl DependentDescriptor {
    /// Build a descriptor from the dependent's module path.
    ///
    /// Repository, clone URL and in-repo path are all inferred from the
    /// module path.
    pub fn from_module(module: impl Into<String>) -> Self {
        let module = module.into();
        let repository = infer_repository(&module);
        DependentDescriptor {
            clone_url: clone_url(&repository),
            module_path: path_within_repo(&module),
            repository,
            module,
            current_version: None,
            local_path: None,
            branch: None,
            test_commands: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Set the pinned version of the target.
    pub fn with_current_version(mut self, version: Option<String>) -> Self {
        self.current_version = version;
        self
    }

    /// Set the local checkout location.
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    /// Convert into a manifest dependent entry.
    pub fn into_dependent(self) -> Dependent {
        Dependent {
            repo: self.repository,
            clone_url: Some(self.clone_url),
            module: self.module,
            module_path: Some(self.module_path),
            branch: self.branch,
            tests: self.test_commands,
            labels: self.labels,
            ..Dependent::default()
        }
    }
}

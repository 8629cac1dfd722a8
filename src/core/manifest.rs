//! Fleet manifest schema.
//!
//! The manifest lists tracked modules and the repositories that depend on
//! them. It is a thin serde shim: parsing here only checks TOML syntax and
//! field types, the rules live in [`crate::core::validate`].
//!
//! ```toml
//! version = 1
//!
//! [defaults]
//! branch = "main"
//! tests = ["go test ./..."]
//!
//! [[modules]]
//! name = "lib"
//! module = "github.com/acme/lib"
//! repo = "github.com/acme/lib"
//!
//! [[modules.dependents]]
//! repo = "github.com/acme/api"
//! module = "github.com/acme/api"
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// The only manifest schema version understood.
pub const SCHEMA_VERSION: u32 = 1;

/// Default manifest file name.
pub const MANIFEST_NAME: &str = "modfleet.toml";

/// Top-level manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Schema version
    #[serde(default)]
    pub version: u32,

    /// Fleet-wide defaults
    #[serde(default)]
    pub defaults: Defaults,

    /// Tracked modules. `None` when the section is absent entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<Vec<Module>>,
}

/// Settings inherited by dependents that leave them unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Test commands run for every dependent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<String>,

    /// Commands run after the version bump, before tests
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_commands: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    /// Notification channel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<String>,

    /// Pull request title template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_title: Option<String>,
}

/// A tracked module.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Short name used in reports
    #[serde(default)]
    pub name: String,

    /// Module path
    #[serde(default)]
    pub module: String,

    /// Repository hosting the module
    #[serde(default)]
    pub repo: String,

    /// Module-wide defaults, layered over the manifest defaults
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Defaults>,

    #[serde(default)]
    pub dependents: Vec<Dependent>,
}

/// A repository depending on a tracked module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependent {
    /// Repository as `host/owner/name`
    #[serde(default)]
    pub repo: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_url: Option<String>,

    /// Module path of the dependent itself
    #[serde(default)]
    pub module: String,

    /// Directory of the module inside the repository
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tests: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_commands: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_title: Option<String>,
}

impl Manifest {
    /// Create an empty manifest at the current schema version.
    pub fn new() -> Self {
        Manifest {
            version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            modules: Some(Vec::new()),
        }
    }

    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Parse manifest content.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("invalid manifest TOML")
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize manifest")
    }

    /// Write the manifest to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml_string()?;
        std::fs::write(path, contents)
            .with_context(|| format!("failed to write manifest: {}", path.display()))
    }

    /// Iterate over modules, empty if the section is absent.
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter().flatten()
    }

    /// Find a module by name.
    pub fn module_by_name(&self, name: &str) -> Option<&Module> {
        self.modules().find(|m| m.name == name)
    }
}

//! Workspace and manifest fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::core::module::DiscoveredModule;
use crate::modfile::{self, ModFile};

/// A temporary directory tree of Go modules.
///
/// Dropping it removes the directory.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        TestWorkspace {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write a module at `rel` declaring `identifier` and requiring each
    /// `(path, version)` pair.
    pub fn module(&self, rel: &str, identifier: &str, requires: &[(&str, &str)]) -> DiscoveredModule {
        self.module_with(rel, &go_mod(identifier, requires))
    }

    /// Write a module at `rel` with a verbatim `go.mod`.
    pub fn module_with(&self, rel: &str, content: &str) -> DiscoveredModule {
        let location = self.path(rel);
        write_module(&location, content);

        let identifier = ModFile::parse(content)
            .ok()
            .and_then(|m| m.module_path().map(str::to_string))
            .unwrap_or_default();
        DiscoveredModule::new(location, identifier)
    }

    /// Write an arbitrary file, creating parent directories.
    pub fn file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create directory");
        }
        fs::write(&path, content).expect("failed to write file");
        path
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `content` as the `go.mod` of `dir`, creating the directory.
pub fn write_module(dir: &Path, content: &str) {
    fs::create_dir_all(dir).expect("failed to create module dir");
    fs::write(dir.join(modfile::FILE_NAME), content).expect("failed to write go.mod");
}

/// A `go.mod` with a single require block.
pub fn go_mod(identifier: &str, requires: &[(&str, &str)]) -> String {
    let mut content = format!("module {}\n\ngo 1.22\n", identifier);
    if !requires.is_empty() {
        content.push_str("\nrequire (\n");
        for (path, version) in requires {
            content.push_str(&format!("\t{} {}\n", path, version));
        }
        content.push_str(")\n");
    }
    content
}

/// A manifest with two modules where `api` depends on `lib`.
pub fn sample_manifest() -> &'static str {
    r#"version = 1

[defaults]
branch = "main"
tests = ["go test ./..."]
labels = ["deps"]

[[modules]]
name = "lib"
module = "github.com/acme/lib"
repo = "github.com/acme/lib"

[[modules.dependents]]
repo = "github.com/acme/api"
module = "github.com/acme/api"

[[modules.dependents]]
repo = "github.com/acme/mono"
module = "github.com/acme/mono/svc/billing"
module_path = "svc/billing"
tests = ["make test"]

[[modules]]
name = "api"
module = "github.com/acme/api"
repo = "github.com/acme/api"
"#
}

/// A manifest where `lib` and `api` depend on each other.
pub fn cyclic_manifest() -> &'static str {
    r#"version = 1

[[modules]]
name = "lib"
module = "github.com/acme/lib"
repo = "github.com/acme/lib"

[[modules.dependents]]
repo = "github.com/acme/api"
module = "github.com/acme/api"

[[modules]]
name = "api"
module = "github.com/acme/api"
repo = "github.com/acme/api"

[[modules.dependents]]
repo = "github.com/acme/lib"
module = "github.com/acme/lib"
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_fixture_parses() {
        let ws = TestWorkspace::new();
        let module = ws.module("api", "github.com/acme/api", &[("github.com/acme/lib", "v1.0.0")]);

        assert_eq!(module.identifier, "github.com/acme/api");
        let parsed = ModFile::load(&module.location.join("go.mod")).unwrap();
        assert!(parsed.depends_on("github.com/acme/lib"));
    }

    #[test]
    fn test_manifest_fixtures_load() {
        let manifest = crate::core::Manifest::parse(sample_manifest()).unwrap();
        assert_eq!(manifest.modules().count(), 2);
        assert!(crate::core::Manifest::parse(cyclic_manifest()).is_ok());
    }
}

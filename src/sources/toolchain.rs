//! The `go` command as a source of module information.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::modfile::is_path_prefix;
use crate::util::cancel::CancelToken;
use crate::util::process::{Executor, ProcessBuilder};

/// Proxy used for version listings when none is configured.
pub const DEFAULT_GOPROXY: &str = "https://proxy.golang.org,direct";

/// Program name used when no explicit path is configured.
pub const DEFAULT_GO_PROGRAM: &str = "go";

/// Output of `go list -m -json <module>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleInfo {
    pub path: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub replace: Option<Box<ModuleInfo>>,
    #[serde(default)]
    pub main: bool,
}

impl ModuleInfo {
    /// The version actually built: a versioned replacement wins.
    pub fn effective_version(&self) -> Option<String> {
        let replaced = self
            .replace
            .as_ref()
            .and_then(|r| r.version.clone())
            .filter(|v| !v.is_empty());
        replaced.or_else(|| self.version.clone().filter(|v| !v.is_empty()))
    }
}

/// Wrapper around the `go` binary.
#[derive(Clone)]
pub struct GoToolchain {
    executor: Arc<dyn Executor>,
    program: PathBuf,
    goproxy: Option<String>,
}

impl GoToolchain {
    pub fn new(executor: Arc<dyn Executor>, program: impl Into<PathBuf>) -> Self {
        GoToolchain {
            executor,
            program: program.into(),
            goproxy: None,
        }
    }

    /// Use `goproxy` for version listings instead of [`DEFAULT_GOPROXY`].
    pub fn with_goproxy(mut self, goproxy: Option<String>) -> Self {
        self.goproxy = goproxy.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The proxy setting passed to version listings.
    pub fn goproxy(&self) -> &str {
        self.goproxy.as_deref().unwrap_or(DEFAULT_GOPROXY)
    }

    fn command(&self) -> ProcessBuilder {
        ProcessBuilder::new(&self.program)
    }

    /// Module paths in the build list of the module at `dir` (`go list -m all`).
    ///
    /// The main module is the first entry.
    pub fn list_modules(&self, dir: &Path, cancel: &CancelToken) -> Result<Vec<String>> {
        let cmd = self.command().args(["list", "-m", "all"]).cwd(dir);
        let output = self.executor.exec_and_check(&cmd, cancel)?;

        Ok(output
            .stdout
            .lines()
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect())
    }

    /// Whether the build list at `dir` contains `target` or one of its
    /// nested modules. The main module itself does not count.
    pub fn build_list_contains(&self, dir: &Path, target: &str, cancel: &CancelToken) -> Result<bool> {
        let modules = self.list_modules(dir, cancel)?;
        Ok(modules
            .iter()
            .skip(1)
            .any(|path| is_path_prefix(target, path)))
    }

    /// `go list -m -json <target>` evaluated in the module at `dir`.
    pub fn module_info(&self, dir: &Path, target: &str, cancel: &CancelToken) -> Result<ModuleInfo> {
        let cmd = self
            .command()
            .args(["list", "-m", "-json", target])
            .cwd(dir);
        let output = self.executor.exec_and_check(&cmd, cancel)?;

        serde_json::from_str(&output.stdout)
            .with_context(|| format!("invalid JSON from `{}`", cmd.display_command()))
    }

    /// Raw `go list -m -versions <module>` output, queried through the proxy.
    pub fn list_versions(
        &self,
        module: &str,
        dir: Option<&Path>,
        cancel: &CancelToken,
    ) -> Result<String> {
        let mut cmd = self
            .command()
            .args(["list", "-m", "-versions", module])
            .env("GOPROXY", self.goproxy())
            .env("GO111MODULE", "on")
            .env("GOFLAGS", "-mod=mod");
        if let Some(dir) = dir {
            cmd = cmd.cwd(dir);
        }

        tracing::debug!("listing versions of {} via {}", module, self.goproxy());
        let output = self.executor.exec_and_check(&cmd, cancel)?;
        Ok(output.stdout)
    }
}

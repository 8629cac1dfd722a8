//! Global context for modfleet operations.
//!
//! Holds the working directory, the merged configuration and the GitHub
//! credential, each resolved once at startup. Operations get their
//! collaborators (executor, toolchain, hosting client) from here instead of
//! reading the environment themselves.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::hosting::{GitHubClient, HostingApi, DEFAULT_API_URL};
use crate::sources::git::{Git2RefLister, RefLister};
use crate::sources::toolchain::{GoToolchain, DEFAULT_GO_PROGRAM};
use crate::util::config::{
    global_config_path, load_config, project_config_path, Config, Credential, EnvOverrides,
};
use crate::util::process::{find_executable, Executor, SystemExecutor};

/// Global context for modfleet operations.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Merged file configuration with environment overrides applied
    config: Config,

    /// GitHub credential, if any token variable is set
    credential: Option<Credential>,

    /// Whether to use verbose output
    verbose: bool,
}

impl GlobalContext {
    /// Create a GlobalContext for the current directory and process
    /// environment.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::from_parts(
            cwd,
            global_config_path().as_deref(),
            EnvOverrides::from_env(),
        ))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        Ok(Self::from_parts(
            cwd,
            global_config_path().as_deref(),
            EnvOverrides::from_env(),
        ))
    }

    /// Assemble a context from explicit inputs.
    pub fn from_parts(cwd: PathBuf, global_config: Option<&Path>, env: EnvOverrides) -> Self {
        let mut config = load_config(global_config, &project_config_path(&cwd));
        config.apply_env(&env);

        if let Some(ref credential) = env.credential {
            tracing::debug!("using GitHub token from {}", credential.source());
        }

        GlobalContext {
            cwd,
            config,
            credential: env.credential,
            verbose: false,
        }
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Whether network version lookups are allowed by configuration.
    pub fn network_allowed(&self) -> bool {
        self.config.network.allow
    }

    /// Probe parallelism, sequential unless configured.
    pub fn jobs(&self) -> usize {
        self.config.discovery.jobs.unwrap_or(1).max(1)
    }

    /// Resolve a possibly relative path against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    pub fn executor(&self) -> Arc<dyn Executor> {
        Arc::new(SystemExecutor)
    }

    /// The `go` binary: configured path, else the one on PATH.
    pub fn go_program(&self) -> PathBuf {
        match self.config.toolchain.go {
            Some(ref go) => go.clone(),
            None => find_executable(DEFAULT_GO_PROGRAM)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GO_PROGRAM)),
        }
    }

    pub fn go_toolchain(&self) -> GoToolchain {
        GoToolchain::new(self.executor(), self.go_program())
            .with_goproxy(self.config.network.goproxy.clone())
    }

    /// The GitHub API base URL, honouring enterprise overrides.
    pub fn api_url(&self) -> &str {
        self.config
            .github
            .api_url
            .as_deref()
            .unwrap_or(DEFAULT_API_URL)
    }

    pub fn github_client(&self) -> Result<GitHubClient> {
        GitHubClient::new(self.api_url(), self.credential.clone())
    }

    pub fn hosting_api(&self) -> Result<Arc<dyn HostingApi>> {
        Ok(Arc::new(self.github_client()?))
    }

    pub fn ref_lister(&self) -> Arc<dyn RefLister> {
        Arc::new(Git2RefLister)
    }
}

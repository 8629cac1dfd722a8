//! Configuration file support for modfleet.
//!
//! modfleet supports two configuration file locations:
//! - Global: `~/.modfleet/config.toml` - User-wide defaults
//! - Project: `.modfleet/config.toml` - Workspace-specific overrides
//!
//! Project config takes precedence over global config. A handful of
//! environment variables take precedence over both (see [`EnvOverrides`]).

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variables consulted for the GitHub credential, in order.
pub const TOKEN_ENV_VARS: [&str; 3] = ["GITHUB_TOKEN", "GH_TOKEN", "GITHUB_PAT"];

/// Environment variable overriding the GitHub API base URL.
pub const API_URL_ENV: &str = "GITHUB_API_URL";

/// Environment variable overriding the `go` binary.
pub const GO_BINARY_ENV: &str = "MODFLEET_GO";

/// Environment variable naming the Go module proxy.
pub const GOPROXY_ENV: &str = "GOPROXY";

/// modfleet configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub settings
    pub github: GitHubConfig,

    /// Network settings
    pub network: NetConfig,

    /// Go toolchain settings
    pub toolchain: ToolchainConfig,

    /// Discovery defaults
    pub discovery: DiscoveryConfig,
}

/// GitHub API configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// API base URL for GitHub Enterprise (e.g. https://ghe.example.com/api/v3)
    pub api_url: Option<String>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Allow version lookups against the module proxy
    pub allow: bool,

    /// Module proxy used when GOPROXY is unset
    pub goproxy: Option<String>,
}

/// Go toolchain configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Path to the `go` binary
    pub go: Option<PathBuf>,
}

/// Defaults applied to discovery requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Maximum directory depth for local scans
    pub max_depth: Option<usize>,

    /// Glob patterns a module path must match
    pub include: Vec<String>,

    /// Glob patterns that exclude a module path
    pub exclude: Vec<String>,

    /// Number of concurrent probes (1 = sequential)
    pub jobs: Option<usize>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.github.api_url.is_some() {
            self.github.api_url = other.github.api_url;
        }
        if other.network.allow {
            self.network.allow = true;
        }
        if other.network.goproxy.is_some() {
            self.network.goproxy = other.network.goproxy;
        }
        if other.toolchain.go.is_some() {
            self.toolchain.go = other.toolchain.go;
        }
        if other.discovery.max_depth.is_some() {
            self.discovery.max_depth = other.discovery.max_depth;
        }
        if !other.discovery.include.is_empty() {
            self.discovery.include = other.discovery.include;
        }
        if !other.discovery.exclude.is_empty() {
            self.discovery.exclude = other.discovery.exclude;
        }
        if other.discovery.jobs.is_some() {
            self.discovery.jobs = other.discovery.jobs;
        }
    }

    /// Apply environment overrides on top of file configuration.
    pub fn apply_env(&mut self, env: &EnvOverrides) {
        if let Some(ref url) = env.api_url {
            self.github.api_url = Some(url.clone());
        }
        if let Some(ref go) = env.go_binary {
            self.toolchain.go = Some(go.clone());
        }
        if let Some(ref proxy) = env.goproxy {
            self.network.goproxy = Some(proxy.clone());
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.modfleet/config.toml)
/// 2. Global config (~/.modfleet/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global modfleet config directory (~/.modfleet).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".modfleet"))
}

/// Get the global config path (~/.modfleet/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.modfleet/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".modfleet").join("config.toml")
}

/// Values read from the process environment, captured once.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub api_url: Option<String>,
    pub go_binary: Option<PathBuf>,
    pub goproxy: Option<String>,
    pub credential: Option<Credential>,
}

impl EnvOverrides {
    /// Capture overrides from the real process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Capture overrides through an arbitrary lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        EnvOverrides {
            api_url: non_empty(API_URL_ENV),
            go_binary: non_empty(GO_BINARY_ENV).map(PathBuf::from),
            goproxy: non_empty(GOPROXY_ENV),
            credential: resolve_credential(&non_empty),
        }
    }
}

/// A bearer credential for the hosting API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    source: &'static str,
}

impl Credential {
    pub fn new(token: impl Into<String>, source: &'static str) -> Self {
        Credential {
            token: token.into(),
            source,
        }
    }

    /// The raw bearer token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Name of the environment variable the token came from.
    pub fn source(&self) -> &'static str {
        self.source
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Pick the first non-empty token in [`TOKEN_ENV_VARS`] order.
pub fn resolve_credential(lookup: impl Fn(&str) -> Option<String>) -> Option<Credential> {
    TOKEN_ENV_VARS.iter().find_map(|&key| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|token| Credential::new(token, key))
    })
}

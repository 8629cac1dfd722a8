//! Implementation of `modfleet version`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::resolution::VersionResolution;
use crate::discovery::{scan_modules, PathFilter};
use crate::resolver::{
    LocalStrategy, LocalVersionResolver, RemoteStrategy, RemoteVersionResolver, ResolveError,
    VersionEngine, VersionResolver,
};
use crate::util::cancel::CancelToken;
use crate::util::GlobalContext;

/// Every way a version can be resolved, local and remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionStrategy {
    Local,
    Network,
    #[default]
    Auto,
    Tags,
    Proxy,
    /// Proxy, then tags if the proxy fails
    ProxyOrTags,
    GitRemote,
}

impl VersionStrategy {
    pub const ALL: [VersionStrategy; 7] = [
        VersionStrategy::Local,
        VersionStrategy::Network,
        VersionStrategy::Auto,
        VersionStrategy::Tags,
        VersionStrategy::Proxy,
        VersionStrategy::ProxyOrTags,
        VersionStrategy::GitRemote,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStrategy::Local => "local",
            VersionStrategy::Network => "network",
            VersionStrategy::Auto => "auto",
            VersionStrategy::Tags => "tags",
            VersionStrategy::Proxy => "proxy",
            VersionStrategy::ProxyOrTags => "proxy-or-tags",
            VersionStrategy::GitRemote => "git",
        }
    }

    fn local(&self) -> Option<LocalStrategy> {
        match self {
            VersionStrategy::Local => Some(LocalStrategy::Local),
            VersionStrategy::Network => Some(LocalStrategy::Network),
            VersionStrategy::Auto => Some(LocalStrategy::Auto),
            _ => None,
        }
    }

    fn remote(&self) -> Option<RemoteStrategy> {
        match self {
            VersionStrategy::Tags => Some(RemoteStrategy::Tags),
            VersionStrategy::Proxy => Some(RemoteStrategy::Proxy {
                fallback_to_tags: false,
            }),
            VersionStrategy::ProxyOrTags => Some(RemoteStrategy::Proxy {
                fallback_to_tags: true,
            }),
            VersionStrategy::GitRemote => Some(RemoteStrategy::GitRemote),
            _ => None,
        }
    }
}

impl fmt::Display for VersionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_lowercase();
        match s.as_str() {
            "git-remote" => return Ok(VersionStrategy::GitRemote),
            "local-only" => return Ok(VersionStrategy::Local),
            "network-only" => return Ok(VersionStrategy::Network),
            _ => {}
        }
        VersionStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| format!("unknown version strategy `{}`", s))
    }
}

/// Options for resolving a version.
#[derive(Debug, Clone, Default)]
pub struct VersionOptions {
    pub strategy: VersionStrategy,

    /// Workspace scanned by the local strategies (defaults to cwd)
    pub workspace: Option<PathBuf>,

    /// Permit proxy lookups from the local strategies
    pub allow_network: bool,

    pub max_depth: Option<usize>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Resolve the version of `target`.
///
/// Errors keep their [`ResolveError`] type so callers can show the warning
/// trail of an exhausted resolution.
pub fn resolve_version(
    ctx: &GlobalContext,
    target: &str,
    opts: &VersionOptions,
    cancel: &CancelToken,
) -> Result<VersionResolution, ResolveError> {
    let engine = build_engine(ctx, opts, cancel)?;
    engine.resolve(target, cancel)
}

fn build_engine(
    ctx: &GlobalContext,
    opts: &VersionOptions,
    cancel: &CancelToken,
) -> Result<VersionEngine, ResolveError> {
    if let Some(strategy) = opts.strategy.remote() {
        return Ok(VersionEngine::Remote(RemoteVersionResolver::new(
            strategy,
            ctx.hosting_api()?,
            ctx.go_toolchain(),
            ctx.ref_lister(),
        )));
    }

    let strategy = opts.strategy.local().unwrap_or_default();
    let modules = if strategy == LocalStrategy::Network {
        Vec::new()
    } else {
        let defaults = &ctx.config().discovery;
        let include = if opts.include.is_empty() { &defaults.include } else { &opts.include };
        let exclude = if opts.exclude.is_empty() { &defaults.exclude } else { &opts.exclude };
        let filter = PathFilter::new(include, exclude).map_err(|e| ResolveError::Other(e.into()))?;

        let root = ctx.resolve_path(opts.workspace.as_deref().unwrap_or(ctx.cwd()));
        scan_modules(&root, opts.max_depth.or(defaults.max_depth), &filter, cancel)?
    };

    Ok(VersionEngine::Local(
        LocalVersionResolver::new(strategy, modules, ctx.go_toolchain())
            .allow_network(opts.allow_network || ctx.network_allowed()),
    ))
}

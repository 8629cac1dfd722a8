//! Implementation of `modfleet discover`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::dependent::DependentDescriptor;
use crate::core::request::{DiscoveryRequest, DiscoveryScope};
use crate::discovery::{Discovery, DiscoveryEngine, LocalDiscovery, LocalProber, RemoteDiscovery};
use crate::util::cancel::CancelToken;
use crate::util::GlobalContext;

/// Options for discovering dependents.
#[derive(Debug, Clone, Default)]
pub struct DiscoverOptions {
    /// Module path whose dependents are wanted
    pub target: String,

    /// Only report dependents pinned strictly below this version
    pub target_version: Option<String>,

    /// Directory depth limit (local only, falls back to config)
    pub max_depth: Option<usize>,

    /// Include patterns (falls back to config for local discovery)
    pub include: Vec<String>,

    /// Exclude patterns (falls back to config for local discovery)
    pub exclude: Vec<String>,

    /// Result cap
    pub limit: Option<usize>,

    /// Raw search query (remote only)
    pub query: Option<String>,

    /// Concurrent probes (falls back to config)
    pub jobs: Option<usize>,
}

impl DiscoverOptions {
    pub fn new(target: impl Into<String>) -> Self {
        DiscoverOptions {
            target: target.into(),
            ..DiscoverOptions::default()
        }
    }

    fn request(&self, scope: DiscoveryScope) -> DiscoveryRequest {
        let mut request = match scope {
            DiscoveryScope::Workspace(root) => DiscoveryRequest::workspace(root, &self.target),
            DiscoveryScope::Organization(org) => DiscoveryRequest::organization(org, &self.target),
        };
        request.target_version = self.target_version.clone();
        request.max_depth = self.max_depth;
        request.include = self.include.clone();
        request.exclude = self.exclude.clone();
        request.limit = self.limit;
        request.query = self.query.clone();
        request
    }

    fn jobs(&self, ctx: &GlobalContext) -> usize {
        self.jobs.unwrap_or_else(|| ctx.jobs()).max(1)
    }
}

/// Find the modules under `root` that depend on `opts.target`.
pub fn discover_local(
    ctx: &GlobalContext,
    root: &Path,
    opts: &DiscoverOptions,
    cancel: &CancelToken,
) -> Result<Vec<DependentDescriptor>> {
    let root = ctx.resolve_path(root);
    let mut request = opts.request(DiscoveryScope::Workspace(root));

    let defaults = &ctx.config().discovery;
    if request.max_depth.is_none() {
        request.max_depth = defaults.max_depth;
    }
    if request.include.is_empty() {
        request.include = defaults.include.clone();
    }
    if request.exclude.is_empty() {
        request.exclude = defaults.exclude.clone();
    }

    let prober = LocalProber::new(ctx.go_toolchain());
    let engine = DiscoveryEngine::Local(LocalDiscovery::new(prober).with_jobs(opts.jobs(ctx)));
    run(&engine, &request, cancel)
}

/// Find the repositories of GitHub organization `org` that depend on
/// `opts.target`.
pub fn discover_remote(
    ctx: &GlobalContext,
    org: &str,
    opts: &DiscoverOptions,
    cancel: &CancelToken,
) -> Result<Vec<DependentDescriptor>> {
    let request = opts.request(DiscoveryScope::Organization(org.to_string()));
    let api = ctx.hosting_api()?;
    let engine = DiscoveryEngine::Remote(RemoteDiscovery::new(api).with_jobs(opts.jobs(ctx)));
    run(&engine, &request, cancel)
}

/// Run any discovery engine over a prepared request.
pub fn run(
    engine: &impl Discovery,
    request: &DiscoveryRequest,
    cancel: &CancelToken,
) -> Result<Vec<DependentDescriptor>> {
    engine
        .discover(request, cancel)
        .with_context(|| format!("failed to discover dependents of `{}`", request.target))
}

//! Version resolution from a local workspace.
//!
//! [`LocalStrategy::Local`] reads the version pinned by the workspace's
//! modules, [`LocalStrategy::Network`] asks the module proxy for the
//! published versions and [`LocalStrategy::Auto`] tries the former, then the
//! latter.

use crate::core::module::DiscoveredModule;
use crate::core::resolution::{VersionResolution, VersionSource};
use crate::discovery::probe::LocalProber;
use crate::resolver::{latest_of, versions_from_listing, ResolveError, VersionResolver};
use crate::sources::toolchain::GoToolchain;
use crate::util::cancel::{is_cancellation, CancelToken};

/// How a [`LocalVersionResolver`] finds a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalStrategy {
    /// Only the versions pinned by local modules
    Local,
    /// Only the module proxy (requires network access)
    Network,
    /// Local first, then the network if allowed
    #[default]
    Auto,
}

pub struct LocalVersionResolver {
    strategy: LocalStrategy,
    modules: Vec<DiscoveredModule>,
    prober: LocalProber,
    toolchain: GoToolchain,
    allow_network: bool,
}

impl LocalVersionResolver {
    /// Resolver over `modules`, consulted in the given order.
    pub fn new(strategy: LocalStrategy, modules: Vec<DiscoveredModule>, toolchain: GoToolchain) -> Self {
        LocalVersionResolver {
            strategy,
            modules,
            prober: LocalProber::new(toolchain.clone()),
            toolchain,
            allow_network: false,
        }
    }

    pub fn allow_network(mut self, allow: bool) -> Self {
        self.allow_network = allow;
        self
    }

    /// First version of `target` pinned by a local module.
    fn resolve_local(
        &self,
        target: &str,
        cancel: &CancelToken,
    ) -> Result<(String, String), ResolveError> {
        for module in &self.modules {
            cancel.check()?;
            match self.prober.pinned_version(module, target, cancel) {
                Ok(Some(version)) => {
                    tracing::debug!(
                        "{} pins {} at {}",
                        module.identifier,
                        target,
                        version
                    );
                    return Ok((version, module.location.display().to_string()));
                }
                Ok(None) => {}
                Err(e) if is_cancellation(&e) => return Err(e.into()),
                Err(e) => tracing::debug!(
                    "skipping {}: {:#}",
                    module.location.display(),
                    e
                ),
            }
        }

        Err(ResolveError::NotFoundLocally {
            module: target.to_string(),
        })
    }

    /// Greatest version of `target` published through the proxy.
    fn resolve_network(&self, target: &str, cancel: &CancelToken) -> Result<String, ResolveError> {
        if !self.allow_network {
            return Err(ResolveError::NetworkDisabled);
        }

        let output = self.toolchain.list_versions(target, None, cancel)?;
        let versions = versions_from_listing(target, &output)?;
        latest_of(target, &versions)
    }
}

impl VersionResolver for LocalVersionResolver {
    fn resolve(&self, target: &str, cancel: &CancelToken) -> Result<VersionResolution, ResolveError> {
        let mut resolution = VersionResolution::new();

        match self.strategy {
            LocalStrategy::Local => {
                let (version, path) = self.resolve_local(target, cancel)?;
                resolution.resolve(version, VersionSource::Local, Some(path));
            }
            LocalStrategy::Network => {
                let version = self.resolve_network(target, cancel)?;
                resolution.resolve(
                    version,
                    VersionSource::Network,
                    Some(self.toolchain.goproxy().to_string()),
                );
            }
            LocalStrategy::Auto => {
                match self.resolve_local(target, cancel) {
                    Ok((version, path)) => {
                        resolution.resolve(version, VersionSource::Local, Some(path));
                        return Ok(resolution);
                    }
                    Err(e) if e.is_cancelled() => return Err(e),
                    Err(e) => resolution.warn(format!("local lookup failed: {}", e)),
                }

                if !self.allow_network {
                    resolution.warn("network lookup skipped: network access is disabled");
                    return Err(ResolveError::Exhausted {
                        module: target.to_string(),
                        warnings: resolution.take_warnings(),
                    });
                }

                match self.resolve_network(target, cancel) {
                    Ok(version) => resolution.resolve(
                        version,
                        VersionSource::Fallback,
                        Some(self.toolchain.goproxy().to_string()),
                    ),
                    Err(e) if e.is_cancelled() => return Err(e),
                    Err(e) => {
                        resolution.warn(format!("network lookup failed: {}", e));
                        return Err(ResolveError::Exhausted {
                            module: target.to_string(),
                            warnings: resolution.take_warnings(),
                        });
                    }
                }
            }
        }

        tracing::info!(
            "resolved {} to {} ({})",
            target,
            resolution.version,
            resolution.source
        );
        Ok(resolution)
    }
}

//! Version resolution from remote sources.

use std::sync::Arc;

use crate::core::module::{clone_url, infer_repository, split_repository};
use crate::core::resolution::{VersionResolution, VersionSource};
use crate::hosting::HostingApi;
use crate::resolver::{latest_of, versions_from_listing, ResolveError, VersionResolver};
use crate::sources::git::{tag_names, RefLister};
use crate::sources::toolchain::GoToolchain;
use crate::util::cancel::CancelToken;

/// Tags requested from the hosting API.
pub const TAGS_PAGE_SIZE: u32 = 100;

/// Where a [`RemoteVersionResolver`] reads versions from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStrategy {
    /// Repository tags from the hosting API
    Tags,
    /// `go list -m -versions` through the module proxy
    Proxy { fallback_to_tags: bool },
    /// Tag refs advertised by the git remote
    GitRemote,
}

impl Default for RemoteStrategy {
    fn default() -> Self {
        RemoteStrategy::Tags
    }
}

pub struct RemoteVersionResolver {
    strategy: RemoteStrategy,
    api: Arc<dyn HostingApi>,
    toolchain: GoToolchain,
    refs: Arc<dyn RefLister>,
}

impl RemoteVersionResolver {
    pub fn new(
        strategy: RemoteStrategy,
        api: Arc<dyn HostingApi>,
        toolchain: GoToolchain,
        refs: Arc<dyn RefLister>,
    ) -> Self {
        RemoteVersionResolver {
            strategy,
            api,
            toolchain,
            refs,
        }
    }

    fn from_tags(&self, target: &str, cancel: &CancelToken) -> Result<String, ResolveError> {
        let repository = infer_repository(target);
        let host = self.api.web_host();
        let (owner, name) = match split_repository(&repository) {
            Some((repo_host, owner, name)) if repo_host == host => (owner, name),
            _ => {
                return Err(ResolveError::UnsupportedModule {
                    module: target.to_string(),
                    host: host.to_string(),
                })
            }
        };

        let tags = self.api.list_tags(owner, name, TAGS_PAGE_SIZE, cancel)?;
        tracing::debug!("{} has {} tags", repository, tags.len());
        latest_of(&repository, &tags)
    }

    fn from_proxy(&self, target: &str, cancel: &CancelToken) -> Result<String, ResolveError> {
        let output = self.toolchain.list_versions(target, None, cancel)?;
        let versions = versions_from_listing(target, &output)?;
        latest_of(target, &versions)
    }

    fn from_git_remote(&self, target: &str, cancel: &CancelToken) -> Result<String, ResolveError> {
        let repository = infer_repository(target);
        let refs = self.refs.list_refs(&clone_url(&repository), cancel)?;
        latest_of(&repository, &tag_names(&refs))
    }
}

impl VersionResolver for RemoteVersionResolver {
    fn resolve(&self, target: &str, cancel: &CancelToken) -> Result<VersionResolution, ResolveError> {
        let mut resolution = VersionResolution::new();

        match self.strategy {
            RemoteStrategy::Tags => {
                let version = self.from_tags(target, cancel)?;
                resolution.resolve(version, VersionSource::Network, Some("tags".into()));
            }
            RemoteStrategy::Proxy { fallback_to_tags } => match self.from_proxy(target, cancel) {
                Ok(version) => resolution.resolve(
                    version,
                    VersionSource::Network,
                    Some(self.toolchain.goproxy().to_string()),
                ),
                Err(e) if e.is_cancelled() || !fallback_to_tags => return Err(e),
                Err(e) => {
                    resolution.warn(format!("proxy lookup failed, falling back to tags: {}", e));
                    match self.from_tags(target, cancel) {
                        Ok(version) => {
                            resolution.resolve(version, VersionSource::Fallback, Some("tags".into()))
                        }
                        Err(e) if e.is_cancelled() => return Err(e),
                        Err(e) => {
                            resolution.warn(format!("tag lookup failed: {}", e));
                            return Err(ResolveError::Exhausted {
                                module: target.to_string(),
                                warnings: resolution.take_warnings(),
                            });
                        }
                    }
                }
            },
            RemoteStrategy::GitRemote => {
                let version = self.from_git_remote(target, cancel)?;
                resolution.resolve(version, VersionSource::Network, Some("git".into()));
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

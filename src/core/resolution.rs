//! The outcome of a version resolution.

use std::fmt;

use serde::Serialize;

/// Where a resolved version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSource {
    /// Pinned in a local module's dependency graph
    Local,
    /// Queried from a registry, tag listing or remote refs
    Network,
    /// Obtained from a secondary strategy after the primary one failed
    Fallback,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSource::Local => write!(f, "local"),
            VersionSource::Network => write!(f, "network"),
            VersionSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// A resolved version plus the trail of non-fatal warnings behind it.
///
/// Constructed empty when a resolution starts and filled in as strategies are
/// attempted. A successful resolution can still carry warnings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionResolution {
    pub version: String,
    pub source: VersionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
    pub warnings: Vec<String>,
}

impl VersionResolution {
    /// An empty, not yet resolved result.
    pub fn new() -> Self {
        VersionResolution {
            version: String::new(),
            source: VersionSource::Local,
            source_path: None,
            warnings: Vec::new(),
        }
    }

    /// Record a non-fatal problem.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    /// Fill in the resolved version.
    pub fn resolve(
        &mut self,
        version: impl Into<String>,
        source: VersionSource,
        source_path: Option<String>,
    ) {
        self.version = version.into();
        self.source = source;
        self.source_path = source_path;
    }

    /// Whether a version has been filled in.
    pub fn is_resolved(&self) -> bool {
        !self.version.is_empty()
    }

    /// Take the warnings out, leaving the list empty.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}

impl Default for VersionResolution {
    fn default() -> Self {
        Self::new()
    }
}

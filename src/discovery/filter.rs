//! Include/exclude filtering.
//!
//! Workspace paths use glob patterns. Repository names use a simpler form
//! with at most one `*` wildcard. In both cases exclude wins over include,
//! and an empty include set includes everything.

use std::path::{Component, Path};

use glob::{MatchOptions, Pattern};

use crate::core::request::RequestError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Glob filter over paths relative to a workspace root.
///
/// A pattern matches a path when it matches the path itself or any of its
/// ancestor prefixes, so `vendor` also covers `vendor/a/b`.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, RequestError> {
        Ok(PathFilter {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Whether an exclude pattern covers `rel`.
    pub fn is_excluded(&self, rel: &Path) -> bool {
        matches_any(&self.exclude, rel)
    }

    /// Whether `rel` passes both the include and exclude sets.
    pub fn matches(&self, rel: &Path) -> bool {
        if self.is_excluded(rel) {
            return false;
        }
        self.include.is_empty() || matches_any(&self.include, rel)
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Pattern>, RequestError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p.trim_end_matches('/')).map_err(|e| RequestError::InvalidPattern {
                pattern: p.clone(),
                message: e.msg.to_string(),
            })
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], rel: &Path) -> bool {
    if patterns.is_empty() {
        return false;
    }
    prefixes(rel)
        .iter()
        .any(|prefix| patterns.iter().any(|p| p.matches_with(prefix, MATCH_OPTIONS)))
}

/// `a`, `a/b`, `a/b/c` for `a/b/c`; `.` for the root itself.
fn prefixes(rel: &Path) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for component in rel.components() {
        let Component::Normal(part) = component else {
            continue;
        };
        if !current.is_empty() {
            current.push('/');
        }
        current.push_str(&part.to_string_lossy());
        out.push(current.clone());
    }
    if out.is_empty() {
        out.push(".".to_string());
    }
    out
}

/// A repository name pattern: exact, or `prefix*suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamePattern {
    Exact(String),
    Wildcard { prefix: String, suffix: String },
}

impl NamePattern {
    /// Split on the first `*`. Any later `*` is taken literally.
    pub fn parse(pattern: &str) -> Self {
        match pattern.split_once('*') {
            Some((prefix, suffix)) => NamePattern::Wildcard {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            },
            None => NamePattern::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            NamePattern::Exact(exact) => name == exact,
            NamePattern::Wildcard { prefix, suffix } => {
                name.len() >= prefix.len() + suffix.len()
                    && name.starts_with(prefix.as_str())
                    && name.ends_with(suffix.as_str())
            }
        }
    }
}

/// Filter over bare repository names.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    include: Vec<NamePattern>,
    exclude: Vec<NamePattern>,
}

impl NameFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Self {
        NameFilter {
            include: include.iter().map(|p| NamePattern::parse(p)).collect(),
            exclude: exclude.iter().map(|p| NamePattern::parse(p)).collect(),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        if self.exclude.iter().any(|p| p.matches(name)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|p| p.matches(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exclude_covers_descendants() {
        let filter = PathFilter::new(&[], &strings(&["vendor"])).unwrap();

        assert!(!filter.matches(Path::new("vendor")));
        assert!(!filter.matches(Path::new("vendor/github.com/x/y")));
        assert!(filter.matches(Path::new("services/vendor-tools")));
    }

    #[test]
    fn test_exclude_wins_over_include() {
        let filter =
            PathFilter::new(&strings(&["services/*"]), &strings(&["services/legacy"])).unwrap();

        assert!(filter.matches(Path::new("services/api")));
        assert!(filter.matches(Path::new("services/api/internal")));
        assert!(!filter.matches(Path::new("services/legacy")));
        assert!(!filter.matches(Path::new("services/legacy/deep/module")));
        assert!(!filter.matches(Path::new("tools/cli")));
    }

    #[test]
    fn test_star_does_not_cross_separators() {
        let filter = PathFilter::new(&strings(&["*/api"]), &[]).unwrap();
        assert!(filter.matches(Path::new("svc/api")));
        assert!(!filter.matches(Path::new("a/b/api")));
    }

    #[test]
    fn test_root_matches_dot() {
        let filter = PathFilter::new(&strings(&["."]), &[]).unwrap();
        assert!(filter.matches(Path::new("")));
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = PathFilter::new(&strings(&["[abc"]), &[]).unwrap_err();
        assert!(matches!(err, RequestError::InvalidPattern { .. }));
    }

    #[test]
    fn test_name_patterns() {
        assert!(NamePattern::parse("api-*").matches("api-gateway"));
        assert!(NamePattern::parse("*-svc").matches("billing-svc"));
        assert!(NamePattern::parse("go-*-lib").matches("go-http-lib"));
        assert!(!NamePattern::parse("go-*-lib").matches("go-lib"));
        assert!(NamePattern::parse("*").matches("anything"));
        assert!(NamePattern::parse("api").matches("api"));
        assert!(!NamePattern::parse("api").matches("api-v2"));
    }

    #[test]
    fn test_name_filter_exclude_wins() {
        let filter = NameFilter::new(&strings(&["svc-*"]), &strings(&["*-deprecated"]));
        assert!(filter.matches("svc-billing"));
        assert!(!filter.matches("svc-billing-deprecated"));
        assert!(!filter.matches("website"));
    }
}

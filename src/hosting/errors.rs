//! Hosting provider errors and their classification.

use chrono::{DateTime, SecondsFormat, Utc};
use miette::Diagnostic;
use thiserror::Error;

use crate::hosting::RateLimit;
use crate::util::cancel::Cancelled;

/// Remaining quota below this share of the limit fails the preflight.
pub const RATE_LIMIT_CRITICAL_RATIO: f64 = 0.10;

/// A failed hosting API call, rewritten into something the user can act on.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ProviderError {
    #[error(
        "GitHub API rate limit too low: {remaining}/{limit} requests remaining, resets at {}",
        rfc3339(.reset)
    )]
    #[diagnostic(
        code(modfleet::github::rate_limit_low),
        help("Wait for the quota to reset or authenticate with a token that has a higher limit")
    )]
    RateLimitLow {
        remaining: u64,
        limit: u64,
        reset: DateTime<Utc>,
    },

    #[error("GitHub API rate limit exceeded{}", describe_quota(.quota))]
    #[diagnostic(
        code(modfleet::github::rate_limited),
        help("Wait for the quota to reset before retrying")
    )]
    RateLimited { quota: Option<RateLimit> },

    #[error("GitHub authentication failed: {message}")]
    #[diagnostic(
        code(modfleet::github::authentication),
        help("Set GITHUB_TOKEN, GH_TOKEN or GITHUB_PAT to a valid token")
    )]
    Authentication { message: String },

    #[error("GitHub denied access: {message}")]
    #[diagnostic(
        code(modfleet::github::permission),
        help("Check that the token can read the organization's repositories")
    )]
    Permission { message: String },

    #[error("not found on GitHub: {resource}")]
    #[diagnostic(code(modfleet::github::not_found))]
    NotFound { resource: String },

    #[error("GitHub API returned HTTP {status}: {message}")]
    #[diagnostic(code(modfleet::github::http))]
    Http { status: u16, message: String },

    #[error("GitHub request failed: {message}")]
    #[diagnostic(code(modfleet::github::transport))]
    Transport { message: String },

    #[error("{0}")]
    Cancelled(#[from] Cancelled),
}

impl ProviderError {
    /// Check the preflight quota, failing when it is critically low.
    pub fn check_quota(quota: &RateLimit) -> Result<(), ProviderError> {
        if quota.is_critical() {
            return Err(ProviderError::RateLimitLow {
                remaining: quota.remaining,
                limit: quota.limit,
                reset: quota.reset,
            });
        }
        Ok(())
    }
}

/// Rewrite a raw failure into a [`ProviderError`].
///
/// `status` is the HTTP status when a response was received. `quota` is
/// only called for rate limit failures, to report the live figures.
pub fn classify(
    status: Option<u16>,
    message: &str,
    resource: &str,
    quota: impl FnOnce() -> Option<RateLimit>,
) -> ProviderError {
    let lower = message.to_lowercase();
    let message = message.trim().to_string();

    if status == Some(429) || lower.contains("rate limit") || lower.contains("secondary rate") {
        return ProviderError::RateLimited { quota: quota() };
    }

    if status == Some(401)
        || lower.contains("bad credentials")
        || lower.contains("requires authentication")
    {
        return ProviderError::Authentication { message };
    }

    if status == Some(403)
        || lower.contains("resource not accessible")
        || lower.contains("permission")
    {
        return ProviderError::Permission { message };
    }

    match status {
        Some(404) => ProviderError::NotFound {
            resource: resource.to_string(),
        },
        Some(status) => ProviderError::Http { status, message },
        None => ProviderError::Transport { message },
    }
}

fn rfc3339(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn describe_quota(quota: &Option<RateLimit>) -> String {
    match quota {
        Some(q) => format!(
            " ({}/{} requests remaining, resets at {})",
            q.remaining,
            q.limit,
            rfc3339(&q.reset)
        ),
        None => String::new(),
    }
}

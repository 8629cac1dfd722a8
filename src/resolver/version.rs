//! Go-flavoured semantic version handling.
//!
//! Go module versions are semver with a mandatory `v` prefix, and the toolchain
//! accepts `vMAJOR` and `vMAJOR.MINOR` shorthands. Everything here tolerates a
//! missing prefix. Strings that fail to parse are never ordered lexically;
//! callers skip them.

use std::cmp::Ordering;

use semver::Version;

/// Add the `v` prefix if missing and trim whitespace.
pub fn normalize(version: &str) -> String {
    let trimmed = version.trim();
    if trimmed.starts_with('v') {
        trimmed.to_string()
    } else {
        format!("v{}", trimmed)
    }
}

/// Parse a version string, allowing for a missing prefix and incomplete versions.
pub fn parse(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);

    // Try exact parse first
    if let Ok(v) = bare.parse() {
        return Some(v);
    }

    // Shorthands never carry prerelease or build suffixes.
    if bare.contains(['-', '+']) {
        return None;
    }

    let parts: Vec<&str> = bare.split('.').collect();
    match parts.len() {
        1 => {
            let major = parse_component(parts[0])?;
            Some(Version::new(major, 0, 0))
        }
        2 => {
            let major = parse_component(parts[0])?;
            let minor = parse_component(parts[1])?;
            Some(Version::new(major, minor, 0))
        }
        _ => None,
    }
}

fn parse_component(s: &str) -> Option<u64> {
    // Reject leading zeros and signs like semver does.
    if s.is_empty() || (s.len() > 1 && s.starts_with('0')) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Whether the string is a usable semantic version.
pub fn is_valid(version: &str) -> bool {
    parse(version).is_some()
}

/// Compare two versions by semver precedence (build metadata ignored).
///
/// Returns `None` if either side is not a valid version.
pub fn compare(a: &str, b: &str) -> Option<Ordering> {
    let a = parse(a)?;
    let b = parse(b)?;
    Some(a.cmp_precedence(&b))
}

/// Whether `current` is strictly older than `target`.
///
/// Returns `None` if either side is not a valid version.
pub fn is_older(current: &str, target: &str) -> Option<bool> {
    compare(current, target).map(|o| o == Ordering::Less)
}

/// Pick the greatest valid version, returned in normalized (`v`-prefixed) form.
///
/// Invalid entries are ignored. Returns `None` if no entry is valid.
pub fn latest<I, S>(versions: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut best: Option<(Version, String)> = None;

    for candidate in versions {
        let candidate = candidate.as_ref();
        let Some(parsed) = parse(candidate) else {
            continue;
        };

        let replace = match &best {
            Some((current, _)) => parsed.cmp_precedence(current) == Ordering::Greater,
            None => true,
        };
        if replace {
            best = Some((parsed, normalize(candidate)));
        }
    }

    best.map(|(_, original)| original)
}

/// Keep only valid versions, normalized and sorted ascending.
pub fn sorted_valid<I, S>(versions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut valid: Vec<(Version, String)> = versions
        .into_iter()
        .filter_map(|v| {
            let v = v.as_ref();
            parse(v).map(|parsed| (parsed, normalize(v)))
        })
        .collect();

    valid.sort_by(|a, b| a.0.cmp_precedence(&b.0));
    valid.dedup_by(|a, b| a.0.cmp_precedence(&b.0) == Ordering::Equal);
    valid.into_iter().map(|(_, v)| v).collect()
}

//! `go.mod` parsing.
//!
//! This is the single textual parser for module declaration files. It backs
//! the local prober's fallback path, the local version fallback and the remote
//! content check, so single-line and block `require` semantics live here only.
//!
//! Supported directives:
//!
//! ```text
//! module github.com/acme/service
//!
//! go 1.22
//!
//! require github.com/acme/lib v1.2.3
//!
//! require (
//!     github.com/acme/other v0.4.0 // indirect
//! )
//!
//! replace github.com/acme/lib => github.com/fork/lib v1.2.4
//! ```
//!
//! `exclude`, `retract`, `go`, `toolchain` and `godebug` are recognized and
//! ignored.

use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

/// Name of the module declaration file.
pub const FILE_NAME: &str = "go.mod";

/// Error parsing a `go.mod` file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModFileError {
    #[error("line {line}: malformed `{directive}` entry: `{text}`")]
    Malformed {
        line: usize,
        directive: String,
        text: String,
    },

    #[error("line {line}: `{directive} (` block is never closed")]
    UnterminatedBlock { line: usize, directive: String },
}

/// A `require` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub path: String,
    pub version: String,
    pub indirect: bool,
}

/// A `replace` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub old_path: String,
    /// Only this version of `old_path` is replaced, if set.
    pub old_version: Option<String>,
    pub new_path: String,
    /// `None` for filesystem replacements.
    pub new_version: Option<String>,
}

/// A parsed `go.mod` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModFile {
    pub module: Option<String>,
    pub requires: Vec<Requirement>,
    pub replaces: Vec<Replacement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Require,
    Replace,
    Exclude,
    Retract,
    Go,
    Toolchain,
    Godebug,
}

impl Directive {
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "require" => Some(Directive::Require),
            "replace" => Some(Directive::Replace),
            "exclude" => Some(Directive::Exclude),
            "retract" => Some(Directive::Retract),
            "go" => Some(Directive::Go),
            "toolchain" => Some(Directive::Toolchain),
            "godebug" => Some(Directive::Godebug),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Directive::Require => "require",
            Directive::Replace => "replace",
            Directive::Exclude => "exclude",
            Directive::Retract => "retract",
            Directive::Go => "go",
            Directive::Toolchain => "toolchain",
            Directive::Godebug => "godebug",
        }
    }
}

impl ModFile {
    /// Load and parse a `go.mod` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        Self::parse(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Parse `go.mod` content.
    pub fn parse(content: &str) -> Result<Self, ModFileError> {
        let mut file = ModFile::default();
        let mut block: Option<(Directive, usize)> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let (code, comment) = split_comment(raw);
            let code = code.trim();

            if let Some((directive, _)) = block {
                if code == ")" {
                    block = None;
                    continue;
                }
                if code.is_empty() {
                    continue;
                }
                file.apply(directive, code, comment, line_no)?;
                continue;
            }

            if code.is_empty() {
                continue;
            }

            let (keyword, rest) = match code.split_once(char::is_whitespace) {
                Some((k, r)) => (k, r.trim()),
                None => (code, ""),
            };

            if keyword == "module" {
                let path = unquote(rest);
                if path.is_empty() {
                    return Err(ModFileError::Malformed {
                        line: line_no,
                        directive: "module".to_string(),
                        text: raw.trim().to_string(),
                    });
                }
                file.module = Some(path.to_string());
                continue;
            }

            let Some(directive) = Directive::from_keyword(keyword) else {
                // Unknown directives are tolerated; newer toolchains add them.
                continue;
            };

            if rest == "(" {
                block = Some((directive, line_no));
                continue;
            }

            file.apply(directive, rest, comment, line_no)?;
        }

        if let Some((directive, line)) = block {
            return Err(ModFileError::UnterminatedBlock {
                line,
                directive: directive.keyword().to_string(),
            });
        }

        Ok(file)
    }

    fn apply(
        &mut self,
        directive: Directive,
        entry: &str,
        comment: &str,
        line: usize,
    ) -> Result<(), ModFileError> {
        let malformed = || ModFileError::Malformed {
            line,
            directive: directive.keyword().to_string(),
            text: entry.to_string(),
        };

        match directive {
            Directive::Require => {
                let tokens: Vec<&str> = entry.split_whitespace().map(unquote).collect();
                if tokens.len() < 2 {
                    return Err(malformed());
                }
                self.requires.push(Requirement {
                    path: tokens[0].to_string(),
                    version: tokens[1].to_string(),
                    indirect: comment.trim() == "indirect",
                });
            }
            Directive::Replace => {
                let (old, new) = entry.split_once("=>").ok_or_else(malformed)?;
                let old: Vec<&str> = old.split_whitespace().map(unquote).collect();
                let new: Vec<&str> = new.split_whitespace().map(unquote).collect();
                if old.is_empty() || old.len() > 2 || new.is_empty() || new.len() > 2 {
                    return Err(malformed());
                }
                self.replaces.push(Replacement {
                    old_path: old[0].to_string(),
                    old_version: old.get(1).map(|v| v.to_string()),
                    new_path: new[0].to_string(),
                    new_version: new.get(1).map(|v| v.to_string()),
                });
            }
            Directive::Exclude
            | Directive::Retract
            | Directive::Go
            | Directive::Toolchain
            | Directive::Godebug => {}
        }

        Ok(())
    }

    /// The declared module path, if any.
    pub fn module_path(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Find the requirement on `target`, by exact path or `target/` prefix.
    pub fn requirement(&self, target: &str) -> Option<&Requirement> {
        self.requires
            .iter()
            .find(|r| r.path == target)
            .or_else(|| self.requires.iter().find(|r| is_path_prefix(target, &r.path)))
    }

    /// Whether this module requires `target`.
    pub fn depends_on(&self, target: &str) -> bool {
        self.requirement(target).is_some()
    }

    /// The version of `target` this module actually builds against.
    ///
    /// A replace directive that pins a replacement version wins over the
    /// nominal requirement.
    pub fn effective_version(&self, target: &str) -> Option<String> {
        let requirement = self.requirement(target)?;

        let replaced = self
            .replaces
            .iter()
            .filter(|r| r.old_path == requirement.path)
            .find(|r| match r.old_version {
                Some(ref v) => *v == requirement.version,
                None => true,
            })
            .and_then(|r| r.new_version.clone());

        Some(replaced.unwrap_or_else(|| requirement.version.clone()))
    }
}

/// `candidate` equals `prefix` or lives underneath it as a path.
pub fn is_path_prefix(prefix: &str, candidate: &str) -> bool {
    candidate == prefix
        || (candidate.starts_with(prefix) && candidate[prefix.len()..].starts_with('/'))
}

fn split_comment(line: &str) -> (&str, &str) {
    match line.find("//") {
        Some(pos) => (&line[..pos], &line[pos + 2..]),
        None => (line, ""),
    }
}

fn unquote(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| s.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .unwrap_or(s)
}

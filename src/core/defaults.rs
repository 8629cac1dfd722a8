//! Defaults inheritance.
//!
//! A dependent inherits every unset field from its module's effective
//! defaults, which in turn inherit from the manifest-wide defaults.
//!
//! - Scalars (`branch`, `notify`, `pr_title`) are overridden only by a
//!   non-empty value.
//! - `tests` and `extra_commands` are concatenated, defaults first, because
//!   every command must run.
//! - `labels` are inherited when the dependent has none.
//!
//! Expansion is idempotent: expanding an already expanded dependent against
//! the same defaults changes nothing.

use crate::core::manifest::{Defaults, Dependent, Manifest, Module};
use crate::core::module::{clone_url, path_within_repo};

/// Layer a module's defaults over the manifest defaults.
pub fn effective_defaults(global: &Defaults, module: Option<&Defaults>) -> Defaults {
    let Some(module) = module else {
        return global.clone();
    };

    Defaults {
        branch: override_scalar(&module.branch, &global.branch),
        tests: concat_commands(&global.tests, &module.tests),
        extra_commands: concat_commands(&global.extra_commands, &module.extra_commands),
        labels: inherit_list(&module.labels, &global.labels),
        notify: override_scalar(&module.notify, &global.notify),
        pr_title: override_scalar(&module.pr_title, &global.pr_title),
    }
}

/// Produce the effective dependent: set fields kept, unset fields filled.
pub fn expand_dependent(dependent: &Dependent, defaults: &Defaults) -> Dependent {
    let module_path = match dependent.module_path {
        Some(ref p) if !p.trim().is_empty() => p.clone(),
        _ => {
            if dependent.module.is_empty() {
                ".".to_string()
            } else {
                path_within_repo(&dependent.module)
            }
        }
    };

    let clone_url = match dependent.clone_url {
        Some(ref url) if !url.trim().is_empty() => Some(url.clone()),
        _ if !dependent.repo.trim().is_empty() => Some(clone_url(&dependent.repo)),
        _ => None,
    };

    Dependent {
        repo: dependent.repo.clone(),
        clone_url,
        module: dependent.module.clone(),
        module_path: Some(module_path),
        branch: override_scalar(&dependent.branch, &defaults.branch),
        tests: concat_commands(&defaults.tests, &dependent.tests),
        extra_commands: concat_commands(&defaults.extra_commands, &dependent.extra_commands),
        labels: inherit_list(&dependent.labels, &defaults.labels),
        notify: override_scalar(&dependent.notify, &defaults.notify),
        pr_title: override_scalar(&dependent.pr_title, &defaults.pr_title),
    }
}

/// Expand every dependent of a module.
pub fn expand_module(module: &Module, global: &Defaults) -> Module {
    let defaults = effective_defaults(global, module.defaults.as_ref());
    Module {
        dependents: module
            .dependents
            .iter()
            .map(|d| expand_dependent(d, &defaults))
            .collect(),
        ..module.clone()
    }
}

/// Expand every dependent in the manifest.
pub fn expand_manifest(manifest: &Manifest) -> Manifest {
    Manifest {
        modules: manifest.modules.as_ref().map(|modules| {
            modules
                .iter()
                .map(|m| expand_module(m, &manifest.defaults))
                .collect()
        }),
        ..manifest.clone()
    }
}

fn override_scalar(own: &Option<String>, inherited: &Option<String>) -> Option<String> {
    match own {
        Some(v) if !v.trim().is_empty() => Some(v.clone()),
        _ => inherited.clone(),
    }
}

fn inherit_list(own: &[String], inherited: &[String]) -> Vec<String> {
    if own.is_empty() {
        inherited.to_vec()
    } else {
        own.to_vec()
    }
}

/// Defaults first, then the dependent's own commands.
///
/// A list that already starts with the defaults was expanded before and is
/// returned unchanged.
fn concat_commands(defaults: &[String], own: &[String]) -> Vec<String> {
    if own.starts_with(defaults) {
        return own.to_vec();
    }
    defaults.iter().chain(own).cloned().collect()
}

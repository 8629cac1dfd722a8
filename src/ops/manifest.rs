//! Implementation of `modfleet validate` and `modfleet expand`.

use std::path::Path;

use anyhow::Result;

use crate::core::defaults::expand_manifest;
use crate::core::manifest::Manifest;
use crate::core::validate::validate;

/// Load a manifest and check it.
///
/// A failed check is a [`ValidationError`](crate::core::ValidationError)
/// listing every issue found.
pub fn validate_file(path: &Path) -> Result<Manifest> {
    let manifest = Manifest::load(path)?;
    validate(&manifest)?;
    tracing::debug!("{} is valid", path.display());
    Ok(manifest)
}

/// Load a manifest, check it and fill in every dependent's inherited
/// settings.
pub fn expand_file(path: &Path) -> Result<Manifest> {
    let manifest = validate_file(path)?;
    Ok(expand_manifest(&manifest))
}

use std::path::Path;

use angler_core::error::ManifestError;
use angler_core::manifest::Manifest;

pub fn run(manifest_path: &Path) -> Result<(), ManifestError> {
    Manifest::setup(manifest_path)?;
    tracing::info!(manifest = %manifest_path.display(), "manifest created");
    Ok(())
}

use std::path::Path;

use angler_core::manifest::Manifest;

use crate::cli::OrderArgs;
use crate::error::CliError;

pub async fn run(manifest_path: &Path, args: &OrderArgs) -> Result<(), CliError> {
    let manifest = Manifest::open(manifest_path)?;
    for pair in args.nodes.windows(2) {
        manifest.insert_edge(&pair[0], &pair[1], None).await?;
    }
    Ok(())
}

//! Startup preparation of the public root.

use std::path::Path;

use anyhow::Context;
use tracing::{info, warn};

use crate::config::PublicPaths;
use crate::constants::SEEDED_SAMPLE_NAME;
use crate::overlay::convert_to_png;

/// Creates the public layout and seeds it from `sample` when that file exists.
///
/// Failing to create a directory is an error. Failing to seed is only
/// logged, since the server works with an empty image list.
pub fn ensure_public_layout(paths: &PublicPaths, sample: Option<&Path>) -> anyhow::Result<()> {
    for dir in [&paths.root, &paths.images, &paths.outputs] {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let Some(sample) = sample.filter(|sample| sample.is_file()) else {
        info!("No sample image found, skipping seeding");
        return Ok(());
    };

    let seeded = paths.images.join(SEEDED_SAMPLE_NAME);
    if !seeded.exists() {
        match std::fs::copy(sample, &seeded) {
            Ok(_) => info!("Seeded {}", seeded.display()),
            Err(err) => warn!("Failed to seed {}: {}", seeded.display(), err),
        }
    }

    let fallback = paths.fallback();
    if !fallback.exists()
        && let Err(err) = write_fallback(sample, &fallback)
    {
        warn!("Failed to create {}: {:#}", fallback.display(), err);
    }
    Ok(())
}

fn write_fallback(sample: &Path, fallback: &Path) -> anyhow::Result<()> {
    match convert_to_png(sample) {
        Ok(bytes) => std::fs::write(fallback, bytes)
            .with_context(|| format!("Failed to write {}", fallback.display()))?,
        Err(err) => {
            warn!(
                "Couldn't convert {} to PNG, copying as-is: {:#}",
                sample.display(),
                err
            );
            std::fs::copy(sample, fallback)
                .with_context(|| format!("Failed to copy to {}", fallback.display()))?;
        }
    }
    info!("Created fallback image {}", fallback.display());
    Ok(())
}

//! Random stock image selection.
//!
//! Listing is async and choosing is synchronous, so callers can hold a
//! thread-local RNG only for the choice and keep their futures `Send`.

use std::path::Path;

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::constants::{FALLBACK_IMAGE_URL, IMAGE_EXTENSIONS, IMAGES_URL_PREFIX};

/// True if the path ends in one of the allowed image extensions.
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Lists the file names in `dir` that look like pickable images, sorted.
pub async fn list_candidates(dir: &Path) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;

    let mut candidates = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !has_image_extension(&path) {
            continue;
        }
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => {}
            _ => continue,
        }
        if let Some(name) = entry.file_name().to_str() {
            candidates.push(name.to_string());
        }
    }
    candidates.sort();
    Ok(candidates)
}

/// Picks one candidate uniformly and turns it into a public URL, or the fallback URL if there's nothing to pick.
pub fn choose_image_url<R: Rng + ?Sized>(candidates: &[String], rng: &mut R) -> String {
    match candidates.choose(rng) {
        Some(name) => format!("{IMAGES_URL_PREFIX}{name}"),
        None => FALLBACK_IMAGE_URL.to_string(),
    }
}

/// Like [`list_candidates`], but an unreadable directory is just empty.
pub async fn candidates_or_empty(dir: &Path) -> Vec<String> {
    match list_candidates(dir).await {
        Ok(candidates) => candidates,
        Err(err) => {
            debug!("Failed to list images in {}: {}", dir.display(), err);
            Vec::new()
        }
    }
}

/// Lists `dir` and picks a random image URL from it. Never fails: unreadable
/// or empty directories give the fallback URL.
pub async fn pick_random_image<R: Rng + ?Sized>(dir: &Path, rng: &mut R) -> String {
    let candidates = candidates_or_empty(dir).await;
    choose_image_url(&candidates, rng)
}

//! Confines user-supplied image references to the public root.

use std::path::{Component, Path, PathBuf};

use crate::error::OverlayError;

/// Resolves an image URL such as `/images/a.jpg` to a file path strictly below `root`.
///
/// Resolution is purely lexical: `.` and `..` are folded without touching the
/// filesystem, so a rejected reference never causes a read.
pub fn resolve_public_path(root: &Path, image_url: &str) -> Result<PathBuf, OverlayError> {
    if image_url.is_empty() {
        return Err(OverlayError::missing_image_url());
    }

    let relative = image_url.trim_start_matches('/');
    let root = normalize(root);
    let candidate = normalize(&root.join(relative));

    if candidate == root || !candidate.starts_with(&root) {
        return Err(OverlayError::invalid_image_path());
    }
    Ok(candidate)
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(Component::ParentDir.as_os_str()),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

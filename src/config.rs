//! Config handling

use std::path::{Path, PathBuf};

use tracing::log::LevelFilter;

use crate::constants::{FALLBACK_IMAGE_NAME, IMAGES_SUBDIR, OUTPUTS_SUBDIR};

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("hyper", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("tower_http", LevelFilter::Info)
            .with_module_level("fontdb", LevelFilter::Warn)
            .with_module_level("usvg", LevelFilter::Warn)
            .with_module_level("resvg", LevelFilter::Warn);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Filesystem layout under the public root.
#[derive(Clone, Debug)]
pub struct PublicPaths {
    /// Directory served statically; every image reference must resolve below it.
    pub root: PathBuf,
    /// Candidate stock images for the picker.
    pub images: PathBuf,
    /// Rendered overlay outputs.
    pub outputs: PathBuf,
}

impl PublicPaths {
    /// Derives the images and outputs directories from the public root.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            images: root.join(IMAGES_SUBDIR),
            outputs: root.join(OUTPUTS_SUBDIR),
            root,
        }
    }

    /// Location of the fallback image on disk.
    pub fn fallback(&self) -> PathBuf {
        self.root.join(FALLBACK_IMAGE_NAME)
    }
}

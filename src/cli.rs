//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "VIRALPOST_DEBUG")]
    /// Enable debug logging. Env: VIRALPOST_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "3000", env = "VIRALPOST_PORT")]
    /// http listener, defaults to `3000`.
    /// Env: VIRALPOST_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "VIRALPOST_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: VIRALPOST_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, default_value = "./public", env = "VIRALPOST_PUBLIC_DIR")]
    /// Public root served statically, holds `images/` and `outputs/`.
    /// Env: VIRALPOST_PUBLIC_DIR
    pub public_dir: PathBuf,

    #[clap(
        long,
        default_value = "./images/mountain-landscape.jpg",
        env = "VIRALPOST_SAMPLE_IMAGE"
    )]
    /// Image used to seed `images/` and build `fallback.png` on first start.
    /// Env: VIRALPOST_SAMPLE_IMAGE
    pub sample_image: PathBuf,
}

//! Shared constants/setters for things
//!

/// Subdirectory of the public root holding the stock images.
pub const IMAGES_SUBDIR: &str = "images";

/// Subdirectory of the public root holding rendered outputs.
pub const OUTPUTS_SUBDIR: &str = "outputs";

/// URL prefix for stock images.
pub const IMAGES_URL_PREFIX: &str = "/images/";

/// URL prefix for rendered outputs.
pub const OUTPUTS_URL_PREFIX: &str = "/outputs/";

/// File name of the fallback image, relative to the public root.
pub const FALLBACK_IMAGE_NAME: &str = "fallback.png";

/// URL served when no image can be picked.
pub const FALLBACK_IMAGE_URL: &str = "/fallback.png";

/// Name the sample image is seeded under in the images directory.
pub const SEEDED_SAMPLE_NAME: &str = "sample-mountain.jpg";

/// Extensions (lowercase, no dot) the picker will choose from.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Font size used when the request doesn't carry a usable one.
pub const DEFAULT_FONT_SIZE: f64 = 64.0;

/// Text color used when the request doesn't carry one.
pub const DEFAULT_TEXT_COLOR: &str = "#ffffff";

/// Side of the square overlay canvas, in SVG user units.
pub const OVERLAY_CANVAS_SIZE: i64 = 1080;

/// Padding around the overlay text block, in SVG user units.
pub const OVERLAY_PADDING: i64 = 60;

/// Font stack for overlay text.
pub const OVERLAY_FONT_FAMILY: &str =
    "system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif";

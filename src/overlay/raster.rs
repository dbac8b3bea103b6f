//! Decoding, SVG rasterizing and PNG encoding.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use image::{DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage, imageops};
use resvg::{tiny_skia, usvg};

/// Decodes an image file, sniffing the format from its content.
pub fn open_image(path: &Path) -> anyhow::Result<DynamicImage> {
    let image = ImageReader::open(path)
        .with_context(|| format!("open {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("guess format of {}", path.display()))?
        .decode()
        .with_context(|| format!("decode {}", path.display()))?;
    Ok(image)
}

/// Encodes to PNG in memory.
pub fn encode_png(image: &DynamicImage) -> anyhow::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .context("encode png")?;
    Ok(bytes)
}

/// Decodes `path` and re-encodes it as PNG, keeping the pixels as they are.
pub fn convert_to_png(path: &Path) -> anyhow::Result<Vec<u8>> {
    encode_png(&open_image(path)?)
}

/// Rasterizes `svg` at its native size, or scaled down to fit `max_width`
/// when it is wider, as straight-alpha RGBA.
pub fn rasterize_svg(
    svg: &str,
    max_width: u32,
    fontdb: &Arc<usvg::fontdb::Database>,
) -> anyhow::Result<RgbaImage> {
    let mut options = usvg::Options::default();
    options.fontdb = Arc::clone(fontdb);
    let tree = usvg::Tree::from_str(svg, &options).context("parse overlay svg")?;

    let size = tree.size();
    if size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(anyhow!("overlay svg has an empty canvas"));
    }
    let scale = (max_width as f32 / size.width()).min(1.0);
    let width = ((size.width() * scale).round() as u32).clamp(1, max_width.max(1));
    let height = ((size.height() * scale).round() as u32).max(1);

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| anyhow!("cannot allocate a {width}x{height} overlay"))?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let mut overlay = RgbaImage::new(width, height);
    for (dst, src) in overlay.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    Ok(overlay)
}

/// Draws `overlay` centered on the bottom edge of `base`, clipping whatever
/// sticks out above the top.
pub fn composite_bottom(base: &DynamicImage, overlay: &RgbaImage) -> DynamicImage {
    let mut canvas = base.to_rgba8();
    let x = (i64::from(canvas.width()) - i64::from(overlay.width())) / 2;
    let y = i64::from(canvas.height()) - i64::from(overlay.height());
    imageops::overlay(&mut canvas, overlay, x, y);
    DynamicImage::ImageRgba8(canvas)
}

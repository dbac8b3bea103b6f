//! Text overlay compositing for `/overlay`.
//!
//! A render resolves the source inside the public root, then tries the
//! primary path (composite when there's text, plain PNG re-encode when
//! there isn't). If that fails it degrades to a re-encode and finally to a
//! byte-for-byte copy. Every attempt writes to the same freshly allocated
//! output path, so a later attempt replaces whatever an earlier one left.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use resvg::usvg::fontdb;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PublicPaths;
use crate::constants::{DEFAULT_FONT_SIZE, DEFAULT_TEXT_COLOR, OUTPUTS_URL_PREFIX};
use crate::error::OverlayError;

mod path;
mod raster;
mod svg;

pub use path::resolve_public_path;
pub use raster::{composite_bottom, convert_to_png, encode_png, open_image, rasterize_svg};
pub use svg::{build_overlay_svg, escape_text, line_height};

/// Parameters for a single overlay render.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayRequest {
    /// Public URL of the source, eg `/images/sample.jpg`.
    pub image_url: String,
    /// Overlay text, may be empty or span several lines.
    pub text: String,
    /// Font size in overlay canvas units.
    pub font_size: f64,
    /// Any color expression the SVG renderer understands.
    pub color: String,
}

impl OverlayRequest {
    /// A request with default text settings.
    pub fn new(image_url: impl Into<String>) -> Self {
        Self {
            image_url: image_url.into(),
            text: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            color: DEFAULT_TEXT_COLOR.to_string(),
        }
    }

    /// Reads a request out of a loosely typed JSON body, falling back to
    /// defaults for anything missing or of the wrong type.
    pub fn from_json(body: &Value) -> Self {
        let string_field = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            image_url: string_field("imageUrl").unwrap_or_default(),
            text: string_field("text").unwrap_or_default(),
            font_size: body
                .get("fontSize")
                .and_then(Value::as_f64)
                .filter(|size| size.is_finite())
                .unwrap_or(DEFAULT_FONT_SIZE),
            color: string_field("color").unwrap_or_else(|| DEFAULT_TEXT_COLOR.to_string()),
        }
    }

    /// Sets the overlay text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Sets the font size.
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    /// Sets the text color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// Which path produced the output file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RenderOutcome {
    /// Overlay composited onto the source.
    Composited,
    /// Source re-encoded as PNG without an overlay.
    Converted,
    /// Source bytes copied unchanged, whatever format they are in.
    Copied,
}

/// A file written under the outputs directory.
#[derive(Clone, Debug)]
pub struct RenderedOutput {
    /// Public URL, `/outputs/<uuid>.png`.
    pub url: String,
    /// Location on disk.
    pub path: PathBuf,
    /// How the file was produced.
    pub outcome: RenderOutcome,
}

#[derive(Clone, Debug)]
struct OutputTarget {
    url: String,
    path: PathBuf,
}

impl OutputTarget {
    fn allocate(outputs: &Path) -> Self {
        let file_name = format!("{}.png", Uuid::new_v4());
        Self {
            url: format!("{OUTPUTS_URL_PREFIX}{file_name}"),
            path: outputs.join(file_name),
        }
    }
}

/// Renders overlays for sources under a public root.
#[derive(Clone)]
pub struct Compositor {
    paths: PublicPaths,
    fontdb: Arc<fontdb::Database>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("paths", &self.paths)
            .field("font_faces", &self.fontdb.len())
            .finish()
    }
}

impl Compositor {
    /// Builds a compositor that resolves overlay fonts from `fontdb`.
    pub fn new(paths: PublicPaths, fontdb: Arc<fontdb::Database>) -> Self {
        Self { paths, fontdb }
    }

    /// Builds a compositor with the fonts installed on this machine.
    pub fn with_system_fonts(paths: PublicPaths) -> Self {
        let mut database = fontdb::Database::new();
        database.load_system_fonts();
        info!("Loaded {} font faces for overlays", database.len());
        if database.is_empty() {
            warn!("No system fonts found, overlay text will not be drawn");
        }
        Self::new(paths, Arc::new(database))
    }

    /// The public layout this compositor reads from and writes into.
    pub fn paths(&self) -> &PublicPaths {
        &self.paths
    }

    /// Renders `request` into a new file under the outputs directory.
    ///
    /// The reference is validated before anything is read. The decoding and
    /// encoding run on the blocking pool.
    pub async fn render(&self, request: OverlayRequest) -> Result<RenderedOutput, OverlayError> {
        let source = resolve_public_path(&self.paths.root, &request.image_url)?;
        let target = OutputTarget::allocate(&self.paths.outputs);
        let compositor = self.clone();
        tokio::task::spawn_blocking(move || compositor.render_blocking(&source, &request, target))
            .await?
    }

    fn render_blocking(
        &self,
        source: &Path,
        request: &OverlayRequest,
        target: OutputTarget,
    ) -> Result<RenderedOutput, OverlayError> {
        let has_text = !request.text.is_empty();
        let primary = if has_text {
            self.composite(source, request, &target.path)
        } else {
            convert_into(source, &target.path)
        };

        let outcome = match primary {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(
                    "Render of {} failed, falling back to a plain copy: {:#}",
                    source.display(),
                    err
                );
                match copy_without_overlay(source, &target.path, has_text) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        if let Err(cleanup) = std::fs::remove_file(&target.path)
                            && cleanup.kind() != std::io::ErrorKind::NotFound
                        {
                            debug!(
                                "Failed to remove partial output {}: {}",
                                target.path.display(),
                                cleanup
                            );
                        }
                        return Err(OverlayError::RenderFailure(format!(
                            "{}: {:#}",
                            source.display(),
                            err
                        )));
                    }
                }
            }
        };

        debug!(
            "Rendered {} to {} ({:?})",
            source.display(),
            target.path.display(),
            outcome
        );
        Ok(RenderedOutput {
            url: target.url,
            path: target.path,
            outcome,
        })
    }

    fn composite(
        &self,
        source: &Path,
        request: &OverlayRequest,
        output: &Path,
    ) -> anyhow::Result<RenderOutcome> {
        let base = open_image(source)?;
        let svg = build_overlay_svg(&request.text, request.font_size, &request.color)?;
        let overlay = rasterize_svg(&svg, base.width(), &self.fontdb)?;
        let bytes = encode_png(&composite_bottom(&base, &overlay))?;
        std::fs::write(output, bytes)?;
        Ok(RenderOutcome::Composited)
    }
}

fn convert_into(source: &Path, output: &Path) -> anyhow::Result<RenderOutcome> {
    let bytes = convert_to_png(source)?;
    std::fs::write(output, bytes)?;
    Ok(RenderOutcome::Converted)
}

/// Re-encodes the source, or copies its bytes as-is when that fails. The copy
/// keeps the original format even though the output name ends in `.png`.
fn copy_without_overlay(
    source: &Path,
    output: &Path,
    try_convert: bool,
) -> anyhow::Result<RenderOutcome> {
    if try_convert {
        match convert_into(source, output) {
            Ok(outcome) => return Ok(outcome),
            Err(err) => debug!("Re-encode of {} failed: {:#}", source.display(), err),
        }
    }
    std::fs::copy(source, output)?;
    Ok(RenderOutcome::Copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use serde_json::json;
    use tempfile::TempDir;

    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    fn setup() -> (TempDir, Compositor) {
        let dir = TempDir::new().expect("tempdir");
        let paths = PublicPaths::new(dir.path());
        std::fs::create_dir_all(&paths.images).expect("images dir");
        std::fs::create_dir_all(&paths.outputs).expect("outputs dir");
        let compositor = Compositor::new(paths, Arc::new(fontdb::Database::new()));
        (dir, compositor)
    }

    fn write_jpeg(path: &Path, width: u32, height: u32) {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
            .save_with_format(path, ImageFormat::Jpeg)
            .expect("write jpeg");
    }

    #[test]
    fn from_json_applies_defaults() {
        let request = OverlayRequest::from_json(&json!({
            "imageUrl": "/images/a.jpg",
            "text": 12,
            "fontSize": "big",
            "color": false,
        }));
        assert_eq!(request, OverlayRequest::new("/images/a.jpg"));

        let request = OverlayRequest::from_json(&json!({}));
        assert_eq!(request.image_url, "");
        assert_eq!(request.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(request.color, DEFAULT_TEXT_COLOR);
    }

    #[test]
    fn from_json_keeps_supplied_values() {
        let request = OverlayRequest::from_json(&json!({
            "imageUrl": "/images/a.jpg",
            "text": "Hello\nWorld",
            "fontSize": 48,
            "color": "#ff0000",
        }));
        assert_eq!(
            request,
            OverlayRequest::new("/images/a.jpg")
                .with_text("Hello\nWorld")
                .with_font_size(48.0)
                .with_color("#ff0000")
        );
    }

    #[tokio::test]
    async fn text_is_composited_at_the_bottom() {
        let (_dir, compositor) = setup();
        let source = compositor.paths().images.join("sample.jpg");
        write_jpeg(&source, 200, 100);

        let output = compositor
            .render(
                OverlayRequest::new("/images/sample.jpg")
                    .with_text("Hello\nWorld")
                    .with_font_size(48.0)
                    .with_color("#ff0000"),
            )
            .await
            .expect("render");

        assert_eq!(output.outcome, RenderOutcome::Composited);
        assert!(output.url.starts_with(OUTPUTS_URL_PREFIX));
        assert!(output.url.ends_with(".png"));

        let bytes = std::fs::read(&output.path).expect("read output");
        assert!(bytes.starts_with(PNG_SIGNATURE));
        assert_ne!(bytes, std::fs::read(&source).expect("read source"));

        let rendered = image::load_from_memory(&bytes).expect("decode").to_rgba8();
        assert_eq!(rendered.dimensions(), (200, 100));
        assert!(rendered.get_pixel(100, 99).0[0] < 128);
        assert!(rendered.get_pixel(100, 0).0[0] > 240);
    }

    #[tokio::test]
    async fn wide_source_keeps_overlay_at_native_size() {
        let (_dir, compositor) = setup();
        write_jpeg(&compositor.paths().images.join("wide.jpg"), 1300, 1200);

        let output = compositor
            .render(OverlayRequest::new("/images/wide.jpg").with_text("Wide"))
            .await
            .expect("render");
        assert_eq!(output.outcome, RenderOutcome::Composited);

        let rendered = image::open(&output.path).expect("decode").to_rgba8();
        assert_eq!(rendered.dimensions(), (1300, 1200));
        // overlay spans x 110..1190
        assert!(rendered.get_pixel(50, 1199).0[0] > 240);
        assert!(rendered.get_pixel(650, 1199).0[0] < 128);
        assert!(rendered.get_pixel(1250, 1199).0[0] > 240);
        assert!(rendered.get_pixel(650, 0).0[0] > 240);
    }

    #[tokio::test]
    async fn small_and_negative_font_sizes_still_composite() {
        let (_dir, compositor) = setup();
        write_jpeg(&compositor.paths().images.join("sample.jpg"), 40, 40);

        for font_size in [0.0, -5.0] {
            let output = compositor
                .render(
                    OverlayRequest::new("/images/sample.jpg")
                        .with_text("hi")
                        .with_font_size(font_size),
                )
                .await
                .expect("render");
            assert_eq!(output.outcome, RenderOutcome::Composited);
        }
    }

    #[tokio::test]
    async fn oversized_font_falls_back_to_conversion() {
        let (_dir, compositor) = setup();
        write_jpeg(&compositor.paths().images.join("a.jpg"), 40, 40);

        let output = compositor
            .render(
                OverlayRequest::new("/images/a.jpg")
                    .with_text("hi")
                    .with_font_size(1e19),
            )
            .await
            .expect("render");
        assert_eq!(output.outcome, RenderOutcome::Converted);
        let bytes = std::fs::read(&output.path).expect("read output");
        assert!(bytes.starts_with(PNG_SIGNATURE));
    }

    #[tokio::test]
    async fn empty_text_only_converts() {
        let (_dir, compositor) = setup();
        write_jpeg(&compositor.paths().images.join("sample.jpg"), 64, 32);

        let output = compositor
            .render(OverlayRequest::new("/images/sample.jpg"))
            .await
            .expect("render");

        assert_eq!(output.outcome, RenderOutcome::Converted);
        let bytes = std::fs::read(&output.path).expect("read output");
        assert!(bytes.starts_with(PNG_SIGNATURE));
        let rendered = image::load_from_memory(&bytes).expect("decode").to_rgba8();
        assert_eq!(rendered.dimensions(), (64, 32));
        assert!(rendered.get_pixel(32, 31).0[0] > 240);
    }

    #[tokio::test]
    async fn undecodable_source_is_copied_verbatim() {
        let (_dir, compositor) = setup();
        let source = compositor.paths().images.join("broken.png");
        std::fs::write(&source, b"not really an image").expect("write");

        for request in [
            OverlayRequest::new("/images/broken.png").with_text("hi"),
            OverlayRequest::new("/images/broken.png"),
        ] {
            let output = compositor.render(request).await.expect("render");
            assert_eq!(output.outcome, RenderOutcome::Copied);
            assert_eq!(
                std::fs::read(&output.path).expect("read output"),
                b"not really an image"
            );
        }
    }

    #[tokio::test]
    async fn bad_color_falls_back_to_conversion() {
        let (_dir, compositor) = setup();
        write_jpeg(&compositor.paths().images.join("sample.jpg"), 20, 20);

        let output = compositor
            .render(
                OverlayRequest::new("/images/sample.jpg")
                    .with_text("hi")
                    .with_color("\"><broken"),
            )
            .await
            .expect("render");
        assert_eq!(output.outcome, RenderOutcome::Converted);
    }

    #[tokio::test]
    async fn missing_source_is_a_render_failure() {
        let (_dir, compositor) = setup();
        let result = compositor
            .render(OverlayRequest::new("/images/missing.jpg").with_text("hi"))
            .await;
        assert!(matches!(result, Err(OverlayError::RenderFailure(_))));

        let leftovers = std::fs::read_dir(&compositor.paths().outputs)
            .expect("outputs")
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn traversal_is_rejected_before_reading() {
        let (_dir, compositor) = setup();
        for url in ["../../etc/passwd", "/../../secret.png"] {
            let result = compositor.render(OverlayRequest::new(url).with_text("x")).await;
            assert!(matches!(result, Err(OverlayError::InvalidRequest(_))));
        }
        let result = compositor.render(OverlayRequest::new("")).await;
        assert!(matches!(result, Err(OverlayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn each_render_gets_a_new_output() {
        let (_dir, compositor) = setup();
        write_jpeg(&compositor.paths().images.join("sample.jpg"), 16, 16);
        let request = OverlayRequest::new("/images/sample.jpg").with_text("same");

        let first = compositor.render(request.clone()).await.expect("first");
        let second = compositor.render(request).await.expect("second");
        assert_ne!(first.url, second.url);
        assert!(first.path.is_file());
        assert!(second.path.is_file());
    }
}

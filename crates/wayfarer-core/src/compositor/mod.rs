//! Journey image compositor
//!
//! Renders what the user arranged in the preview onto a fixed portrait
//! canvas and encodes it as JPEG.
//!
//! ```text
//! ┌──────── preview ────────┐          ┌──────── canvas ─────────┐
//! │  pan (px), scale, θ     │  ×ratio  │  source fitted to cover │
//! │  text anchor (px)       │ ───────► │  rotate · scale · pan   │
//! │                         │          │  wrapped text, centered │
//! └─────────────────────────┘          └─────────────────────────┘
//! ```
//!
//! The source is first fitted to cover the canvas, so scale `1.0` with
//! no pan fills the frame. Every canvas pixel is inverse-mapped into the
//! source and sampled bilinearly; pixels that land outside the source
//! keep the background color.

mod color;
mod font;
mod text;

pub use color::{parse_hex_color, to_hex};
pub use font::BitmapFont;
pub use text::{wrap_lines, FontSpec, TextOverlay, Typeface, MAX_OVERLAY_CHARS};

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

use base64::Engine;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Output canvas width
pub const CANVAS_WIDTH: u32 = 1080;
/// Output canvas height
pub const CANVAS_HEIGHT: u32 = 1920;
/// Default preview viewport, same 9:16 aspect as the canvas
pub const PREVIEW_WIDTH: u32 = 360;
pub const PREVIEW_HEIGHT: u32 = 640;

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 3.0;

/// Wrapped lines never exceed this share of the canvas width
const LINE_WIDTH_RATIO: f32 = 0.8;
const JPEG_QUALITY: u8 = 90;

/// Pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// User adjustments made in the preview
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f32,
    pub rotation_deg: f32,
    /// Offset of the image center, in preview pixels
    pub pan: (f32, f32),
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation_deg: 0.0,
            pan: (0.0, 0.0),
        }
    }
}

impl Transform {
    /// Copy with scale clamped to [`MIN_SCALE`]..=[`MAX_SCALE`]
    pub fn clamped(self) -> Self {
        let scale = if self.scale.is_finite() {
            self.scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            1.0
        };
        let finite = |v: f32| if v.is_finite() { v } else { 0.0 };
        Self {
            scale,
            rotation_deg: finite(self.rotation_deg),
            pan: (finite(self.pan.0), finite(self.pan.1)),
        }
    }
}

/// Encoded composite
#[derive(Debug, Clone)]
pub struct CompositeOutput {
    pub jpeg: Bytes,
    pub width: u32,
    pub height: u32,
}

impl CompositeOutput {
    /// `data:image/jpeg;base64,...` preview string
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.jpeg)
        )
    }
}

/// Renders journeys onto the output canvas
#[derive(Clone)]
pub struct Compositor {
    canvas: Size,
    preview: Size,
    typefaces: HashMap<String, Arc<dyn Typeface>>,
    fallback_face: Arc<dyn Typeface>,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("canvas", &self.canvas)
            .field("preview", &self.preview)
            .field("typefaces", &self.typefaces.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            canvas: Size::new(CANVAS_WIDTH, CANVAS_HEIGHT),
            preview: Size::new(PREVIEW_WIDTH, PREVIEW_HEIGHT),
            typefaces: HashMap::new(),
            fallback_face: text::default_typeface(),
        }
    }

    pub fn with_canvas(mut self, width: u32, height: u32) -> Self {
        self.canvas = Size::new(width, height);
        self
    }

    pub fn with_preview(mut self, width: u32, height: u32) -> Self {
        self.preview = Size::new(width, height);
        self
    }

    /// Register a face for a font family name (case-insensitive)
    pub fn register_typeface(&mut self, family: &str, face: Arc<dyn Typeface>) {
        self.typefaces.insert(family.to_lowercase(), face);
    }

    pub fn canvas(&self) -> Size {
        self.canvas
    }

    pub fn preview(&self) -> Size {
        self.preview
    }

    /// Decode `source` bytes and compose
    pub fn compose_bytes(
        &self,
        source: &[u8],
        transform: Transform,
        overlay: Option<&TextOverlay>,
    ) -> ClientResult<CompositeOutput> {
        let image = image::load_from_memory(source)?;
        self.compose(&image, transform, overlay)
    }

    /// Compose an already-decoded image and encode it as JPEG
    pub fn compose(
        &self,
        source: &DynamicImage,
        transform: Transform,
        overlay: Option<&TextOverlay>,
    ) -> ClientResult<CompositeOutput> {
        let frame = self.rasterize(source, transform, overlay)?;
        self.encode(frame)
    }

    /// Text-only journey: solid background with the overlay on top
    pub fn render_text_card(
        &self,
        background: Rgb<u8>,
        overlay: &TextOverlay,
    ) -> ClientResult<CompositeOutput> {
        self.ensure_surfaces()?;
        let mut frame = RgbImage::from_pixel(self.canvas.width, self.canvas.height, background);
        self.draw_overlay(&mut frame, overlay);
        self.encode(frame)
    }

    /// Render to an unencoded canvas.
    ///
    /// At scale 1 the source covers the canvas at its own aspect ratio: the
    /// overflowing axis is cropped around the center, never stretched.
    pub fn rasterize(
        &self,
        source: &DynamicImage,
        transform: Transform,
        overlay: Option<&TextOverlay>,
    ) -> ClientResult<RgbImage> {
        self.ensure_surfaces()?;
        let source = source.to_rgb8();
        if source.width() == 0 || source.height() == 0 {
            return Err(ClientError::Compose("source image is empty".into()));
        }

        let transform = transform.clamped();
        let mut frame = RgbImage::new(self.canvas.width, self.canvas.height);
        self.draw_source(&mut frame, &source, transform);
        if let Some(overlay) = overlay {
            self.draw_overlay(&mut frame, overlay);
        }
        Ok(frame)
    }

    fn ensure_surfaces(&self) -> ClientResult<()> {
        if self.canvas.is_empty() || self.preview.is_empty() {
            return Err(ClientError::Compose(format!(
                "drawing surface unavailable (canvas {}x{}, preview {}x{})",
                self.canvas.width, self.canvas.height, self.preview.width, self.preview.height
            )));
        }
        Ok(())
    }

    /// Preview-to-canvas ratios
    fn ratios(&self) -> (f32, f32) {
        (
            self.canvas.width as f32 / self.preview.width as f32,
            self.canvas.height as f32 / self.preview.height as f32,
        )
    }

    fn draw_source(&self, frame: &mut RgbImage, source: &RgbImage, transform: Transform) {
        let (sw, sh) = (source.width() as f32, source.height() as f32);
        let (cw, ch) = (self.canvas.width as f32, self.canvas.height as f32);
        let (rx, ry) = self.ratios();

        let cover = (cw / sw).max(ch / sh);
        let zoom = cover * transform.scale;
        let theta = transform.rotation_deg.to_radians();
        let (sin, cos) = theta.sin_cos();
        let cx = cw / 2.0 + transform.pan.0 * rx;
        let cy = ch / 2.0 + transform.pan.1 * ry;

        debug!(
            source_w = source.width(),
            source_h = source.height(),
            zoom,
            rotation = transform.rotation_deg,
            "Compositing source onto canvas"
        );

        for (x, y, pixel) in frame.enumerate_pixels_mut() {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            // Undo rotation, then scale, then re-center in the source
            let u = (dx * cos + dy * sin) / zoom + sw / 2.0;
            let v = (-dx * sin + dy * cos) / zoom + sh / 2.0;
            if u >= 0.0 && v >= 0.0 && u < sw && v < sh {
                *pixel = sample_bilinear(source, u, v);
            }
        }
    }

    fn draw_overlay(&self, frame: &mut RgbImage, overlay: &TextOverlay) {
        if overlay.is_blank() {
            return;
        }
        let (rx, ry) = self.ratios();
        let face = self
            .typefaces
            .get(&overlay.font.family.to_lowercase())
            .cloned()
            .unwrap_or_else(|| self.fallback_face.clone());

        let size = (overlay.font.size * ry).max(1.0);
        let max_width = self.canvas.width as f32 * LINE_WIDTH_RATIO;
        let content = overlay.bounded_content();
        let lines = wrap_lines(&content, max_width, |s| face.measure(s, size));

        let ax = overlay.anchor.0.clamp(0.0, self.preview.width as f32);
        let ay = overlay.anchor.1.clamp(0.0, self.preview.height as f32);
        let center = (ax * rx, ay * ry);

        debug!(lines = lines.len(), size, face = face.name(), "Drawing text overlay");
        text::draw_block(frame, &face, &lines, center, size, overlay.font.color);
    }

    fn encode(&self, frame: RgbImage) -> ClientResult<CompositeOutput> {
        let (width, height) = frame.dimensions();
        let mut buffer = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
        frame.write_with_encoder(encoder)?;
        Ok(CompositeOutput {
            jpeg: Bytes::from(buffer.into_inner()),
            width,
            height,
        })
    }
}

/// Bilinear sample at continuous pixel coordinates (pixel centers at +0.5)
fn sample_bilinear(source: &RgbImage, u: f32, v: f32) -> Rgb<u8> {
    let max_x = source.width() - 1;
    let max_y = source.height() - 1;
    let fx = (u - 0.5).max(0.0);
    let fy = (v - 0.5).max(0.0);
    let x0 = (fx.floor() as u32).min(max_x);
    let y0 = (fy.floor() as u32).min(max_y);
    let x1 = (x0 + 1).min(max_x);
    let y1 = (y0 + 1).min(max_y);
    let tx = fx - x0 as f32;
    let ty = fy - y0 as f32;

    let p00 = source.get_pixel(x0, y0);
    let p10 = source.get_pixel(x1, y0);
    let p01 = source.get_pixel(x0, y1);
    let p11 = source.get_pixel(x1, y1);

    let mut out = [0u8; 3];
    for (c, slot) in out.iter_mut().enumerate() {
        let top = p00[c] as f32 * (1.0 - tx) + p10[c] as f32 * tx;
        let bottom = p01[c] as f32 * (1.0 - tx) + p11[c] as f32 * tx;
        *slot = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

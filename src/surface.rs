// ============================================================================
// PIXEL SURFACE — the bitmap buffer and its display-to-buffer scaling
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::SketchResult;
use crate::io::{ExportFormat, encode_and_write, encode_image};
use crate::raster::{self, Composite};

/// A pointer position in display coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Cheap reference-counted copy of the whole buffer, used to erase live
/// previews during a gesture.
#[derive(Clone, Debug)]
pub struct Snapshot(Arc<RgbaImage>);

impl Snapshot {
    pub fn image(&self) -> &RgbaImage {
        &self.0
    }
}

/// Lossless (PNG) encoding of the full buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    bytes: Arc<[u8]>,
}

impl EncodedImage {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::from(bytes),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A decoded image waiting to be applied to the surface. Applying it fails
/// if a newer resize or restore request has been issued in the meantime.
#[derive(Debug)]
pub struct PendingRestore {
    ticket: u64,
    image: RgbaImage,
}

impl PendingRestore {
    pub fn ticket(&self) -> u64 {
        self.ticket
    }
}

/// Buffer extent for a display extent at the given device scale.
fn buffer_extent(display: u32, scale: f32) -> u32 {
    ((display as f32 * scale).round() as u32).max(1)
}

/// Owns the RGBA buffer. Buffer size is always `display size × scale`,
/// rounded to whole pixels.
pub struct PixelSurface {
    buffer: RgbaImage,
    display_width: u32,
    display_height: u32,
    scale: f32,
    background: Rgba<u8>,
    /// Bumped by every resize and every restore request.
    ticket: u64,
}

impl PixelSurface {
    pub fn new(display_width: u32, display_height: u32, scale: f32, background: Rgba<u8>) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let display_width = display_width.max(1);
        let display_height = display_height.max(1);
        let buffer = RgbaImage::from_pixel(
            buffer_extent(display_width, scale),
            buffer_extent(display_height, scale),
            background,
        );
        Self {
            buffer,
            display_width,
            display_height,
            scale,
            background,
            ticket: 0,
        }
    }

    // ---- dimensions ---------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn display_size(&self) -> (u32, u32) {
        (self.display_width, self.display_height)
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn background(&self) -> Rgba<u8> {
        self.background
    }

    /// Color used for area newly exposed by a resize.
    pub fn set_background(&mut self, color: Rgba<u8>) {
        self.background = color;
    }

    /// Convert a display-space point to buffer-space coordinates.
    pub fn to_buffer(&self, p: Point) -> (f32, f32) {
        (p.x * self.scale, p.y * self.scale)
    }

    /// Buffer pixel containing a display-space point.
    pub fn to_buffer_pixel(&self, p: Point) -> (i64, i64) {
        let (x, y) = self.to_buffer(p);
        (x.floor() as i64, y.floor() as i64)
    }

    pub fn image(&self) -> &RgbaImage {
        &self.buffer
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.buffer
    }

    // ---- resize -------------------------------------------------------------

    /// Reallocate for a new display size, keeping drawn content anchored at
    /// the origin. Returns `false` for a degenerate target.
    pub fn resize(&mut self, display_width: u32, display_height: u32) -> bool {
        self.reallocate(display_width, display_height, self.scale)
    }

    /// Change the device pixel scale; content is rescaled to match.
    pub fn set_device_pixel_scale(&mut self, scale: f32) -> bool {
        if !scale.is_finite() || scale <= 0.0 {
            tracing::warn!(scale, "ignoring non-positive device pixel scale");
            return false;
        }
        self.reallocate(self.display_width, self.display_height, scale)
    }

    fn reallocate(&mut self, display_width: u32, display_height: u32, scale: f32) -> bool {
        if display_width == 0 || display_height == 0 {
            tracing::warn!(display_width, display_height, "refusing degenerate surface resize");
            return false;
        }

        let new_w = buffer_extent(display_width, scale);
        let new_h = buffer_extent(display_height, scale);
        let mut next = RgbaImage::from_pixel(new_w, new_h, self.background);

        if (scale - self.scale).abs() > f32::EPSILON {
            let ratio = scale / self.scale;
            let sw = ((self.buffer.width() as f32 * ratio).round() as u32).max(1);
            let sh = ((self.buffer.height() as f32 * ratio).round() as u32).max(1);
            let rescaled = imageops::resize(&self.buffer, sw, sh, FilterType::Nearest);
            raster::copy_image(&mut next, &rescaled, 0, 0);
        } else {
            raster::copy_image(&mut next, &self.buffer, 0, 0);
        }

        tracing::debug!(
            from = ?(self.buffer.width(), self.buffer.height()),
            to = ?(new_w, new_h),
            scale,
            "surface reallocated"
        );

        self.buffer = next;
        self.display_width = display_width;
        self.display_height = display_height;
        self.scale = scale;
        self.ticket += 1;
        true
    }

    // ---- pixel access -------------------------------------------------------

    /// Fill the whole buffer with an opaque background color.
    pub fn clear(&mut self, background: Rgba<u8>) {
        let mut color = background;
        color[3] = 255;
        for px in self.buffer.pixels_mut() {
            *px = color;
        }
    }

    /// `None` when the coordinates fall outside the buffer.
    pub fn get_pixel(&self, x: i64, y: i64) -> Option<Rgba<u8>> {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return None;
        }
        Some(*self.buffer.get_pixel(x as u32, y as u32))
    }

    pub fn set_pixel(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        raster::plot(&mut self.buffer, x, y, color, Composite::Replace);
    }

    /// Read a `w × h` block. Pixels outside the buffer read as transparent.
    pub fn get_region(&self, x: i64, y: i64, w: u32, h: u32) -> RgbaImage {
        let mut out = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));
        raster::copy_image(&mut out, &self.buffer, -x, -y);
        out
    }

    /// Write a block with its top-left corner at `(x, y)`, clipped.
    pub fn put_region(&mut self, x: i64, y: i64, block: &RgbaImage) {
        raster::copy_image(&mut self.buffer, block, x, y);
    }

    // ---- snapshots ----------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(Arc::new(self.buffer.clone()))
    }

    pub fn restore_snapshot(&mut self, snapshot: &Snapshot) {
        self.place(snapshot.image());
    }

    pub fn snapshot_encoded(&self) -> SketchResult<EncodedImage> {
        let bytes = encode_image(&self.buffer, ExportFormat::Png)?;
        Ok(EncodedImage::from_bytes(bytes))
    }

    /// Decode and apply in one step.
    pub fn restore_encoded(&mut self, encoded: &EncodedImage) -> SketchResult<()> {
        let pending = self.decode_for_restore(encoded)?;
        self.apply_restore(pending);
        Ok(())
    }

    /// First phase of a restore: decode the image and claim a ticket.
    /// Any earlier pending restore becomes stale.
    pub fn decode_for_restore(&mut self, encoded: &EncodedImage) -> SketchResult<PendingRestore> {
        let image = image::load_from_memory_with_format(encoded.as_bytes(), ImageFormat::Png)?
            .into_rgba8();
        self.ticket += 1;
        Ok(PendingRestore {
            ticket: self.ticket,
            image,
        })
    }

    /// Second phase: apply a decoded image unless it has been superseded.
    pub fn apply_restore(&mut self, pending: PendingRestore) -> bool {
        if pending.ticket != self.ticket {
            tracing::warn!(
                stale = pending.ticket,
                current = self.ticket,
                "discarding superseded restore"
            );
            return false;
        }
        self.place(&pending.image);
        true
    }

    /// Show `image` as the whole buffer. A different-sized image (one taken
    /// before a resize) lands at the origin over fresh background, so
    /// nothing outside its extent survives from the current buffer.
    fn place(&mut self, image: &RgbaImage) {
        if image.dimensions() == self.buffer.dimensions() {
            self.buffer.clone_from(image);
        } else {
            let background = self.background;
            self.buffer.pixels_mut().for_each(|px| *px = background);
            raster::copy_image(&mut self.buffer, image, 0, 0);
        }
    }

    // ---- export -------------------------------------------------------------

    pub fn encode_png(&self) -> SketchResult<Vec<u8>> {
        encode_image(&self.buffer, ExportFormat::Png)
    }

    pub fn export(&self, path: &Path, format: ExportFormat) -> SketchResult<()> {
        encode_and_write(&self.buffer, path, format)
    }
}

// ============================================================================
// RASTER PRIMITIVES — hard-edged pen, rectangle, circle and outline drawing
// ============================================================================
//
// Every primitive writes straight into an `RgbaImage` and clips silently at
// the buffer edges. Coordinates are buffer-space floats; a pixel (x, y)
// covers the square [x, x+1) × [y, y+1) and its center is (x+0.5, y+0.5).
// No anti-aliasing is applied so flood fill sees exact colors.

use image::{Rgba, RgbaImage};

/// How a primitive writes its color into the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Composite {
    /// Standard alpha compositing of the color over the existing pixel.
    SourceOver,
    /// Overwrite the pixel outright (eraser / hole fill).
    Replace,
}

/// A round pen: color, diameter in buffer pixels and compositing mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pen {
    pub color: Rgba<u8>,
    pub width: f32,
    pub composite: Composite,
}

impl Pen {
    pub fn new(color: Rgba<u8>, width: f32, composite: Composite) -> Self {
        Self {
            color,
            width: width.max(1.0),
            composite,
        }
    }
}

/// Alpha-composite `src` over `dst` (straight alpha).
pub fn alpha_blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as u32;
    if sa == 255 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    let da = dst[3] as u32;
    let out_a = sa + da * (255 - sa) / 255;
    if out_a == 0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let s = src[c] as u32 * sa;
        let d = dst[c] as u32 * da * (255 - sa) / 255;
        out[c] = ((s + d) / out_a).min(255) as u8;
    }
    out[3] = out_a.min(255) as u8;
    Rgba(out)
}

/// Write a single pixel; out-of-bounds coordinates are ignored.
#[inline]
pub fn plot(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, composite: Composite) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    match composite {
        Composite::Replace => img.put_pixel(x, y, color),
        Composite::SourceOver => {
            let dst = *img.get_pixel(x, y);
            img.put_pixel(x, y, alpha_blend(dst, color));
        }
    }
}

/// Half-open pixel span `[lo, hi)` covered by the interval between two
/// coordinates. Shared by filled rectangles and move selections so both
/// agree on which pixels a drag covers.
pub fn pixel_span(a: f32, b: f32) -> (i64, i64) {
    let lo = a.min(b).round() as i64;
    let hi = a.max(b).round() as i64;
    (lo, hi)
}

/// Stamp a filled disc of the pen's diameter centered at `(cx, cy)`.
/// The pixel containing the center is always painted.
pub fn stamp_disc(img: &mut RgbaImage, cx: f32, cy: f32, pen: &Pen) {
    let r = pen.width / 2.0;
    let r2 = r * r;
    let min_x = (cx - r).floor() as i64;
    let max_x = (cx + r).ceil() as i64;
    let min_y = (cy - r).floor() as i64;
    let max_y = (cy + r).ceil() as i64;
    let (hx, hy) = (cx.floor() as i64, cy.floor() as i64);

    for py in min_y..=max_y {
        for px in min_x..=max_x {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 || (px == hx && py == hy) {
                plot(img, px, py, pen.color, pen.composite);
            }
        }
    }
}

/// Stroke a straight segment with dense one-pixel stepping.
pub fn stroke_segment(img: &mut RgbaImage, from: (f32, f32), to: (f32, f32), pen: &Pen) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let distance = (dx * dx + dy * dy).sqrt();

    if distance < 0.1 {
        stamp_disc(img, from.0, from.1, pen);
        return;
    }

    let steps = distance.ceil() as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        stamp_disc(img, from.0 + dx * t, from.1 + dy * t, pen);
    }
}

/// Axis-aligned rectangle outline with corners at `a` and `b`.
pub fn rect_outline(img: &mut RgbaImage, a: (f32, f32), b: (f32, f32), pen: &Pen) {
    let corners = [a, (b.0, a.1), b, (a.0, b.1)];
    for i in 0..4 {
        stroke_segment(img, corners[i], corners[(i + 1) % 4], pen);
    }
}

/// Solid axis-aligned rectangle covering the pixels between `a` and `b`.
pub fn rect_filled(
    img: &mut RgbaImage,
    a: (f32, f32),
    b: (f32, f32),
    color: Rgba<u8>,
    composite: Composite,
) {
    let (x0, x1) = pixel_span(a.0, b.0);
    let (y0, y1) = pixel_span(a.1, b.1);
    let x0 = x0.max(0);
    let y0 = y0.max(0);
    let x1 = x1.min(img.width() as i64);
    let y1 = y1.min(img.height() as i64);
    for y in y0..y1 {
        for x in x0..x1 {
            plot(img, x, y, color, composite);
        }
    }
}

/// Circle outline centered at `center`; the ring is `pen.width` thick and
/// straddles the radius.
pub fn circle_outline(img: &mut RgbaImage, center: (f32, f32), radius: f32, pen: &Pen) {
    let half = pen.width / 2.0;
    if radius <= half {
        circle_filled(img, center, radius.max(half), pen.color, pen.composite);
        return;
    }
    let inner = radius - half;
    let outer = radius + half;
    let (inner2, outer2) = (inner * inner, outer * outer);

    let min_x = ((center.0 - outer).floor() as i64).max(0);
    let max_x = ((center.0 + outer).ceil() as i64).min(img.width() as i64 - 1);
    let min_y = ((center.1 - outer).floor() as i64).max(0);
    let max_y = ((center.1 + outer).ceil() as i64).min(img.height() as i64 - 1);

    for py in min_y..=max_y {
        for px in min_x..=max_x {
            let dx = px as f32 + 0.5 - center.0;
            let dy = py as f32 + 0.5 - center.1;
            let d2 = dx * dx + dy * dy;
            if d2 >= inner2 && d2 <= outer2 {
                plot(img, px, py, pen.color, pen.composite);
            }
        }
    }
}

/// Solid disc of the given radius. The center pixel is always painted.
pub fn circle_filled(
    img: &mut RgbaImage,
    center: (f32, f32),
    radius: f32,
    color: Rgba<u8>,
    composite: Composite,
) {
    stamp_disc(
        img,
        center.0,
        center.1,
        &Pen {
            color,
            width: radius.max(0.0) * 2.0,
            composite,
        },
    );
}

/// One-pixel dashed rectangle outline used for the move-selection marquee.
pub fn dashed_rect(img: &mut RgbaImage, a: (f32, f32), b: (f32, f32), color: Rgba<u8>, dash: u32) {
    let dash = dash.max(1) as i64;
    let (x0, x1) = pixel_span(a.0, b.0);
    let (y0, y1) = pixel_span(a.1, b.1);
    if x1 <= x0 || y1 <= y0 {
        return;
    }
    let (right, bottom) = (x1 - 1, y1 - 1);

    // Walk the perimeter clockwise so the dash phase is continuous.
    let mut perimeter: Vec<(i64, i64)> = Vec::new();
    perimeter.extend((x0..=right).map(|x| (x, y0)));
    perimeter.extend((y0 + 1..=bottom).map(|y| (right, y)));
    if bottom > y0 {
        perimeter.extend((x0..right).rev().map(|x| (x, bottom)));
    }
    if right > x0 {
        perimeter.extend((y0 + 1..bottom).rev().map(|y| (x0, y)));
    }

    for (i, (x, y)) in perimeter.into_iter().enumerate() {
        if (i as i64 / dash) % 2 == 0 {
            plot(img, x, y, color, Composite::Replace);
        }
    }
}

/// Copy `src` into `dst` with its top-left corner at `(x, y)`, replacing
/// destination pixels. Clips to the destination.
pub fn copy_image(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    blit(dst, src, x, y, Composite::Replace);
}

/// Alpha-composite `src` over `dst` with its top-left corner at `(x, y)`.
pub fn composite_image(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64) {
    blit(dst, src, x, y, Composite::SourceOver);
}

fn blit(dst: &mut RgbaImage, src: &RgbaImage, x: i64, y: i64, composite: Composite) {
    let dw = dst.width() as i64;
    let dh = dst.height() as i64;
    let sx0 = (-x).max(0);
    let sy0 = (-y).max(0);
    let sx1 = (src.width() as i64).min(dw - x);
    let sy1 = (src.height() as i64).min(dh - y);
    if sx1 <= sx0 || sy1 <= sy0 {
        return;
    }
    for sy in sy0..sy1 {
        for sx in sx0..sx1 {
            let px = *src.get_pixel(sx as u32, sy as u32);
            plot(dst, x + sx, y + sy, px, composite);
        }
    }
}

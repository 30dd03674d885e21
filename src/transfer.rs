// ============================================================================
// REGION TRANSFER — detach a rectangle, float it under the pointer, commit
// ============================================================================

use image::{Rgba, RgbaImage};

use crate::raster::{self, Composite, pixel_span};
use crate::surface::{PixelSurface, Snapshot};

/// Normalized buffer-space rectangle; width and height are never negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl SelectionRect {
    /// Rectangle spanned by two drag corners, regardless of drag direction.
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        let (x0, x1) = pixel_span(a.0, b.0);
        let (y0, y1) = pixel_span(a.1, b.1);
        Self {
            x: x0,
            y: y0,
            width: (x1 - x0).clamp(0, u32::MAX as i64) as u32,
            height: (y1 - y0).clamp(0, u32::MAX as i64) as u32,
        }
    }

    /// Selection for a Move drag, or `None` when the drag spans less than one
    /// buffer pixel in either axis. The extent is measured before snapping.
    pub fn from_drag(a: (f32, f32), b: (f32, f32)) -> Option<Self> {
        if (a.0 - b.0).abs() < 1.0 || (a.1 - b.1).abs() < 1.0 {
            return None;
        }
        Some(Self::from_corners(a, b)).filter(|rect| !rect.is_degenerate())
    }

    /// Selections thinner than one pixel in either axis are rejected.
    pub fn is_degenerate(&self) -> bool {
        self.width < 1 || self.height < 1
    }
}

/// A detached pixel block. It has no canvas position of its own; it is
/// drawn with its top-left corner at the pointer.
#[derive(Clone, Debug)]
pub struct FloatingRegion {
    pub image: RgbaImage,
    pub width: u32,
    pub height: u32,
}

struct Floating {
    region: FloatingRegion,
    /// Buffer with the hole already filled, minus the floating block.
    base: Snapshot,
}

/// Holds the floating region between the end of a Move drag and the click
/// that drops it.
#[derive(Default)]
pub struct RegionTransfer {
    floating: Option<Floating>,
}

impl RegionTransfer {
    pub fn is_floating(&self) -> bool {
        self.floating.is_some()
    }

    pub fn floating(&self) -> Option<&FloatingRegion> {
        self.floating.as_ref().map(|f| &f.region)
    }

    /// Capture `rect`, fill it with `background` and start floating.
    /// Returns `false` (and changes nothing) for a degenerate rectangle.
    pub fn detach(&mut self, surface: &mut PixelSurface, rect: SelectionRect, background: Rgba<u8>) -> bool {
        if rect.is_degenerate() {
            return false;
        }

        let image = surface.get_region(rect.x, rect.y, rect.width, rect.height);
        raster::rect_filled(
            surface.image_mut(),
            (rect.x as f32, rect.y as f32),
            ((rect.x + rect.width as i64) as f32, (rect.y + rect.height as i64) as f32),
            background,
            Composite::Replace,
        );
        let base = surface.snapshot();

        tracing::debug!(?rect, "region detached");
        self.floating = Some(Floating {
            region: FloatingRegion {
                image,
                width: rect.width,
                height: rect.height,
            },
            base,
        });
        true
    }

    /// Redraw the floating block at `at` over the hole-filled base.
    pub fn preview(&self, surface: &mut PixelSurface, at: (i64, i64)) -> bool {
        let Some(floating) = &self.floating else {
            return false;
        };
        surface.restore_snapshot(&floating.base);
        raster::composite_image(surface.image_mut(), &floating.region.image, at.0, at.1);
        true
    }

    /// Drop the floating block at `at` and leave the floating state.
    pub fn commit(&mut self, surface: &mut PixelSurface, at: (i64, i64)) -> bool {
        let Some(floating) = self.floating.take() else {
            return false;
        };
        surface.restore_snapshot(&floating.base);
        raster::composite_image(surface.image_mut(), &floating.region.image, at.0, at.1);
        tracing::debug!(x = at.0, y = at.1, "floating region committed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{WHITE, opaque};

    fn patterned(w: u32, h: u32) -> PixelSurface {
        let mut s = PixelSurface::new(w, h, 1.0, WHITE);
        for y in 0..h as i64 {
            for x in 0..w as i64 {
                s.set_pixel(x, y, opaque((x * 13) as u8, (y * 29) as u8, 77));
            }
        }
        s
    }

    #[test]
    fn rect_normalizes_drag_direction() {
        let r = SelectionRect::from_corners((7.0, 2.0), (2.0, 9.0));
        assert_eq!(r, SelectionRect { x: 2, y: 2, width: 5, height: 7 });
        assert!(SelectionRect::from_corners((3.0, 3.0), (3.2, 8.0)).is_degenerate());
    }

    #[test]
    fn sub_pixel_drag_is_not_a_selection() {
        assert_eq!(SelectionRect::from_drag((3.0, 3.0), (3.6, 8.0)), None);
        assert_eq!(SelectionRect::from_drag((3.0, 3.0), (8.0, 2.5)), None);
        assert_eq!(
            SelectionRect::from_drag((3.0, 3.0), (4.0, 8.0)),
            Some(SelectionRect { x: 3, y: 3, width: 1, height: 5 })
        );
    }

    #[test]
    fn detach_fills_hole_with_background() {
        let mut s = patterned(8, 8);
        let bg = opaque(1, 2, 3);
        let mut t = RegionTransfer::default();
        assert!(t.detach(&mut s, SelectionRect { x: 2, y: 3, width: 3, height: 2 }, bg));
        assert_eq!(s.get_pixel(2, 3), Some(bg));
        assert_eq!(s.get_pixel(4, 4), Some(bg));
        assert_ne!(s.get_pixel(5, 4), Some(bg));
        let region = t.floating().unwrap();
        assert_eq!((region.width, region.height), (3, 2));
    }

    #[test]
    fn paste_back_at_origin_restores_buffer() {
        let mut s = patterned(10, 10);
        let original = s.image().clone();
        let mut t = RegionTransfer::default();
        let rect = SelectionRect { x: 1, y: 4, width: 6, height: 5 };
        assert!(t.detach(&mut s, rect, WHITE));
        assert!(t.preview(&mut s, (8, 8)));
        assert!(t.commit(&mut s, (rect.x, rect.y)));
        assert!(!t.is_floating());
        assert_eq!(s.image(), &original);
    }

    #[test]
    fn degenerate_detach_changes_nothing() {
        let mut s = patterned(4, 4);
        let original = s.image().clone();
        let mut t = RegionTransfer::default();
        assert!(!t.detach(&mut s, SelectionRect { x: 1, y: 1, width: 0, height: 3 }, WHITE));
        assert!(!t.is_floating());
        assert_eq!(s.image(), &original);
    }
}

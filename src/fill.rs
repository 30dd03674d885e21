use std::collections::VecDeque;

use image::{Rgba, RgbaImage};

use crate::color::parse_color;
use crate::error::SketchResult;

/// What a fill did, for callers that want more than the pixel count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillStats {
    pub filled: usize,
    /// Longest the work queue got.
    pub peak_queue: usize,
}

/// 4-connected flood fill with an explicit breadth-first work queue.
///
/// Every pixel reachable from `(x, y)` through orthogonal neighbours of
/// exactly the origin's color is set to `replacement`. Colors match only on
/// exact RGBA equality. Returns the number of pixels changed; an
/// out-of-bounds origin or an origin already equal to `replacement` returns
/// 0 without touching the buffer.
pub fn flood_fill(img: &mut RgbaImage, x: i64, y: i64, replacement: Rgba<u8>) -> usize {
    flood_fill_with_stats(img, x, y, replacement).filled
}

/// [`flood_fill`], also reporting the peak queue length. The queue only
/// ever holds neighbours pushed by the last two BFS rings, four per pixel.
pub fn flood_fill_with_stats(img: &mut RgbaImage, x: i64, y: i64, replacement: Rgba<u8>) -> FillStats {
    let (w, h) = (img.width() as i64, img.height() as i64);
    let mut stats = FillStats::default();
    if x < 0 || y < 0 || x >= w || y >= h {
        return stats;
    }

    let target = *img.get_pixel(x as u32, y as u32);
    if target == replacement {
        return stats;
    }

    let mut queue: VecDeque<(i64, i64)> = VecDeque::with_capacity(1024);
    queue.push_back((x, y));

    while let Some((px, py)) = queue.pop_front() {
        if px < 0 || py < 0 || px >= w || py >= h {
            continue;
        }
        let (ux, uy) = (px as u32, py as u32);
        // Already-filled pixels no longer equal the target, so repeats are inert.
        if *img.get_pixel(ux, uy) != target {
            continue;
        }
        img.put_pixel(ux, uy, replacement);
        stats.filled += 1;

        queue.push_back((px, py - 1));
        queue.push_back((px, py + 1));
        queue.push_back((px - 1, py));
        queue.push_back((px + 1, py));
        stats.peak_queue = stats.peak_queue.max(queue.len());
    }

    tracing::trace!(x, y, filled = stats.filled, peak = stats.peak_queue, "flood fill");
    stats
}

/// Flood fill with a textual color. A malformed specification aborts
/// before the buffer is read or written.
pub fn flood_fill_spec(img: &mut RgbaImage, x: i64, y: i64, spec: &str) -> SketchResult<usize> {
    let replacement = parse_color(spec)?;
    Ok(flood_fill(img, x, y, replacement))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BLACK, WHITE, opaque};
    use crate::error::SketchError;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn fill_matching_replacement_is_noop() {
        let mut img = RgbaImage::from_pixel(5, 5, RED);
        img.put_pixel(2, 2, BLACK);
        let before = img.clone();
        assert_eq!(flood_fill(&mut img, 0, 0, RED), 0);
        assert_eq!(img, before);
    }

    #[test]
    fn uniform_buffer_fills_completely() {
        for (x, y) in [(0, 0), (6, 3), (11, 7)] {
            let mut img = RgbaImage::from_pixel(12, 8, WHITE);
            assert_eq!(flood_fill(&mut img, x, y, RED), 96);
            assert!(img.pixels().all(|p| *p == RED));
        }
    }

    #[test]
    fn diagonal_gaps_do_not_leak() {
        // Diagonal wall from (0,3) to (3,0) separates the top-left corner.
        let mut img = RgbaImage::from_pixel(6, 6, WHITE);
        for i in 0..4 {
            img.put_pixel(i, 3 - i, BLACK);
        }
        flood_fill(&mut img, 0, 0, RED);
        assert_eq!(*img.get_pixel(0, 0), RED);
        assert_eq!(*img.get_pixel(1, 1), RED);
        assert_eq!(*img.get_pixel(5, 5), WHITE);
        assert_eq!(*img.get_pixel(0, 3), BLACK);
    }

    #[test]
    fn exact_match_only() {
        let mut img = RgbaImage::from_pixel(3, 1, WHITE);
        img.put_pixel(1, 0, opaque(254, 255, 255));
        flood_fill(&mut img, 0, 0, RED);
        assert_eq!(*img.get_pixel(0, 0), RED);
        assert_eq!(*img.get_pixel(1, 0), opaque(254, 255, 255));
        assert_eq!(*img.get_pixel(2, 0), WHITE);
    }

    #[test]
    fn out_of_bounds_origin_is_noop() {
        let mut img = RgbaImage::from_pixel(3, 3, WHITE);
        assert_eq!(flood_fill(&mut img, -1, 0, RED), 0);
        assert_eq!(flood_fill(&mut img, 0, 3, RED), 0);
        assert!(img.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn large_region_does_not_recurse() {
        let mut img = RgbaImage::from_pixel(512, 512, WHITE);
        assert_eq!(flood_fill(&mut img, 256, 256, BLACK), 512 * 512);
    }

    #[test]
    fn queue_stays_within_four_times_frontier() {
        // A Manhattan ring crosses each column at most twice.
        let side = 64u32;
        let ring = 2 * side as usize;
        for (x, y) in [(32, 32), (0, 0), (63, 10)] {
            let mut img = RgbaImage::from_pixel(side, side, WHITE);
            let stats = flood_fill_with_stats(&mut img, x, y, RED);
            assert_eq!(stats.filled, (side * side) as usize);
            assert!(stats.peak_queue <= 4 * 2 * ring, "peak {}", stats.peak_queue);
        }
    }

    #[test]
    fn malformed_spec_leaves_buffer_alone() {
        let mut img = RgbaImage::from_pixel(3, 3, WHITE);
        let err = flood_fill_spec(&mut img, 1, 1, "#zzzzzz").unwrap_err();
        assert!(matches!(err, SketchError::InvalidColorSpecification(_)));
        assert!(img.pixels().all(|p| *p == WHITE));
        assert_eq!(flood_fill_spec(&mut img, 1, 1, "#ff0000").unwrap(), 9);
    }
}

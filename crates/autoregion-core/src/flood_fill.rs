//! Scanline flood fill with bounding-box accumulation
//!
//! Grows the 4-connected region of pixels whose color channels equal the
//! seed pixel's (alpha ignored). Each task fills a whole horizontal run, then
//! schedules the neighbouring rows. Tasks live on an explicit stack, so the
//! call depth stays constant no matter how tall the region is.
//!
//! Matched pixels are overwritten with the fill color. Visiting is tracked
//! in a separate [`VisitedMask`], so a fill color equal to the seed color
//! still terminates.

use serde::{Deserialize, Serialize};

use crate::{
    buffer::PixelBuffer,
    error::DetectResult,
    model::{Bgra, Point, RectConvention, Rectangle},
};

/// Visited flags with one slack row and column
#[derive(Debug, Clone)]
pub struct VisitedMask {
    cols:  usize,
    flags: Vec<bool>,
}

impl VisitedMask {
    /// Creates a cleared mask for a `width x height` buffer
    pub fn new(width: u32, height: u32) -> Self {
        let cols = width as usize + 1;
        Self {
            cols,
            flags: vec![false; cols * (height as usize + 1)],
        }
    }

    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.flags[y as usize * self.cols + x as usize]
    }

    pub fn set(&mut self, x: u32, y: u32) {
        self.flags[y as usize * self.cols + x as usize] = true;
    }

    /// Number of flagged pixels
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&v| v).count()
    }
}

/// Running min/max of the filled coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: i64,
    pub max_x: i64,
    pub min_y: i64,
    pub max_y: i64,
}

impl BoundingBox {
    /// An empty box; any accumulated point replaces the sentinels
    pub fn empty() -> Self {
        Self {
            min_x: i64::MAX,
            max_x: i64::MIN,
            min_y: i64::MAX,
            max_y: i64::MIN,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Extends the box by the run `lo..=hi` on row `y`
    pub fn add_run(&mut self, lo: u32, hi: u32, y: u32) {
        self.min_x = self.min_x.min(i64::from(lo));
        self.max_x = self.max_x.max(i64::from(hi));
        self.min_y = self.min_y.min(i64::from(y));
        self.max_y = self.max_y.max(i64::from(y));
    }

    /// Rectangle whose width and height count pixels
    ///
    /// An empty box yields a zero rectangle.
    pub fn to_rect(&self) -> Rectangle {
        self.rect_with(RectConvention::Inclusive)
    }

    /// Rectangle whose width and height are `max - min`
    pub fn to_span_rect(&self) -> Rectangle {
        self.rect_with(RectConvention::Span)
    }

    pub fn rect_with(&self, convention: RectConvention) -> Rectangle {
        if self.is_empty() {
            return Rectangle::new(0, 0, 0, 0);
        }
        let extra = match convention {
            RectConvention::Inclusive => 1,
            RectConvention::Span => 0,
        };
        Rectangle::new(
            self.min_x as u32,
            self.min_y as u32,
            (self.max_x - self.min_x + extra) as u32,
            (self.max_y - self.min_y + extra) as u32,
        )
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

/// A filled buffer and the bounds of the region that was grown
#[derive(Debug, Clone)]
pub struct FilledRegion {
    pub buffer: PixelBuffer,
    pub bounds: BoundingBox,
}

struct Grower<'a> {
    buffer:  &'a mut PixelBuffer,
    visited: VisitedMask,
    target:  Bgra,
    fill:    Bgra,
    bounds:  BoundingBox,
    stack:   Vec<(u32, u32)>,
}

impl Grower<'_> {
    fn open(&self, x: u32, y: u32) -> bool {
        !self.visited.is_set(x, y) && self.buffer.read(x, y).same_rgb(&self.target)
    }

    fn take(&mut self, x: u32, y: u32) {
        self.visited.set(x, y);
        self.buffer.write(x, y, self.fill);
    }

    fn run(&mut self) {
        let (width, height) = self.buffer.dimensions();

        while let Some((x, y)) = self.stack.pop() {
            // Another run may have covered this pixel since it was queued
            if !self.open(x, y) {
                continue;
            }
            self.take(x, y);

            let mut lo = x;
            while lo > 0 && self.open(lo - 1, y) {
                lo -= 1;
                self.take(lo, y);
            }
            let mut hi = x;
            while hi + 1 < width && self.open(hi + 1, y) {
                hi += 1;
                self.take(hi, y);
            }
            self.bounds.add_run(lo, hi, y);

            // Queue one task per open stretch of each neighbouring row. Pushed
            // in reverse so pops follow ascending columns, row above first.
            let mut pending = Vec::new();
            for i in lo..=hi {
                if y > 0 && self.open(i, y - 1) && (i == lo || !self.open(i - 1, y - 1)) {
                    pending.push((i, y - 1));
                }
                if y + 1 < height && self.open(i, y + 1) && (i == lo || !self.open(i - 1, y + 1)) {
                    pending.push((i, y + 1));
                }
            }
            self.stack.extend(pending.into_iter().rev());
        }
    }
}

/// Grows the region around `seed` and returns its raw bounds
///
/// Fails with [`DetectError::OutOfBounds`](crate::error::DetectError) before
/// touching the buffer when the seed is outside it.
pub fn fill_bounds(buffer: &mut PixelBuffer, seed: Point, fill: Bgra) -> DetectResult<BoundingBox> {
    let (sx, sy) = buffer.check_point(seed)?;
    let target = buffer.read(sx, sy);
    let (width, height) = buffer.dimensions();

    let mut grower = Grower {
        buffer,
        visited: VisitedMask::new(width, height),
        target,
        fill,
        bounds: BoundingBox::empty(),
        stack: vec![(sx, sy)],
    };
    grower.run();

    tracing::debug!(
        seed_x = sx,
        seed_y = sy,
        filled = grower.visited.count(),
        min_x = grower.bounds.min_x,
        max_x = grower.bounds.max_x,
        min_y = grower.bounds.min_y,
        max_y = grower.bounds.max_y,
        "Flood fill finished"
    );
    Ok(grower.bounds)
}

/// Flood fills from `seed` and returns the minimal enclosing rectangle
///
/// # Examples
///
/// ```
/// use autoregion_core::{
///     buffer::PixelBuffer,
///     flood_fill::flood_fill,
///     model::{Bgra, Point, Rectangle},
/// };
///
/// let mut buf = PixelBuffer::from_fn(10, 10, |x, y| {
///     if (2..=5).contains(&x) && (3..=5).contains(&y) { Bgra::WHITE } else { Bgra::BLACK }
/// })
/// .unwrap();
/// let rect = flood_fill(&mut buf, Point::new(3, 4), Bgra::RED).unwrap();
/// assert_eq!(rect, Rectangle::new(2, 3, 4, 3));
/// ```
pub fn flood_fill(buffer: &mut PixelBuffer, seed: Point, fill: Bgra) -> DetectResult<Rectangle> {
    fill_bounds(buffer, seed, fill).map(|bounds| bounds.to_rect())
}

/// Owning variant of [`fill_bounds`] for pipeline stages
pub fn grow_region(mut buffer: PixelBuffer, seed: Point, fill: Bgra) -> DetectResult<FilledRegion> {
    let bounds = fill_bounds(&mut buffer, seed, fill)?;
    Ok(FilledRegion { buffer, bounds })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DetectError;

    fn with_block(
        w: u32,
        h: u32,
        xs: std::ops::RangeInclusive<u32>,
        ys: std::ops::RangeInclusive<u32>,
    ) -> PixelBuffer {
        PixelBuffer::from_fn(w, h, |x, y| {
            if xs.contains(&x) && ys.contains(&y) { Bgra::WHITE } else { Bgra::BLACK }
        })
        .unwrap()
    }

    #[test]
    fn test_end_to_end_block() {
        let mut buf = with_block(10, 10, 2..=5, 3..=5);
        let rect = flood_fill(&mut buf, Point::new(3, 4), Bgra::RED).unwrap();
        assert_eq!(rect, Rectangle::new(2, 3, 4, 3));

        // Exactly the block was painted
        for y in 0..10 {
            for x in 0..10 {
                let expected = if (2..=5).contains(&x) && (3..=5).contains(&y) {
                    Bgra::RED
                } else {
                    Bgra::BLACK
                };
                assert_eq!(buf.get(x, y).unwrap(), expected, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_minimal_from_every_interior_point() {
        for sy in 4..=8 {
            for sx in 1..=6 {
                let mut buf = with_block(12, 12, 1..=6, 4..=8);
                let rect = flood_fill(&mut buf, Point::new(sx, sy), Bgra::RED).unwrap();
                assert_eq!(rect, Rectangle::new(1, 4, 6, 5));
            }
        }
    }

    #[test]
    fn test_uniform_buffer_fills_everything() {
        let mut buf = PixelBuffer::filled(7, 5, Bgra::opaque(12, 34, 56)).unwrap();
        let rect = flood_fill(&mut buf, Point::new(3, 2), Bgra::RED).unwrap();
        assert_eq!(rect, Rectangle::new(0, 0, 7, 5));
        assert!(buf.pixels().all(|px| px == Bgra::RED));
    }

    #[test]
    fn test_diagonal_regions_stay_separate() {
        // Two white 2x2 squares touching only at a corner
        let mut base = PixelBuffer::filled(6, 6, Bgra::BLACK).unwrap();
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2), (3, 3), (4, 3), (3, 4), (4, 4)] {
            base.set(x, y, Bgra::WHITE).unwrap();
        }

        let mut a = base.clone();
        let rect_a = flood_fill(&mut a, Point::new(1, 1), Bgra::RED).unwrap();
        assert_eq!(rect_a, Rectangle::new(1, 1, 2, 2));
        assert_eq!(a.get(3, 3).unwrap(), Bgra::WHITE);

        let mut b = base.clone();
        let rect_b = flood_fill(&mut b, Point::new(4, 4), Bgra::RED).unwrap();
        assert_eq!(rect_b, Rectangle::new(3, 3, 2, 2));
        assert_eq!(b.get(2, 2).unwrap(), Bgra::WHITE);
    }

    #[test]
    fn test_out_of_bounds_seed_leaves_buffer_untouched() {
        let original = with_block(10, 10, 2..=5, 3..=5);
        for seed in [Point::new(10, 0), Point::new(-1, 0), Point::new(0, 10), Point::new(0, -1)] {
            let mut buf = original.clone();
            let err = flood_fill(&mut buf, seed, Bgra::RED).unwrap_err();
            assert!(matches!(err, DetectError::OutOfBounds { .. }));
            assert_eq!(buf, original);
        }
    }

    #[test]
    fn test_fill_color_equal_to_seed_color_terminates() {
        let mut buf = with_block(8, 8, 0..=7, 0..=3);
        let rect = flood_fill(&mut buf, Point::new(0, 0), Bgra::WHITE).unwrap();
        assert_eq!(rect, Rectangle::new(0, 0, 8, 4));
    }

    #[test]
    fn test_alpha_is_ignored_when_matching() {
        let mut buf = PixelBuffer::from_fn(4, 1, |x, _| Bgra::new(9, 9, 9, (x * 50) as u8)).unwrap();
        let rect = flood_fill(&mut buf, Point::new(0, 0), Bgra::RED).unwrap();
        assert_eq!(rect, Rectangle::new(0, 0, 4, 1));
    }

    #[test]
    fn test_u_shape_reaches_both_arms() {
        // White U: two columns joined at the bottom row, seeded in the left arm
        let mut buf = PixelBuffer::from_fn(7, 6, |x, y| {
            let arm = (x == 1 || x == 5) && y <= 4;
            let base = y == 4 && (1..=5).contains(&x);
            if arm || base { Bgra::WHITE } else { Bgra::BLACK }
        })
        .unwrap();
        let rect = flood_fill(&mut buf, Point::new(1, 0), Bgra::RED).unwrap();
        assert_eq!(rect, Rectangle::new(1, 0, 5, 5));
        assert_eq!(buf.get(5, 0).unwrap(), Bgra::RED);
    }

    #[test]
    fn test_tall_region_does_not_recurse() {
        // A 1-pixel-wide serpentine stresses the task stack, not the call stack
        let (w, h) = (64u32, 4000u32);
        let mut buf = PixelBuffer::from_fn(w, h, |x, y| {
            let open_row = y % 2 == 0;
            let link = if (y / 2) % 2 == 0 { x == w - 1 } else { x == 0 };
            if open_row || link { Bgra::WHITE } else { Bgra::BLACK }
        })
        .unwrap();
        let rect = flood_fill(&mut buf, Point::new(0, 0), Bgra::RED).unwrap();
        assert_eq!(rect, Rectangle::new(0, 0, w, h));
    }

    #[test]
    fn test_span_convention() {
        let mut bounds = BoundingBox::empty();
        assert!(bounds.is_empty());
        assert_eq!(bounds.to_rect(), Rectangle::new(0, 0, 0, 0));

        bounds.add_run(2, 5, 3);
        bounds.add_run(3, 4, 5);
        assert_eq!(bounds.to_rect(), Rectangle::new(2, 3, 4, 3));
        assert_eq!(bounds.to_span_rect(), Rectangle::new(2, 3, 3, 2));
    }

    #[test]
    fn test_grow_region_returns_buffer() {
        let buf = with_block(10, 10, 2..=5, 3..=5);
        let region = grow_region(buf, Point::new(2, 3), Bgra::RED).unwrap();
        assert_eq!(region.bounds.to_rect(), Rectangle::new(2, 3, 4, 3));
        assert_eq!(region.buffer.get(5, 5).unwrap(), Bgra::RED);
    }

    #[test]
    fn test_visited_mask_has_slack() {
        let mut mask = VisitedMask::new(3, 2);
        mask.set(3, 2);
        assert!(mask.is_set(3, 2));
        assert_eq!(mask.count(), 1);
    }
}

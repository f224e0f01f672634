//! Global binarization with Otsu's threshold
//!
//! The binarizer works in three passes over a [`PixelBuffer`]:
//!
//! 1. [`to_grayscale`] replaces R, G and B with the rounded luma
//!    `0.299 R + 0.587 G + 0.114 B` (alpha untouched)
//! 2. [`Histogram::from_buffer`] counts gray levels and [`choose_threshold`]
//!    picks the level with the largest between-class variance
//! 3. [`apply_threshold`] sets every channel above the threshold to 255 and
//!    every other channel to 0
//!
//! [`binarize`] chains the three and hands the buffer back to the caller.

use crate::{
    buffer::PixelBuffer,
    model::{Bgra, ThresholdMode},
};

/// First candidate examined by the threshold search
pub const MIN_CANDIDATE: u8 = 1;

/// Last candidate examined by the threshold search
pub const MAX_CANDIDATE: u8 = 254;

/// Gray-level occurrence counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: [u64; 256],
}

impl Histogram {
    /// Creates an empty histogram
    pub fn new() -> Self {
        Self { counts: [0; 256] }
    }

    /// Counts the red channel of every pixel
    ///
    /// After [`to_grayscale`] all color channels are equal, so any channel
    /// gives the gray level.
    pub fn from_buffer(buffer: &PixelBuffer) -> Self {
        let mut hist = Self::new();
        for px in buffer.pixels() {
            hist.counts[px.r as usize] += 1;
        }
        hist
    }

    /// Adds `n` occurrences of `level`
    pub fn add(&mut self, level: u8, n: u64) {
        self.counts[level as usize] += n;
    }

    pub fn count(&self, level: u8) -> u64 {
        self.counts[level as usize]
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Rounded luma of a pixel
pub fn luma(px: Bgra) -> u8 {
    let gray = 0.299 * f64::from(px.r) + 0.587 * f64::from(px.g) + 0.114 * f64::from(px.b);
    gray.round().clamp(0.0, 255.0) as u8
}

/// Overwrites R, G and B of every pixel with its luma
///
/// Applying this twice gives the same buffer as applying it once.
pub fn to_grayscale(buffer: &mut PixelBuffer) {
    buffer.map_pixels(|px| {
        let gray = luma(px);
        Bgra::new(gray, gray, gray, px.a)
    });
}

/// Between-class separation score for candidate `k`
///
/// The lower class holds the levels below `k`, the upper class the levels
/// above it; level `k` itself belongs to neither. Sums are raw pixel counts;
/// the scale cancels out in comparisons. An empty class gives a zero score.
///
/// Leaving `k` out is what guarantees a threshold strictly between two
/// occupied levels. It also means two adjacent levels such as 100 and 101
/// never score above zero, so the search falls back to 1 and both end up
/// white.
pub fn score(hist: &Histogram, k: u8) -> f64 {
    let k = k as usize;
    let (mut p1, mut m1) = (0i128, 0i128);
    for (i, &n) in hist.counts[..k].iter().enumerate() {
        p1 += i128::from(n);
        m1 += i as i128 * i128::from(n);
    }
    let (mut p2, mut m2) = (0i128, 0i128);
    for (i, &n) in hist.counts.iter().enumerate().skip(k + 1) {
        p2 += i128::from(n);
        m2 += i as i128 * i128::from(n);
    }

    let mut denom = p1 * p2;
    if denom == 0 {
        denom = 1;
    }
    let diff = (m1 * p2 - m2 * p1) as f64;
    diff * diff / denom as f64
}

/// Picks the threshold with the highest [`score`] in `1..=254`
///
/// Ties go to the lowest candidate, so a histogram with a single occupied
/// level (every score zero) yields 1.
pub fn choose_threshold(hist: &Histogram) -> u8 {
    let mut best_k = MIN_CANDIDATE;
    let mut best = score(hist, MIN_CANDIDATE);
    for k in (MIN_CANDIDATE + 1)..=MAX_CANDIDATE {
        let s = score(hist, k);
        if s > best {
            best = s;
            best_k = k;
        }
    }
    best_k
}

/// Sets each of R, G and B to 255 when it exceeds `threshold`, else to 0
pub fn apply_threshold(buffer: &mut PixelBuffer, threshold: u8) {
    let cut = |c: u8| if c > threshold { 255 } else { 0 };
    buffer.map_pixels(|px| Bgra::new(cut(px.b), cut(px.g), cut(px.r), px.a));
}

/// A binarized buffer together with the threshold that produced it
#[derive(Debug, Clone)]
pub struct Binarized {
    pub buffer:    PixelBuffer,
    pub threshold: u8,
}

/// Grayscale, Otsu threshold and black/white conversion
pub fn binarize(buffer: PixelBuffer) -> Binarized {
    binarize_with(buffer, ThresholdMode::Otsu)
}

/// Like [`binarize`], with an explicit threshold mode
pub fn binarize_with(mut buffer: PixelBuffer, mode: ThresholdMode) -> Binarized {
    to_grayscale(&mut buffer);
    let threshold = match mode {
        ThresholdMode::Otsu => choose_threshold(&Histogram::from_buffer(&buffer)),
        ThresholdMode::Fixed(k) => k,
    };
    tracing::debug!(threshold, ?mode, "Applying binarization threshold");
    apply_threshold(&mut buffer, threshold);
    Binarized { buffer, threshold }
}

//! Bounds-checked BGRA8 pixel buffer
//!
//! [`PixelBuffer`] owns a `stride * height` byte grid and is the only place in
//! the crate that turns `(x, y)` into a byte offset. Every other stage reads
//! and writes pixels through [`PixelBuffer::get`], [`PixelBuffer::set`] or the
//! row-wise helpers, so overruns past a row or past the allocation cannot
//! happen.
//!
//! # Examples
//!
//! ```
//! use autoregion_core::{buffer::PixelBuffer, model::Bgra};
//!
//! let mut buf = PixelBuffer::filled(4, 3, Bgra::BLACK).unwrap();
//! buf.set(1, 2, Bgra::WHITE).unwrap();
//! assert_eq!(buf.get(1, 2).unwrap(), Bgra::WHITE);
//! assert!(buf.get(4, 0).is_err());
//! ```

use crate::{
    error::{DetectError, DetectResult},
    model::{Bgra, Point},
};

/// Bytes per BGRA8 pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// A width x height grid of BGRA8 pixels with an explicit row stride
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width:  u32,
    height: u32,
    stride: usize,
    data:   Vec<u8>,
}

impl PixelBuffer {
    /// Wraps raw BGRA8 bytes
    ///
    /// `stride` is the distance in bytes between the starts of two rows and
    /// may include padding. `data` must hold exactly `stride * height` bytes.
    pub fn from_raw(width: u32, height: u32, stride: usize, data: Vec<u8>) -> DetectResult<Self> {
        let row_bytes = Self::check_dimensions(width, height)?;
        if stride < row_bytes {
            return Err(DetectError::InvalidBuffer {
                reason: format!("stride {} is smaller than a row of {} bytes", stride, row_bytes),
            });
        }

        let expected = stride
            .checked_mul(height as usize)
            .ok_or_else(|| DetectError::InvalidBuffer {
                reason: format!("{} rows of {} bytes overflow", height, stride),
            })?;
        if data.len() != expected {
            return Err(DetectError::InvalidBuffer {
                reason: format!(
                    "expected {} bytes ({} x {}), got {}",
                    expected,
                    stride,
                    height,
                    data.len()
                ),
            });
        }

        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    /// Validates dimensions and returns the tight row length in bytes
    fn check_dimensions(width: u32, height: u32) -> DetectResult<usize> {
        if width == 0 || height == 0 {
            return Err(DetectError::InvalidBuffer {
                reason: format!("dimensions must be positive, got {}x{}", width, height),
            });
        }
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(DetectError::InvalidBuffer {
                reason: format!("dimensions {}x{} exceed the coordinate range", width, height),
            });
        }
        (width as usize)
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or_else(|| DetectError::InvalidBuffer {
                reason: format!("row of {} pixels overflows", width),
            })
    }

    /// Creates a tightly packed buffer filled with one color
    ///
    /// Geometry is validated and the allocation reserved fallibly, so an
    /// oversized request is an error rather than an abort.
    pub fn filled(width: u32, height: u32, color: Bgra) -> DetectResult<Self> {
        let stride = Self::check_dimensions(width, height)?;
        let len = stride
            .checked_mul(height as usize)
            .ok_or_else(|| DetectError::InvalidBuffer {
                reason: format!("{} rows of {} bytes overflow", height, stride),
            })?;

        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|e| DetectError::InvalidBuffer {
                reason: format!("cannot allocate {} bytes for {}x{}: {}", len, width, height, e),
            })?;
        for _ in 0..(len / BYTES_PER_PIXEL) {
            data.extend_from_slice(&[color.b, color.g, color.r, color.a]);
        }
        Self::from_raw(width, height, stride, data)
    }

    /// Creates a tightly packed buffer from a per-pixel function
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> DetectResult<Self>
    where
        F: FnMut(u32, u32) -> Bgra,
    {
        let mut buffer = Self::filled(width, height, Bgra::BLACK)?;
        for y in 0..height {
            for x in 0..width {
                let color = f(x, y);
                buffer.write(x, y, color);
            }
        }
        Ok(buffer)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bytes between the starts of consecutive rows
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw bytes, including any row padding
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns true if `(x, y)` addresses a pixel of this buffer
    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Validates a point, returning it as unsigned coordinates
    pub fn check_point(&self, point: Point) -> DetectResult<(u32, u32)> {
        self.check(i64::from(point.x), i64::from(point.y))
    }

    fn check(&self, x: i64, y: i64) -> DetectResult<(u32, u32)> {
        if self.in_bounds(x, y) {
            Ok((x as u32, y as u32))
        } else {
            Err(DetectError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Reads the pixel at `(x, y)`
    pub fn get(&self, x: i64, y: i64) -> DetectResult<Bgra> {
        let (x, y) = self.check(x, y)?;
        Ok(self.read(x, y))
    }

    /// Writes the pixel at `(x, y)`
    pub fn set(&mut self, x: i64, y: i64, color: Bgra) -> DetectResult<()> {
        let (x, y) = self.check(x, y)?;
        self.write(x, y, color);
        Ok(())
    }

    /// Offset of a pixel already known to be in bounds
    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.stride + x as usize * BYTES_PER_PIXEL
    }

    /// Reads a pixel whose coordinates were validated by the caller
    pub(crate) fn read(&self, x: u32, y: u32) -> Bgra {
        let i = self.offset(x, y);
        let px = &self.data[i..i + BYTES_PER_PIXEL];
        Bgra::new(px[0], px[1], px[2], px[3])
    }

    /// Writes a pixel whose coordinates were validated by the caller
    pub(crate) fn write(&mut self, x: u32, y: u32, color: Bgra) {
        let i = self.offset(x, y);
        self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&[color.b, color.g, color.r, color.a]);
    }

    /// Iterates over all pixels in row-major order, skipping row padding
    pub fn pixels(&self) -> impl Iterator<Item = Bgra> + '_ {
        let row_bytes = self.width as usize * BYTES_PER_PIXEL;
        self.data
            .chunks_exact(self.stride)
            .flat_map(move |row| row[..row_bytes].chunks_exact(BYTES_PER_PIXEL))
            .map(|px| Bgra::new(px[0], px[1], px[2], px[3]))
    }

    /// Rewrites every pixel in place
    pub fn map_pixels<F>(&mut self, mut f: F)
    where
        F: FnMut(Bgra) -> Bgra,
    {
        let row_bytes = self.width as usize * BYTES_PER_PIXEL;
        for row in self.data.chunks_exact_mut(self.stride) {
            for px in row[..row_bytes].chunks_exact_mut(BYTES_PER_PIXEL) {
                let out = f(Bgra::new(px[0], px[1], px[2], px[3]));
                px.copy_from_slice(&[out.b, out.g, out.r, out.a]);
            }
        }
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "image-processing")]
impl PixelBuffer {
    /// Converts an RGBA image into a tightly packed BGRA buffer
    pub fn from_rgba_image(image: &image::RgbaImage) -> DetectResult<Self> {
        let (width, height) = image.dimensions();
        let mut data = Vec::with_capacity(image.as_raw().len());
        for px in image.pixels() {
            let [r, g, b, a] = px.0;
            data.extend_from_slice(&[b, g, r, a]);
        }
        Self::from_raw(width, height, width as usize * BYTES_PER_PIXEL, data)
    }

    /// Converts any decoded image into a BGRA buffer
    pub fn from_dynamic_image(image: &image::DynamicImage) -> DetectResult<Self> {
        Self::from_rgba_image(&image.to_rgba8())
    }

    /// Converts the buffer to an RGBA image, dropping row padding
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        let mut out = image::RgbaImage::new(self.width, self.height);
        for (dst, px) in out.pixels_mut().zip(self.pixels()) {
            *dst = image::Rgba([px.r, px.g, px.b, px.a]);
        }
        out
    }
}

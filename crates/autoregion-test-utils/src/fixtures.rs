//! Synthetic window contents
//!
//! Every fixture is a BGRA buffer built from a simple rule, so expected
//! rectangles can be derived from the fixture parameters.

use std::{path::PathBuf, sync::Arc};

use autoregion_core::{
    AutoRegionDetector,
    buffer::PixelBuffer,
    capture::MockWindowSystem,
    model::{Bgra, Rectangle, WindowHandle},
};

/// Handle fixtures are registered under in the mock window system
pub const FIXTURE_HANDLE: WindowHandle = WindowHandle(0x2a);

/// Handle recorded as the foreground window before detection
pub const PREVIOUS_FOREGROUND: WindowHandle = WindowHandle(0x07);

/// Fill color applied to the rectangle in [`FixtureWindow::block`]
pub const BLOCK_COLOR: Bgra = Bgra::WHITE;

/// Background color used by every fixture
pub const BACKGROUND_COLOR: Bgra = Bgra::BLACK;

/// A synthetic window: its pixels plus a mock window system serving them
#[derive(Debug, Clone)]
pub struct FixtureWindow {
    pub pixels: PixelBuffer,
    pub system: MockWindowSystem,
}

impl FixtureWindow {
    /// Wraps `pixels` in a mock system with [`PREVIOUS_FOREGROUND`] active
    pub fn new(pixels: PixelBuffer) -> Self {
        let system = MockWindowSystem::new()
            .with_window(FIXTURE_HANDLE, pixels.clone())
            .with_foreground(PREVIOUS_FOREGROUND);
        Self { pixels, system }
    }

    /// Black background with a white `rect` (inclusive pixel extents)
    pub fn block(width: u32, height: u32, rect: Rectangle) -> Self {
        Self::new(block_buffer(width, height, rect))
    }

    /// A single color everywhere
    pub fn uniform(width: u32, height: u32, color: Bgra) -> Self {
        Self::new(fill(width, height, |_, _| color))
    }

    /// White strictly above the main diagonal, black elsewhere
    pub fn diagonal(size: u32) -> Self {
        Self::new(fill(size, size, |x, y| if x > y { BLOCK_COLOR } else { BACKGROUND_COLOR }))
    }

    /// Detector over this fixture's mock system with default options
    pub fn detector(&self) -> AutoRegionDetector {
        AutoRegionDetector::new(Arc::new(self.system.clone()))
    }

    /// Saves the pixels as PNG into a fresh temporary directory
    ///
    /// The directory lives as long as the returned guard.
    pub fn save_png(&self, name: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().expect("create fixture dir");
        let path = dir.path().join(name);
        self.pixels
            .to_rgba_image()
            .save(&path)
            .expect("write fixture png");
        (dir, path)
    }
}

fn fill<F: FnMut(u32, u32) -> Bgra>(width: u32, height: u32, f: F) -> PixelBuffer {
    PixelBuffer::from_fn(width, height, f).expect("fixture dimensions are valid")
}

/// Black buffer with a white `rect`
pub fn block_buffer(width: u32, height: u32, rect: Rectangle) -> PixelBuffer {
    fill(width, height, |x, y| {
        let inside = x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height;
        if inside { BLOCK_COLOR } else { BACKGROUND_COLOR }
    })
}

/// White one-pixel path snaking down the buffer, black walls in between
///
/// Rows at even y are open across the full width; odd rows are open only at
/// alternating ends, which forces the fill through every row.
pub fn serpentine_buffer(width: u32, height: u32) -> PixelBuffer {
    fill(width, height, |x, y| {
        let open = if y % 2 == 0 {
            true
        } else if (y / 2) % 2 == 0 {
            x == width - 1
        } else {
            x == 0
        };
        if open { BLOCK_COLOR } else { BACKGROUND_COLOR }
    })
}

/// Noisy gray capture with two well separated modes around 40 and 200
///
/// Pixels inside `rect` sit in the bright mode.
pub fn two_mode_capture(width: u32, height: u32, rect: Rectangle) -> PixelBuffer {
    fill(width, height, |x, y| {
        let jitter = ((x * 31 + y * 17) % 9) as u8;
        let inside = x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height;
        let level = if inside { 196 + jitter } else { 36 + jitter };
        Bgra::opaque(level, level, level)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_buffer_extents() {
        let buf = block_buffer(6, 6, Rectangle::new(1, 2, 3, 2));
        assert_eq!(buf.get(1, 2).unwrap(), BLOCK_COLOR);
        assert_eq!(buf.get(3, 3).unwrap(), BLOCK_COLOR);
        assert_eq!(buf.get(4, 3).unwrap(), BACKGROUND_COLOR);
        assert_eq!(buf.get(1, 4).unwrap(), BACKGROUND_COLOR);
    }

    #[test]
    fn test_serpentine_rows() {
        let buf = serpentine_buffer(5, 4);
        assert_eq!(buf.get(4, 1).unwrap(), BLOCK_COLOR);
        assert_eq!(buf.get(0, 1).unwrap(), BACKGROUND_COLOR);
        assert_eq!(buf.get(0, 3).unwrap(), BLOCK_COLOR);
    }

    #[test]
    fn test_fixture_png_roundtrip() {
        let fixture = FixtureWindow::uniform(3, 2, Bgra::RED);
        let (_dir, path) = fixture.save_png("uniform.png");
        assert!(path.exists());
    }
}

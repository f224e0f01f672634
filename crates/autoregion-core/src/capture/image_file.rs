//! Image file standing in for a window
//!
//! Lets the detector run against a saved screenshot: the decoded file is the
//! only window, reachable as [`ImageFileWindow::HANDLE`]. Foreground calls are
//! accepted and ignored because there is no window to raise.

use std::path::{Path, PathBuf};

use super::{ForegroundControl, WindowCapture};
use crate::{
    buffer::PixelBuffer,
    error::{CaptureError, CaptureResult, DetectError, DetectResult},
    model::{BackendType, WindowHandle},
};

/// A decoded image file exposed as a single window
#[derive(Debug, Clone)]
pub struct ImageFileWindow {
    path:   PathBuf,
    pixels: PixelBuffer,
}

impl ImageFileWindow {
    /// Handle under which the image is exposed
    pub const HANDLE: WindowHandle = WindowHandle(1);

    /// Decodes `path` (PNG, JPEG or WebP)
    pub fn open(path: impl AsRef<Path>) -> DetectResult<Self> {
        let path = path.as_ref().to_path_buf();
        let decoded = image::open(&path).map_err(|e| match e {
            image::ImageError::IoError(io) => DetectError::Io(io),
            other => DetectError::Image(format!("{}: {}", path.display(), other)),
        })?;
        let pixels = PixelBuffer::from_dynamic_image(&decoded)?;
        tracing::info!(
            "Loaded {} ({}x{})",
            path.display(),
            pixels.width(),
            pixels.height()
        );
        Ok(Self { path, pixels })
    }

    /// Wraps an already decoded buffer
    pub fn from_buffer(pixels: PixelBuffer) -> Self {
        Self {
            path: PathBuf::new(),
            pixels,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WindowCapture for ImageFileWindow {
    fn capture_window_pixels(&self, handle: WindowHandle) -> CaptureResult<PixelBuffer> {
        if handle != Self::HANDLE {
            return Err(CaptureError::InvalidHandle { handle });
        }
        Ok(self.pixels.clone())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::ImageFile
    }
}

impl ForegroundControl for ImageFileWindow {
    fn foreground_window(&self) -> Option<WindowHandle> {
        Some(Self::HANDLE)
    }

    fn set_foreground_window(&self, _handle: WindowHandle) -> bool {
        true
    }
}

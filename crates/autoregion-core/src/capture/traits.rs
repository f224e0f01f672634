//! Window-system collaborator traits
//!
//! The detector never talks to the platform directly. It is handed an
//! implementation of these traits by the embedding application:
//!
//! - [`WindowCapture`]: produce BGRA pixels for a window's screen rectangle
//! - [`ForegroundControl`]: read and change the foreground window, so the
//!   target can be brought forward for an unoccluded capture and the
//!   previous window restored afterwards
//! - [`WindowSystem`]: both of the above, implemented automatically

use crate::{
    buffer::PixelBuffer,
    error::CaptureResult,
    model::{BackendType, WindowHandle},
};

/// Capability: backend can capture the on-screen pixels of a window.
pub trait WindowCapture: Send + Sync {
    /// Captures the window's current screen rectangle.
    ///
    /// Fails with [`CaptureError::InvalidHandle`](crate::error::CaptureError),
    /// [`CaptureError::Minimized`](crate::error::CaptureError) or
    /// [`CaptureError::EmptyCapture`](crate::error::CaptureError) when there
    /// is nothing to capture.
    fn capture_window_pixels(&self, handle: WindowHandle) -> CaptureResult<PixelBuffer>;

    /// Backend identification for diagnostics.
    fn backend_type(&self) -> BackendType;
}

/// Capability: backend can query and change the foreground window.
pub trait ForegroundControl: Send + Sync {
    /// Returns the current foreground window, if any.
    fn foreground_window(&self) -> Option<WindowHandle>;

    /// Requests that `handle` become the foreground window.
    ///
    /// Returns false when the window system refused the request. Callers
    /// treat this as best-effort.
    fn set_foreground_window(&self, handle: WindowHandle) -> bool;
}

/// A complete window-system collaborator.
pub trait WindowSystem: WindowCapture + ForegroundControl {}

impl<T: WindowCapture + ForegroundControl> WindowSystem for T {}

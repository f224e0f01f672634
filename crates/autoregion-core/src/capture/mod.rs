//! Window-system backends
//!
//! The detector depends only on the [`WindowSystem`] trait pair. Backends:
//!
//! | Backend | Capture | Foreground control |
//! |---------|---------|--------------------|
//! | Windows | GDI `BitBlt` of the window rectangle | `Get/SetForegroundWindow` |
//! | X11     | xcap window capture | EWMH `_NET_ACTIVE_WINDOW` |
//! | Image file | decoded file as window `1` | no-op |
//! | Mock    | registered buffers | recorded history |
//!
//! Use [`create_default_backend()`] to get the backend for the current
//! platform.

use std::sync::Arc;

use crate::error::CaptureResult;

pub mod mock;
pub mod traits;

#[cfg(feature = "image-processing")]
pub mod image_file;

#[cfg(target_os = "windows")]
pub mod windows_backend;

#[cfg(all(target_os = "linux", feature = "linux-x11"))]
pub mod x11_backend;

#[cfg(feature = "image-processing")]
pub use image_file::ImageFileWindow;
pub use mock::MockWindowSystem;
pub use traits::{ForegroundControl, WindowCapture, WindowSystem};
#[cfg(target_os = "windows")]
pub use windows_backend::WindowsBackend;
#[cfg(all(target_os = "linux", feature = "linux-x11"))]
pub use x11_backend::X11Backend;

/// Creates the window-system backend for the current platform.
///
/// - **Windows**: [`WindowsBackend`]
/// - **Linux** with the `linux-x11` feature: [`X11Backend`]
/// - **Anything else**: a structured `BackendNotAvailable` error
pub fn create_default_backend() -> CaptureResult<Arc<dyn WindowSystem>> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(WindowsBackend::new()?))
    }

    #[cfg(all(target_os = "linux", feature = "linux-x11"))]
    {
        Ok(Arc::new(X11Backend::new()?))
    }

    #[cfg(not(any(target_os = "windows", all(target_os = "linux", feature = "linux-x11"))))]
    {
        tracing::warn!("No window-system backend compiled in for this platform");
        Err(crate::error::CaptureError::BackendNotAvailable {
            backend: crate::model::BackendType::None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(any(target_os = "windows", all(target_os = "linux", feature = "linux-x11"))))]
    fn test_default_backend_unavailable() {
        use crate::error::CaptureError;

        let result = create_default_backend();
        assert!(matches!(result, Err(CaptureError::BackendNotAvailable { .. })));
    }

    #[test]
    fn test_mock_is_a_window_system() {
        let system: Arc<dyn WindowSystem> = Arc::new(MockWindowSystem::new());
        assert_eq!(system.backend_type(), crate::model::BackendType::Mock);
        assert_eq!(system.foreground_window(), None);
    }
}

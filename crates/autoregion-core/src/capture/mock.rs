//! Mock window system for testing
//!
//! This module provides a `MockWindowSystem` implementation of the
//! [`WindowCapture`] and [`ForegroundControl`] traits. Windows are in-memory
//! pixel buffers keyed by handle; foreground changes are recorded so tests can
//! check that the previous window was restored.
//!
//! # Features
//!
//! - **Registered Windows:** any buffer can be registered under a handle
//! - **Minimized Windows:** registered windows can be flagged minimized
//! - **Foreground History:** every `set_foreground_window` call is recorded
//! - **Error Injection:** inject a capture error to test failure paths
//!
//! # Examples
//!
//! ```
//! use autoregion_core::{
//!     buffer::PixelBuffer,
//!     capture::{ForegroundControl, MockWindowSystem, WindowCapture},
//!     model::{Bgra, WindowHandle},
//! };
//!
//! let system = MockWindowSystem::new()
//!     .with_window(WindowHandle(7), PixelBuffer::filled(4, 4, Bgra::WHITE).unwrap())
//!     .with_foreground(WindowHandle(1));
//!
//! let pixels = system.capture_window_pixels(WindowHandle(7)).unwrap();
//! assert_eq!(pixels.dimensions(), (4, 4));
//! assert_eq!(system.foreground_window(), Some(WindowHandle(1)));
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use super::{ForegroundControl, WindowCapture};
use crate::{
    buffer::PixelBuffer,
    error::{CaptureError, CaptureResult},
    model::{BackendType, WindowHandle},
};

#[derive(Debug, Clone)]
struct MockWindow {
    pixels:    PixelBuffer,
    minimized: bool,
}

#[derive(Debug, Default)]
struct ForegroundState {
    current: Option<WindowHandle>,
    history: Vec<WindowHandle>,
}

/// Mock window system for testing and development
///
/// # Thread Safety
///
/// `MockWindowSystem` is thread-safe and can be shared across threads using
/// `Arc`. Foreground state sits behind a mutex.
#[derive(Debug, Clone, Default)]
pub struct MockWindowSystem {
    windows:         HashMap<WindowHandle, MockWindow>,
    foreground:      Arc<Mutex<ForegroundState>>,
    error_injection: Option<CaptureError>,
}

impl MockWindowSystem {
    /// Creates an empty mock window system
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a visible window
    pub fn with_window(mut self, handle: WindowHandle, pixels: PixelBuffer) -> Self {
        self.windows.insert(
            handle,
            MockWindow {
                pixels,
                minimized: false,
            },
        );
        self
    }

    /// Registers a minimized window
    pub fn with_minimized_window(mut self, handle: WindowHandle, pixels: PixelBuffer) -> Self {
        self.windows.insert(
            handle,
            MockWindow {
                pixels,
                minimized: true,
            },
        );
        self
    }

    /// Sets the initial foreground window without recording history
    pub fn with_foreground(self, handle: WindowHandle) -> Self {
        if let Ok(mut state) = self.foreground.lock() {
            state.current = Some(handle);
        }
        self
    }

    /// Injects an error that every capture will return
    pub fn with_error(mut self, error: CaptureError) -> Self {
        self.error_injection = Some(error);
        self
    }

    /// Handles passed to `set_foreground_window`, oldest first
    pub fn foreground_history(&self) -> Vec<WindowHandle> {
        self.foreground
            .lock()
            .map(|state| state.history.clone())
            .unwrap_or_default()
    }
}

impl WindowCapture for MockWindowSystem {
    fn capture_window_pixels(&self, handle: WindowHandle) -> CaptureResult<PixelBuffer> {
        if let Some(ref error) = self.error_injection {
            return Err(error.clone());
        }

        let window = self
            .windows
            .get(&handle)
            .ok_or(CaptureError::InvalidHandle { handle })?;
        if window.minimized {
            return Err(CaptureError::Minimized { handle });
        }

        tracing::debug!("Mock capture of window {}", handle);
        Ok(window.pixels.clone())
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Mock
    }
}

impl ForegroundControl for MockWindowSystem {
    fn foreground_window(&self) -> Option<WindowHandle> {
        self.foreground.lock().ok().and_then(|state| state.current)
    }

    fn set_foreground_window(&self, handle: WindowHandle) -> bool {
        match self.foreground.lock() {
            Ok(mut state) => {
                state.history.push(handle);
                state.current = Some(handle);
                true
            }
            Err(_) => false,
        }
    }
}

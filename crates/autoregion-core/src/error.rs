//! Error types for region detection
//!
//! Two layers of errors exist:
//!
//! - [`CaptureError`] - failures reported by the window-system collaborator
//!   (invalid handle, minimized window, empty capture, missing backend)
//! - [`DetectError`] - failures of the detection pipeline itself, wrapping
//!   capture failures and adding seed/buffer validation and cancellation
//!
//! Every error carries a human-readable remediation hint and a coarse
//! [`ErrorCategory`] so an embedding application can decide on its fallback
//! (typically: treat the whole captured window as the region).

use serde::{Deserialize, Serialize};

use crate::model::{BackendType, WindowHandle};

/// Result type alias for window-system operations
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Result type alias for detection operations
pub type DetectResult<T> = Result<T, DetectError>;

/// High-level error category for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Target window not found or unusable
    NotFound,
    /// Invalid parameters (seed point, buffer geometry)
    InvalidInput,
    /// Backend or platform not available
    Unavailable,
    /// Operation was cancelled by the caller
    Cancelled,
    /// I/O or system error
    SystemError,
    /// Image decoding or processing error
    ProcessingError,
}

/// Errors reported by a capture backend
#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureError {
    /// The handle does not name a live window
    #[error("Window {handle} is not a valid window")]
    InvalidHandle {
        /// The rejected handle
        handle: WindowHandle,
    },

    /// The window is minimized and has no on-screen pixels
    #[error("Window {handle} is minimized")]
    Minimized {
        /// The minimized window
        handle: WindowHandle,
    },

    /// Capture succeeded but produced no pixels
    #[error("Capture of window {handle} returned no pixels ({width}x{height})")]
    EmptyCapture {
        /// The captured window
        handle: WindowHandle,
        /// Reported width
        width:  u32,
        /// Reported height
        height: u32,
    },

    /// Requested backend is not available
    #[error("Backend {backend} is not available on this platform")]
    BackendNotAvailable {
        /// Backend type that's unavailable
        backend: BackendType,
    },

    /// A platform call failed
    #[error("Platform call {operation} failed: {reason}")]
    Platform {
        /// Name of the failing call
        operation: String,
        /// Reason reported by the platform
        reason:    String,
    },
}

impl CaptureError {
    /// Returns an actionable remediation hint for this error
    pub fn remediation_hint(&self) -> &str {
        match self {
            CaptureError::InvalidHandle { .. } => {
                "The window handle is stale or was never valid. Pick the target window again \
                 before running detection."
            }
            CaptureError::Minimized { .. } => {
                "Restore the target window before detection. A minimized window has no on-screen \
                 pixels to analyse."
            }
            CaptureError::EmptyCapture { .. } => {
                "The window reported a zero-sized area. Make sure it is visible on screen and not \
                 collapsed."
            }
            CaptureError::BackendNotAvailable { backend } => match backend {
                BackendType::X11 => {
                    "X11 backend not available. Ensure DISPLAY is set and build with the \
                     linux-x11 feature."
                }
                BackendType::Windows => "Windows backend only available on Windows OS.",
                BackendType::ImageFile => "The image file could not be opened as a window.",
                BackendType::Mock | BackendType::None => {
                    "No window capture backend available on this platform. Use an image file \
                     as input instead."
                }
            },
            CaptureError::Platform { .. } => {
                "A window-system call failed. Retry once the target window is idle."
            }
        }
    }

    /// Returns the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            CaptureError::InvalidHandle { .. }
            | CaptureError::Minimized { .. }
            | CaptureError::EmptyCapture { .. } => ErrorCategory::NotFound,
            CaptureError::BackendNotAvailable { .. } => ErrorCategory::Unavailable,
            CaptureError::Platform { .. } => ErrorCategory::SystemError,
        }
    }
}

/// Errors produced by the detection pipeline
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// Window capture failed; no processing was performed
    #[error("Capture failed: {0}")]
    Capture(#[from] CaptureError),

    /// A coordinate lies outside the buffer
    #[error("Point ({x}, {y}) is outside the {width}x{height} buffer")]
    OutOfBounds {
        /// Requested column
        x:      i64,
        /// Requested row
        y:      i64,
        /// Buffer width
        width:  u32,
        /// Buffer height
        height: u32,
    },

    /// Buffer geometry is unusable
    #[error("Invalid pixel buffer: {reason}")]
    InvalidBuffer {
        /// What is wrong with the geometry
        reason: String,
    },

    /// The caller cancelled the detection
    #[error("Detection cancelled before {stage}")]
    Cancelled {
        /// Stage that did not run
        stage: &'static str,
    },

    /// The blocking worker running the pipeline panicked or was aborted
    #[error("Detection worker failed: {reason}")]
    Worker {
        /// Join failure reported by the runtime
        reason: String,
    },

    /// Image decoding or encoding failed
    #[error("Image processing error: {0}")]
    Image(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DetectError {
    /// Returns an actionable remediation hint for this error
    ///
    /// # Examples
    ///
    /// ```
    /// use autoregion_core::error::DetectError;
    ///
    /// let error = DetectError::OutOfBounds { x: 10, y: 0, width: 10, height: 10 };
    /// assert!(error.remediation_hint().contains("inside"));
    /// ```
    pub fn remediation_hint(&self) -> &str {
        match self {
            DetectError::Capture(inner) => inner.remediation_hint(),
            DetectError::OutOfBounds { .. } => {
                "The seed point must lie inside the captured window. Click inside the window \
                 content area and retry."
            }
            DetectError::InvalidBuffer { .. } => {
                "The pixel buffer geometry is inconsistent. Width and height must be positive \
                 and the stride must hold a full row of BGRA pixels."
            }
            DetectError::Cancelled { .. } => "Detection was cancelled. Start it again if needed.",
            DetectError::Worker { .. } => {
                "The detection worker stopped unexpectedly. Check the log for a panic from a \
                 diagnostic hook or capture backend."
            }
            DetectError::Image(_) => {
                "Image processing failed. Ensure the input is a readable PNG, JPEG or WebP file."
            }
            DetectError::Io(_) => {
                "An I/O error occurred. Check file paths, permissions, and disk space."
            }
        }
    }

    /// Returns the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            DetectError::Capture(inner) => inner.category(),
            DetectError::OutOfBounds { .. } | DetectError::InvalidBuffer { .. } => {
                ErrorCategory::InvalidInput
            }
            DetectError::Cancelled { .. } => ErrorCategory::Cancelled,
            DetectError::Worker { .. } => ErrorCategory::SystemError,
            DetectError::Image(_) => ErrorCategory::ProcessingError,
            DetectError::Io(_) => ErrorCategory::SystemError,
        }
    }

    /// Whether retrying the same call may succeed
    ///
    /// Only platform hiccups and I/O failures are considered transient;
    /// seed and geometry errors will fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DetectError::Capture(CaptureError::Platform { .. }) | DetectError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_bounds_display() {
        let err = DetectError::OutOfBounds {
            x:      -1,
            y:      0,
            width:  10,
            height: 10,
        };
        assert_eq!(err.to_string(), "Point (-1, 0) is outside the 10x10 buffer");
        assert_eq!(err.category(), ErrorCategory::InvalidInput);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_capture_error_converts() {
        let err: DetectError = CaptureError::Minimized {
            handle: WindowHandle(0x42),
        }
        .into();
        assert!(matches!(err, DetectError::Capture(CaptureError::Minimized { .. })));
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.remediation_hint().contains("Restore"));
    }

    #[test]
    fn test_platform_errors_are_transient() {
        let err: DetectError = CaptureError::Platform {
            operation: "BitBlt".to_string(),
            reason:    "access denied".to_string(),
        }
        .into();
        assert!(err.is_transient());
        assert_eq!(err.category(), ErrorCategory::SystemError);
    }

    #[test]
    fn test_cancelled_message() {
        let err = DetectError::Cancelled { stage: "binarize" };
        assert_eq!(err.to_string(), "Detection cancelled before binarize");
        assert_eq!(err.category(), ErrorCategory::Cancelled);
    }

    #[test]
    fn test_worker_failure_is_not_cancellation() {
        let err = DetectError::Worker {
            reason: "task 3 panicked".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::SystemError);
        assert!(!err.is_transient());
        assert!(err.remediation_hint().contains("panic"));
    }

    #[test]
    fn test_backend_hint_per_backend() {
        let x11 = CaptureError::BackendNotAvailable {
            backend: BackendType::X11,
        };
        assert!(x11.remediation_hint().contains("linux-x11"));

        let none = CaptureError::BackendNotAvailable {
            backend: BackendType::None,
        };
        assert!(none.remediation_hint().contains("image file"));
    }

    #[test]
    fn test_category_serialization() {
        assert_eq!(
            serde_json::to_string(&ErrorCategory::InvalidInput).unwrap(),
            r#""invalid_input""#
        );
        assert_eq!(serde_json::to_string(&ErrorCategory::NotFound).unwrap(), r#""not_found""#);
    }
}

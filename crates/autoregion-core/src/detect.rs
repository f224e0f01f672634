//! Region detection pipeline
//!
//! [`AutoRegionDetector`] turns a window handle and a click position into the
//! rectangle of the uniform region under the click:
//!
//! 1. remember the foreground window and raise the target
//! 2. capture the target's pixels
//! 3. restore the previous foreground window (always, also on failure)
//! 4. check the seed lies inside the capture
//! 5. binarize
//! 6. flood fill from the seed and return the bounding rectangle
//!
//! The pipeline is synchronous and owns its buffer for the whole call.
//! [`AutoRegionDetector::detect_async`] moves it onto tokio's blocking pool for
//! callers running an event loop.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use autoregion_core::{
//!     buffer::PixelBuffer,
//!     capture::MockWindowSystem,
//!     detect::AutoRegionDetector,
//!     model::{Bgra, Point, Rectangle, WindowHandle},
//! };
//!
//! let window = PixelBuffer::from_fn(10, 10, |x, y| {
//!     if (2..=5).contains(&x) && (3..=5).contains(&y) { Bgra::WHITE } else { Bgra::BLACK }
//! })
//! .unwrap();
//! let system = MockWindowSystem::new().with_window(WindowHandle(42), window);
//!
//! let detector = AutoRegionDetector::new(Arc::new(system));
//! let rect = detector.detect(WindowHandle(42), Point::new(3, 4)).unwrap();
//! assert_eq!(rect, Rectangle::new(2, 3, 4, 3));
//! ```

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use serde::{Deserialize, Serialize};

use crate::{
    buffer::PixelBuffer,
    capture::{ForegroundControl, WindowCapture, WindowSystem},
    diagnostics::{DiagnosticHook, DiagnosticStage, mark_seed},
    error::{DetectError, DetectResult},
    flood_fill::{BoundingBox, grow_region},
    model::{BackendType, DetectOptions, Point, Rectangle, WindowHandle},
    otsu::binarize_with,
};

/// Cooperative cancellation shared between a caller and running detections
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; detections stop at their next stage boundary
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clears the flag so the detector can be reused
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Full result of a detection run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionReport {
    /// Rectangle under the configured convention
    pub rect:        Rectangle,
    /// Raw min/max coordinates of the filled region
    pub bounds:      BoundingBox,
    /// Threshold used for binarization
    pub threshold:   u8,
    /// Captured buffer size as (width, height)
    pub buffer_size: (u32, u32),
    pub seed:        Point,
}

/// Restores the recorded foreground window when dropped
struct ForegroundGuard<'a> {
    system:   &'a dyn WindowSystem,
    previous: Option<WindowHandle>,
}

impl<'a> ForegroundGuard<'a> {
    /// Records the current foreground window, then raises `target`
    fn raise(system: &'a dyn WindowSystem, target: WindowHandle) -> Self {
        let previous = system.foreground_window();
        if !system.set_foreground_window(target) {
            tracing::warn!("Window system refused to raise window {}", target);
        }
        Self { system, previous }
    }
}

impl Drop for ForegroundGuard<'_> {
    fn drop(&mut self) {
        match self.previous {
            Some(previous) => {
                if !self.system.set_foreground_window(previous) {
                    tracing::warn!("Failed to restore foreground window {}", previous);
                }
            }
            None => tracing::debug!("No previous foreground window to restore"),
        }
    }
}

/// Detects the region under a point inside a window
#[derive(Clone)]
pub struct AutoRegionDetector {
    system:  Arc<dyn WindowSystem>,
    options: DetectOptions,
    hook:    Option<Arc<dyn DiagnosticHook>>,
    cancel:  Option<CancelFlag>,
}

impl fmt::Debug for AutoRegionDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoRegionDetector")
            .field("backend", &self.system.backend_type())
            .field("options", &self.options)
            .field("hook", &self.hook.is_some())
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl AutoRegionDetector {
    /// Creates a detector with default options and no diagnostics
    pub fn new(system: Arc<dyn WindowSystem>) -> Self {
        Self {
            system,
            options: DetectOptions::default(),
            hook: None,
            cancel: None,
        }
    }

    pub fn with_options(mut self, options: DetectOptions) -> Self {
        self.options = options;
        self
    }

    /// Installs a hook that sees the buffer after each stage
    pub fn with_hook(mut self, hook: Arc<dyn DiagnosticHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn options(&self) -> &DetectOptions {
        &self.options
    }

    pub fn backend_type(&self) -> BackendType {
        self.system.backend_type()
    }

    /// Returns the rectangle of the region containing `seed`
    ///
    /// `seed` is in window-relative pixel coordinates. The previous
    /// foreground window is restored whether or not capture succeeds.
    pub fn detect(&self, window: WindowHandle, seed: Point) -> DetectResult<Rectangle> {
        self.detect_report(window, seed).map(|report| report.rect)
    }

    /// Like [`detect`](Self::detect), with threshold and raw bounds
    pub fn detect_report(&self, window: WindowHandle, seed: Point) -> DetectResult<DetectionReport> {
        tracing::info!("Detecting region in window {} at ({}, {})", window, seed.x, seed.y);
        self.check_cancelled("capture")?;
        let captured = self.capture(window)?;
        self.detect_in_buffer(captured, seed)
    }

    /// Runs [`detect`](Self::detect) on tokio's blocking pool
    ///
    /// A panicked or aborted worker surfaces as [`DetectError::Worker`].
    pub async fn detect_async(&self, window: WindowHandle, seed: Point) -> DetectResult<Rectangle> {
        let detector = self.clone();
        tokio::task::spawn_blocking(move || detector.detect(window, seed))
            .await
            .map_err(|e| {
                tracing::error!("Detection task failed: {}", e);
                DetectError::Worker {
                    reason: e.to_string(),
                }
            })?
    }

    /// Captures `window` with the foreground swap around the capture call
    fn capture(&self, window: WindowHandle) -> DetectResult<PixelBuffer> {
        let started = Instant::now();
        let captured = {
            let _guard = ForegroundGuard::raise(self.system.as_ref(), window);
            self.system.capture_window_pixels(window)
        }?;
        tracing::debug!(
            width = captured.width(),
            height = captured.height(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Captured window {}",
            window
        );
        Ok(captured)
    }

    /// Runs the pipeline on an already captured buffer
    ///
    /// Fails with `OutOfBounds` before any processing when `seed` lies
    /// outside `buffer`.
    pub fn detect_in_buffer(&self, buffer: PixelBuffer, seed: Point) -> DetectResult<DetectionReport> {
        self.emit(DiagnosticStage::Captured, || mark_seed(&buffer, seed));
        buffer.check_point(seed)?;
        let buffer_size = buffer.dimensions();

        self.check_cancelled("binarize")?;
        let started = Instant::now();
        let binarized = binarize_with(buffer, self.options.threshold);
        tracing::debug!(
            threshold = binarized.threshold,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Binarized capture"
        );
        self.emit(DiagnosticStage::Binarized, || binarized.buffer.clone());

        self.check_cancelled("flood fill")?;
        let started = Instant::now();
        let region = grow_region(binarized.buffer, seed, self.options.fill_color)?;
        self.emit(DiagnosticStage::Filled, || region.buffer.clone());

        let rect = region.bounds.rect_with(self.options.rect_convention);
        tracing::info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Detected region {}",
            rect
        );
        Ok(DetectionReport {
            rect,
            bounds: region.bounds,
            threshold: binarized.threshold,
            buffer_size,
            seed,
        })
    }

    fn check_cancelled(&self, stage: &'static str) -> DetectResult<()> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => {
                tracing::info!("Detection cancelled before {}", stage);
                Err(DetectError::Cancelled { stage })
            }
            _ => Ok(()),
        }
    }

    /// Hands a snapshot to the hook; the snapshot is only built when one is
    /// installed
    fn emit(&self, stage: DiagnosticStage, snapshot: impl FnOnce() -> PixelBuffer) {
        if let Some(hook) = &self.hook {
            hook.on_stage(stage, &snapshot());
        }
    }
}

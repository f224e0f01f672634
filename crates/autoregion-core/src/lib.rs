//! autoregion-core: automatic region detection inside captured windows
//!
//! Given a window and a point inside it, the detector captures the window,
//! binarizes the capture with Otsu's threshold and flood fills from the
//! point. The bounding rectangle of the filled region is the result,
//! typically used to pre-populate a crop selector.
//!
//! Platform access is behind the [`capture::WindowSystem`] traits so the
//! pipeline can run against the Windows or X11 backend, an image file, or a
//! mock.

pub mod buffer;
pub mod capture;
pub mod constants;
pub mod detect;
pub mod diagnostics;
pub mod error;
pub mod flood_fill;
pub mod model;
pub mod otsu;

pub use detect::{AutoRegionDetector, CancelFlag, DetectionReport};
pub use error::{CaptureError, DetectError, DetectResult};
pub use model::{Bgra, DetectOptions, Point, Rectangle, WindowHandle};

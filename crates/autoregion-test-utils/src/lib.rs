//! Test utilities for autoregion integration tests
//!
//! # Usage
//!
//! Add to your crate's dev-dependencies:
//!
//! ```toml
//! [dev-dependencies]
//! autoregion-test-utils = { path = "../autoregion-test-utils" }
//! ```
//!
//! # Modules
//!
//! - [`fixtures`]: synthetic window contents and a ready-made mock window system
//! - [`timing`]: timing helpers for performance assertions
//!
//! # Example
//!
//! ```
//! use autoregion_core::model::{Point, Rectangle};
//! use autoregion_test_utils::fixtures::{self, FixtureWindow};
//!
//! let fixture = FixtureWindow::block(10, 10, Rectangle::new(2, 3, 4, 3));
//! let detector = fixture.detector();
//! let rect = detector.detect(fixtures::FIXTURE_HANDLE, Point::new(3, 4)).unwrap();
//! assert_eq!(rect, Rectangle::new(2, 3, 4, 3));
//! ```

pub mod fixtures;
pub mod timing;

pub use fixtures::{FIXTURE_HANDLE, FixtureWindow};
pub use timing::{assert_duration_below, measure_sync};

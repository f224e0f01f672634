//! End-to-end detection tests over the mock window system
//!
//! These exercise the full pipeline (foreground swap, capture, binarize,
//! flood fill) with synthetic windows from `autoregion-test-utils`.

use std::sync::{Arc, Mutex};

use autoregion_core::{
    AutoRegionDetector, CancelFlag,
    buffer::PixelBuffer,
    capture::{ForegroundControl, ImageFileWindow, MockWindowSystem},
    diagnostics::{DiagnosticStage, PngDumpHook},
    error::{CaptureError, DetectError},
    model::{Bgra, DetectOptions, Point, RectConvention, Rectangle, ThresholdMode, WindowHandle},
};
use autoregion_test_utils::{
    FIXTURE_HANDLE, FixtureWindow,
    fixtures::{self, PREVIOUS_FOREGROUND},
    timing::{assert_duration_below, measure_sync},
};

#[test]
fn test_block_region_detected() {
    let fixture = FixtureWindow::block(10, 10, Rectangle::new(2, 3, 4, 3));
    let rect = fixture
        .detector()
        .detect(FIXTURE_HANDLE, Point::new(3, 4))
        .unwrap();
    assert_eq!(rect, Rectangle::new(2, 3, 4, 3));
    assert_eq!(fixture.system.foreground_window(), Some(PREVIOUS_FOREGROUND));
}

#[test]
fn test_rectangle_contains_seed() {
    let fixture = FixtureWindow::block(40, 30, Rectangle::new(5, 6, 20, 10));
    let detector = fixture.detector();
    for seed in [Point::new(5, 6), Point::new(24, 15), Point::new(0, 0), Point::new(39, 29)] {
        let rect = detector.detect(FIXTURE_HANDLE, seed).unwrap();
        assert!(rect.contains(seed), "{} does not contain {:?}", rect, seed);
    }
}

#[test]
fn test_background_seed_covers_window() {
    let fixture = FixtureWindow::block(10, 10, Rectangle::new(2, 3, 4, 3));
    let rect = fixture
        .detector()
        .detect(FIXTURE_HANDLE, Point::new(0, 0))
        .unwrap();
    assert_eq!(rect, Rectangle::new(0, 0, 10, 10));
}

#[test]
fn test_uniform_window_is_full_rectangle() {
    let fixture = FixtureWindow::uniform(17, 9, Bgra::opaque(90, 90, 90));
    let rect = fixture
        .detector()
        .detect(FIXTURE_HANDLE, Point::new(8, 4))
        .unwrap();
    assert_eq!(rect, Rectangle::new(0, 0, 17, 9));
}

#[test]
fn test_diagonal_is_not_crossed() {
    let fixture = FixtureWindow::diagonal(8);
    let detector = fixture.detector();

    // Strict upper triangle: x in 1..=7, y in 0..=6
    let upper = detector.detect(FIXTURE_HANDLE, Point::new(7, 0)).unwrap();
    assert_eq!(upper, Rectangle::new(1, 0, 7, 7));

    let lower = detector.detect(FIXTURE_HANDLE, Point::new(0, 7)).unwrap();
    assert_eq!(lower, Rectangle::new(0, 0, 8, 8));
}

#[test]
fn test_noisy_capture_is_separated() {
    let rect = Rectangle::new(12, 8, 30, 14);
    let fixture = FixtureWindow::new(fixtures::two_mode_capture(64, 32, rect));
    let report = fixture
        .detector()
        .detect_report(FIXTURE_HANDLE, Point::new(20, 10))
        .unwrap();
    assert_eq!(report.rect, rect);
    assert!(report.threshold > 44 && report.threshold < 196);
}

#[test]
fn test_span_convention() {
    let fixture = FixtureWindow::block(10, 10, Rectangle::new(2, 3, 4, 3));
    let detector = fixture.detector().with_options(
        DetectOptions::builder()
            .rect_convention(RectConvention::Span)
            .build(),
    );
    let rect = detector.detect(FIXTURE_HANDLE, Point::new(3, 4)).unwrap();
    assert_eq!(rect, Rectangle::new(2, 3, 3, 2));
}

#[test]
fn test_fixed_threshold_merges_regions() {
    // Two gray levels that Otsu separates but a high fixed threshold merges
    let pixels = PixelBuffer::from_fn(6, 6, |x, _| {
        if x < 3 { Bgra::opaque(60, 60, 60) } else { Bgra::opaque(120, 120, 120) }
    })
    .unwrap();
    let fixture = FixtureWindow::new(pixels);

    let otsu = fixture.detector().detect(FIXTURE_HANDLE, Point::new(0, 0)).unwrap();
    assert_eq!(otsu, Rectangle::new(0, 0, 3, 6));

    let fixed = fixture
        .detector()
        .with_options(DetectOptions::builder().threshold(ThresholdMode::Fixed(200)).build())
        .detect(FIXTURE_HANDLE, Point::new(0, 0))
        .unwrap();
    assert_eq!(fixed, Rectangle::new(0, 0, 6, 6));
}

#[test]
fn test_out_of_bounds_seed() {
    let fixture = FixtureWindow::block(10, 10, Rectangle::new(2, 3, 4, 3));
    let detector = fixture.detector();
    for seed in [Point::new(-1, 0), Point::new(0, -1), Point::new(10, 0), Point::new(0, 10)] {
        let err = detector.detect(FIXTURE_HANDLE, seed).unwrap_err();
        assert!(matches!(err, DetectError::OutOfBounds { .. }), "{:?}", err);
    }
    // The previous window is restored even though detection failed
    assert_eq!(fixture.system.foreground_window(), Some(PREVIOUS_FOREGROUND));
}

#[test]
fn test_invalid_handle_restores_foreground() {
    let fixture = FixtureWindow::block(4, 4, Rectangle::new(0, 0, 1, 1));
    let err = fixture
        .detector()
        .detect(WindowHandle(0xdead), Point::new(0, 0))
        .unwrap_err();
    assert!(matches!(err, DetectError::Capture(CaptureError::InvalidHandle { .. })));
    assert_eq!(
        fixture.system.foreground_history(),
        vec![WindowHandle(0xdead), PREVIOUS_FOREGROUND]
    );
}

#[test]
fn test_empty_capture_error_propagates() {
    let system = MockWindowSystem::new()
        .with_window(FIXTURE_HANDLE, PixelBuffer::filled(1, 1, Bgra::WHITE).unwrap())
        .with_error(CaptureError::EmptyCapture {
            handle: FIXTURE_HANDLE,
            width:  0,
            height: 0,
        });
    let detector = AutoRegionDetector::new(Arc::new(system));
    let err = detector.detect(FIXTURE_HANDLE, Point::new(0, 0)).unwrap_err();
    assert!(matches!(err, DetectError::Capture(CaptureError::EmptyCapture { .. })));
    assert!(!err.remediation_hint().is_empty());
}

#[test]
fn test_independent_detections_in_parallel() {
    let fixture = FixtureWindow::block(32, 32, Rectangle::new(4, 4, 8, 8));
    let detector = fixture.detector();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let detector = detector.clone();
            std::thread::spawn(move || detector.detect(FIXTURE_HANDLE, Point::new(5, 5)))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), Rectangle::new(4, 4, 8, 8));
    }
}

#[test]
fn test_cancel_flag_from_another_clone() {
    let fixture = FixtureWindow::block(10, 10, Rectangle::new(2, 3, 4, 3));
    let flag = CancelFlag::new();
    let detector = fixture.detector().with_cancel_flag(flag.clone());

    flag.cancel();
    let err = detector.detect(FIXTURE_HANDLE, Point::new(3, 4)).unwrap_err();
    assert!(matches!(err, DetectError::Cancelled { .. }));
}

#[test]
fn test_diagnostic_snapshots_do_not_alter_result() {
    let fixture = FixtureWindow::block(10, 10, Rectangle::new(2, 3, 4, 3));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let detector = fixture
        .detector()
        .with_hook(Arc::new(move |stage: DiagnosticStage, buf: &PixelBuffer| {
            sink.lock().unwrap().push((stage, buf.clone()));
        }));

    let rect = detector.detect(FIXTURE_HANDLE, Point::new(3, 4)).unwrap();
    assert_eq!(rect, Rectangle::new(2, 3, 4, 3));

    let seen = seen.lock().unwrap();
    let stages: Vec<_> = seen.iter().map(|(stage, _)| *stage).collect();
    assert_eq!(
        stages,
        vec![DiagnosticStage::Captured, DiagnosticStage::Binarized, DiagnosticStage::Filled]
    );
    let filled = &seen[2].1;
    assert_eq!(filled.get(2, 3).unwrap(), Bgra::RED);
    assert_eq!(filled.get(1, 3).unwrap(), Bgra::BLACK);
}

#[test]
fn test_png_dump_hook_writes_all_stages() {
    let fixture = FixtureWindow::block(10, 10, Rectangle::new(2, 3, 4, 3));
    let dir = tempfile::tempdir().unwrap();
    let detector = fixture
        .detector()
        .with_hook(Arc::new(PngDumpHook::new(dir.path())));
    detector.detect(FIXTURE_HANDLE, Point::new(3, 4)).unwrap();

    for name in ["screenshot.png", "otsu.png", "floodfill.png"] {
        assert!(dir.path().join(name).is_file(), "{} missing", name);
    }
}

#[test]
fn test_image_file_window() {
    let fixture = FixtureWindow::block(12, 12, Rectangle::new(3, 3, 5, 2));
    let (_dir, path) = fixture.save_png("block.png");

    let window = ImageFileWindow::open(&path).unwrap();
    let detector = AutoRegionDetector::new(Arc::new(window));
    let rect = detector.detect(ImageFileWindow::HANDLE, Point::new(4, 4)).unwrap();
    assert_eq!(rect, Rectangle::new(3, 3, 5, 2));
}

#[test]
fn test_large_serpentine_completes() {
    let fixture = FixtureWindow::new(fixtures::serpentine_buffer(256, 2001));
    let detector = fixture.detector();
    let (result, elapsed) = measure_sync("serpentine", || {
        detector.detect(FIXTURE_HANDLE, Point::new(0, 0))
    });
    assert_eq!(result.unwrap(), Rectangle::new(0, 0, 256, 2001));
    assert_duration_below(elapsed, std::time::Duration::from_secs(10), "serpentine detection");
}

#[tokio::test]
async fn test_detect_async_matches_sync() {
    let fixture = FixtureWindow::block(10, 10, Rectangle::new(2, 3, 4, 3));
    let detector = fixture.detector();
    let sync = detector.detect(FIXTURE_HANDLE, Point::new(3, 4)).unwrap();
    let asynchronous = detector
        .detect_async(FIXTURE_HANDLE, Point::new(3, 4))
        .await
        .unwrap();
    assert_eq!(sync, asynchronous);
}

//! Timing helpers for performance assertions
//!
//! - [`measure_sync`]: run a closure and return its result with the elapsed time
//! - [`assert_duration_below`]: assert a duration is under a threshold

use std::time::{Duration, Instant};

/// Measure the duration of a synchronous operation
///
/// # Example
///
/// ```
/// use autoregion_test_utils::timing::measure_sync;
///
/// let (sum, _elapsed) = measure_sync("sum", || (0..1000u32).sum::<u32>());
/// assert_eq!(sum, 499_500);
/// ```
pub fn measure_sync<F, T>(name: &str, f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    println!("[TIMING] {}: {:.2}ms", name, elapsed.as_secs_f64() * 1000.0);
    (result, elapsed)
}

/// Asserts that a duration is below a threshold
///
/// # Panics
///
/// Panics if `actual > threshold` with a message showing the excess time.
pub fn assert_duration_below(actual: Duration, threshold: Duration, operation: &str) {
    assert!(
        actual <= threshold,
        "{} took {:.3}s, expected <={:.3}s ({}ms over threshold)",
        operation,
        actual.as_secs_f64(),
        threshold.as_secs_f64(),
        (actual.as_millis() as i128) - (threshold.as_millis() as i128)
    );
}

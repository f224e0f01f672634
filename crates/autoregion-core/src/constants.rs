//! Detection constants and environment overrides
//!
//! # Runtime Configuration
//!
//! Detection options can be overridden at runtime via environment variables:
//!
//! | Environment Variable | Default | Description |
//! |---------------------|---------|-------------|
//! | `AUTOREGION_THRESHOLD` | `otsu` | Gray level `0..=255`, or `otsu` |
//! | `AUTOREGION_FILL_COLOR` | `#FF0000` | Fill color as `#RRGGBB[AA]` |
//! | `AUTOREGION_RECT_CONVENTION` | `inclusive` | `inclusive` or `span` |
//! | `AUTOREGION_DUMP_DIR` | unset | Directory for diagnostic PNG dumps |
//!
//! Invalid values are ignored with a warning and the default is kept.

use std::{path::PathBuf, str::FromStr};

use crate::model::{Bgra, DetectOptions, RectConvention, ThresholdMode};

pub const THRESHOLD_ENV: &str = "AUTOREGION_THRESHOLD";
pub const FILL_COLOR_ENV: &str = "AUTOREGION_FILL_COLOR";
pub const RECT_CONVENTION_ENV: &str = "AUTOREGION_RECT_CONVENTION";
pub const DUMP_DIR_ENV: &str = "AUTOREGION_DUMP_DIR";

/// Default fill color painted over the detected region
pub const DEFAULT_FILL_COLOR: Bgra = Bgra::RED;

/// Diagnostic dump file names, one per stage
pub const CAPTURED_DUMP_NAME: &str = "screenshot.png";
pub const BINARIZED_DUMP_NAME: &str = "otsu.png";
pub const FILLED_DUMP_NAME: &str = "floodfill.png";

/// Reads `var` and parses it, warning and returning `None` on bad input.
fn get_from_env<T>(var: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(var).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring {}={:?}: {}", var, raw, e);
            None
        }
    }
}

/// Threshold override from `AUTOREGION_THRESHOLD`
pub fn threshold_override() -> Option<ThresholdMode> {
    get_from_env(THRESHOLD_ENV)
}

/// Fill color override from `AUTOREGION_FILL_COLOR`
pub fn fill_color_override() -> Option<Bgra> {
    get_from_env(FILL_COLOR_ENV)
}

/// Rectangle convention override from `AUTOREGION_RECT_CONVENTION`
pub fn rect_convention_override() -> Option<RectConvention> {
    get_from_env(RECT_CONVENTION_ENV)
}

/// Dump directory from `AUTOREGION_DUMP_DIR`; empty values count as unset
pub fn dump_dir() -> Option<PathBuf> {
    std::env::var_os(DUMP_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

impl DetectOptions {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies environment overrides on top of `self`
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(threshold) = threshold_override() {
            self.threshold = threshold;
        }
        if let Some(color) = fill_color_override() {
            self.fill_color = color;
        }
        if let Some(convention) = rect_convention_override() {
            self.rect_convention = convention;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 4] = [THRESHOLD_ENV, FILL_COLOR_ENV, RECT_CONVENTION_ENV, DUMP_DIR_ENV];

    fn without_overrides<F: FnOnce()>(f: F) {
        temp_env::with_vars_unset(ALL_VARS, f);
    }

    #[test]
    fn test_defaults_without_env() {
        without_overrides(|| {
            assert_eq!(DetectOptions::from_env(), DetectOptions::default());
            assert_eq!(dump_dir(), None);
        });
    }

    #[test]
    fn test_env_override_with_value() {
        temp_env::with_vars(
            [
                (THRESHOLD_ENV, Some("128")),
                (FILL_COLOR_ENV, Some("#00FF00")),
                (RECT_CONVENTION_ENV, Some("span")),
            ],
            || {
                let opts = DetectOptions::from_env();
                assert_eq!(opts.threshold, ThresholdMode::Fixed(128));
                assert_eq!(opts.fill_color, Bgra::opaque(0, 255, 0));
                assert_eq!(opts.rect_convention, RectConvention::Span);
            },
        );
    }

    #[test]
    fn test_env_override_invalid_value() {
        temp_env::with_vars(
            [
                (THRESHOLD_ENV, Some("300")),
                (FILL_COLOR_ENV, Some("red")),
                (RECT_CONVENTION_ENV, Some("")),
            ],
            || {
                assert_eq!(DetectOptions::from_env(), DetectOptions::default());
            },
        );
    }

    #[test]
    fn test_overrides_apply_on_top_of_config() {
        let from_file = DetectOptions::builder()
            .threshold(ThresholdMode::Fixed(40))
            .rect_convention(RectConvention::Span)
            .build();
        temp_env::with_vars(
            [
                (THRESHOLD_ENV, Some("otsu")),
                (FILL_COLOR_ENV, None),
                (RECT_CONVENTION_ENV, None),
            ],
            || {
                let opts = from_file.with_env_overrides();
                assert_eq!(opts.threshold, ThresholdMode::Otsu);
                assert_eq!(opts.rect_convention, RectConvention::Span);
                assert_eq!(opts.fill_color, DEFAULT_FILL_COLOR);
            },
        );
    }

    #[test]
    fn test_dump_dir_empty_is_unset() {
        temp_env::with_var(DUMP_DIR_ENV, Some(""), || {
            assert_eq!(dump_dir(), None);
        });
        temp_env::with_var(DUMP_DIR_ENV, Some("/tmp/dumps"), || {
            assert_eq!(dump_dir(), Some(PathBuf::from("/tmp/dumps")));
        });
    }
}

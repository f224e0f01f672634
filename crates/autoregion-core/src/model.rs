//! Data models and type definitions for autoregion
//!
//! This module defines the value types shared by the pipeline stages:
//! - Window handles and backend identification
//! - Seed points, rectangles and BGRA colors
//! - Detection options (threshold mode, fill color, rectangle convention)

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifies which capture backend produced a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    /// No backend detected
    None,
    /// In-memory mock windows
    Mock,
    /// An image file standing in for a window
    ImageFile,
    /// X11 display server (Linux)
    X11,
    /// Win32 GDI capture
    Windows,
}

impl BackendType {
    /// Returns the backend type as a lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::None => "none",
            BackendType::Mock => "mock",
            BackendType::ImageFile => "image_file",
            BackendType::X11 => "x11",
            BackendType::Windows => "windows",
        }
    }
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque native window handle (HWND on Windows, XID on X11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub u64);

impl std::fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl FromStr for WindowHandle {
    type Err = String;

    /// Parses decimal or `0x`-prefixed hexadecimal handles
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => trimmed.parse::<u64>(),
        };
        parsed
            .map(WindowHandle)
            .map_err(|e| format!("invalid window handle '{}': {}", s, e))
    }
}

/// Integer point in buffer coordinates
///
/// Coordinates are signed so that callers can express (and be rejected for)
/// points left of or above the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl Point {
    /// Creates a new point
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in buffer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    /// Left column
    pub x:      u32,
    /// Top row
    pub y:      u32,
    /// Width
    pub width:  u32,
    /// Height
    pub height: u32,
}

impl Rectangle {
    /// Creates a new rectangle
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true if the point lies inside the rectangle
    pub fn contains(&self, point: Point) -> bool {
        let (px, py) = (i64::from(point.x), i64::from(point.y));
        let (x, y) = (i64::from(self.x), i64::from(self.y));
        px >= x && py >= y && px < x + i64::from(self.width) && py < y + i64::from(self.height)
    }
}

impl std::fmt::Display for Rectangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} at ({}, {})", self.width, self.height, self.x, self.y)
    }
}

/// A BGRA8 pixel, in memory order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bgra {
    /// Blue
    pub b: u8,
    /// Green
    pub g: u8,
    /// Red
    pub r: u8,
    /// Alpha
    pub a: u8,
}

impl Bgra {
    pub const BLACK: Bgra = Bgra::opaque(0, 0, 0);
    pub const WHITE: Bgra = Bgra::opaque(255, 255, 255);
    pub const RED: Bgra = Bgra::opaque(255, 0, 0);

    /// Creates a color from its channels in memory order
    pub const fn new(b: u8, g: u8, r: u8, a: u8) -> Self {
        Self { b, g, r, a }
    }

    /// Creates a fully opaque color from RGB components
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { b, g, r, a: 255 }
    }

    /// Component-wise equality on the color channels, ignoring alpha
    pub fn same_rgb(&self, other: &Bgra) -> bool {
        self.b == other.b && self.g == other.g && self.r == other.r
    }
}

impl Default for Bgra {
    fn default() -> Self {
        Bgra::BLACK
    }
}

impl FromStr for Bgra {
    type Err = String;

    /// Parses `#RRGGBB` or `#RRGGBBAA` (the `#` is optional)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(format!("expected #RRGGBB or #RRGGBBAA, got '{}'", s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|e| format!("invalid color '{}': {}", s, e))
        };
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Bgra::new(channel(4)?, channel(2)?, channel(0)?, a))
    }
}

/// How the binarization threshold is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Search the gray histogram for the maximum between-class variance
    #[default]
    Otsu,
    /// Apply the given threshold without searching
    Fixed(u8),
}

impl FromStr for ThresholdMode {
    type Err = String;

    /// Parses `otsu` or a gray level in `0..=255`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("otsu") {
            return Ok(ThresholdMode::Otsu);
        }
        trimmed
            .parse::<u8>()
            .map(ThresholdMode::Fixed)
            .map_err(|_| format!("threshold must be 'otsu' or 0-255, got '{}'", s))
    }
}

/// How a bounding box is turned into a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RectConvention {
    /// Width and height count pixels (`max - min + 1`)
    #[default]
    Inclusive,
    /// Width and height are coordinate spans (`max - min`), as stored by
    /// older saved regions
    Span,
}

impl FromStr for RectConvention {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inclusive" => Ok(RectConvention::Inclusive),
            "span" => Ok(RectConvention::Span),
            _ => Err(format!("rect convention must be 'inclusive' or 'span', got '{}'", s)),
        }
    }
}

/// Options for a detection run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectOptions {
    /// Color written over the grown region
    pub fill_color:      Bgra,
    /// Threshold selection
    pub threshold:       ThresholdMode,
    /// Rectangle convention for the result
    pub rect_convention: RectConvention,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            fill_color:      Bgra::RED,
            threshold:       ThresholdMode::Otsu,
            rect_convention: RectConvention::Inclusive,
        }
    }
}

impl DetectOptions {
    /// Creates a builder starting from the defaults
    ///
    /// # Examples
    ///
    /// ```
    /// use autoregion_core::model::{Bgra, DetectOptions, ThresholdMode};
    ///
    /// let opts = DetectOptions::builder()
    ///     .threshold(ThresholdMode::Fixed(128))
    ///     .fill_color(Bgra::opaque(0, 255, 0))
    ///     .build();
    /// assert_eq!(opts.threshold, ThresholdMode::Fixed(128));
    /// ```
    pub fn builder() -> DetectOptionsBuilder {
        DetectOptionsBuilder {
            opts: DetectOptions::default(),
        }
    }
}

/// Builder for [`DetectOptions`]
#[derive(Debug, Clone)]
pub struct DetectOptionsBuilder {
    opts: DetectOptions,
}

impl DetectOptionsBuilder {
    pub fn fill_color(mut self, color: Bgra) -> Self {
        self.opts.fill_color = color;
        self
    }

    pub fn threshold(mut self, mode: ThresholdMode) -> Self {
        self.opts.threshold = mode;
        self
    }

    pub fn rect_convention(mut self, convention: RectConvention) -> Self {
        self.opts.rect_convention = convention;
        self
    }

    pub fn build(self) -> DetectOptions {
        self.opts
    }
}

//! Diagnostic snapshots of the detection pipeline
//!
//! A [`DiagnosticHook`] sees the buffer after each stage. Nothing is installed
//! by default. [`PngDumpHook`] writes one PNG per stage for inspecting why a
//! click produced the rectangle it did.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    buffer::PixelBuffer,
    constants::{BINARIZED_DUMP_NAME, CAPTURED_DUMP_NAME, FILLED_DUMP_NAME},
    model::Point,
};

/// Pipeline stage a snapshot was taken after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticStage {
    /// Raw capture, seed pixel marked
    Captured,
    /// Black/white image after thresholding
    Binarized,
    /// Binarized image with the region painted
    Filled,
}

impl DiagnosticStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticStage::Captured => "captured",
            DiagnosticStage::Binarized => "binarized",
            DiagnosticStage::Filled => "filled",
        }
    }

    /// File name used by [`PngDumpHook`]
    pub fn dump_file_name(&self) -> &'static str {
        match self {
            DiagnosticStage::Captured => CAPTURED_DUMP_NAME,
            DiagnosticStage::Binarized => BINARIZED_DUMP_NAME,
            DiagnosticStage::Filled => FILLED_DUMP_NAME,
        }
    }
}

impl fmt::Display for DiagnosticStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observer for intermediate pipeline buffers
///
/// Hooks must not fail the detection; report problems through logging.
pub trait DiagnosticHook: Send + Sync {
    fn on_stage(&self, stage: DiagnosticStage, buffer: &PixelBuffer);
}

impl<F> DiagnosticHook for F
where
    F: Fn(DiagnosticStage, &PixelBuffer) + Send + Sync,
{
    fn on_stage(&self, stage: DiagnosticStage, buffer: &PixelBuffer) {
        self(stage, buffer)
    }
}

/// Copy of `buffer` with the seed pixel's alpha inverted
///
/// The caller's buffer is left untouched. Seeds outside the buffer leave the
/// copy unmarked.
pub fn mark_seed(buffer: &PixelBuffer, seed: Point) -> PixelBuffer {
    let mut marked = buffer.clone();
    let (x, y) = (i64::from(seed.x), i64::from(seed.y));
    if let Ok(mut px) = marked.get(x, y) {
        px.a = 255 - px.a;
        let _ = marked.set(x, y, px);
    }
    marked
}

#[cfg(feature = "image-processing")]
pub use png_dump::PngDumpHook;

#[cfg(feature = "image-processing")]
mod png_dump {
    use std::path::{Path, PathBuf};

    use super::{DiagnosticHook, DiagnosticStage};
    use crate::buffer::PixelBuffer;

    /// Writes each stage to `<dir>/<name>.png`
    ///
    /// The directory is created on first write. Write failures are logged
    /// and otherwise ignored.
    #[derive(Debug, Clone)]
    pub struct PngDumpHook {
        dir: PathBuf,
    }

    impl PngDumpHook {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            Self { dir: dir.into() }
        }

        /// Dumps into a fresh `<root>/<YYYYmmdd-HHMMSS.mmm>` directory so
        /// repeated runs do not overwrite each other
        pub fn timestamped(root: impl AsRef<Path>) -> Self {
            let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
            Self::new(root.as_ref().join(stamp.to_string()))
        }

        pub fn dir(&self) -> &Path {
            &self.dir
        }

        fn write(&self, stage: DiagnosticStage, buffer: &PixelBuffer) -> Result<PathBuf, String> {
            std::fs::create_dir_all(&self.dir).map_err(|e| e.to_string())?;
            let path = self.dir.join(stage.dump_file_name());
            buffer
                .to_rgba_image()
                .save_with_format(&path, image::ImageFormat::Png)
                .map_err(|e| e.to_string())?;
            Ok(path)
        }
    }

    impl DiagnosticHook for PngDumpHook {
        fn on_stage(&self, stage: DiagnosticStage, buffer: &PixelBuffer) {
            match self.write(stage, buffer) {
                Ok(path) => tracing::debug!("Dumped {} stage to {}", stage, path.display()),
                Err(e) => tracing::warn!(
                    "Failed to dump {} stage into {}: {}",
                    stage,
                    self.dir.display(),
                    e
                ),
            }
        }
    }
}

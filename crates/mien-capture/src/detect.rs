//! Face detector boundary.
//!
//! The contract is zero or more rectangular regions per frame; a
//! failure on one frame is skipped by callers, never fatal. The
//! reference implementation here is a classical brightness scan, not a
//! real face detector: it exists so the pipeline runs end to end in
//! demos and tests without a vision model.

use crate::frame::Frame;
use thiserror::Error;

// --- Named constants (no magic numbers) ---
/// Regions with a shorter side below this are skipped by the session.
pub const DEFAULT_MIN_FACE: u32 = 60;
/// Luma value at or above which a pixel counts as "bright".
const DEFAULT_BRIGHT_THRESHOLD: u8 = 128;
/// Fewer bright pixels than this is treated as noise, not a region.
const MIN_BRIGHT_PIXELS: usize = 25;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("frame data length mismatch: expected {expected} bytes for {width}x{height}, got {actual}")]
    BadFrame {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// Axis-aligned pixel rectangle for a detected face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    /// Shorter side, compared against the minimum-face rule.
    pub fn min_side(&self) -> u32 {
        self.width.min(self.height)
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Strategy for locating face regions in a frame.
pub trait FaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, DetectError>;
}

/// Threshold-and-bounding-box region finder over the luma grid.
///
/// Collects every pixel at or above `bright_threshold` and reports
/// their bounding box as a single region, provided enough pixels
/// qualify. Stands in for a cascade detector against synthetic frames
/// whose "face" is a bright patch.
pub struct BrightnessDetector {
    pub bright_threshold: u8,
    pub min_bright_pixels: usize,
}

impl BrightnessDetector {
    pub fn new() -> Self {
        Self {
            bright_threshold: DEFAULT_BRIGHT_THRESHOLD,
            min_bright_pixels: MIN_BRIGHT_PIXELS,
        }
    }
}

impl Default for BrightnessDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceDetector for BrightnessDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, DetectError> {
        let width = frame.width as usize;
        let height = frame.height as usize;
        let expected = width * height;
        if frame.data.len() < expected {
            return Err(DetectError::BadFrame {
                width: frame.width,
                height: frame.height,
                expected,
                actual: frame.data.len(),
            });
        }

        let mut min_x = usize::MAX;
        let mut min_y = usize::MAX;
        let mut max_x = 0usize;
        let mut max_y = 0usize;
        let mut bright = 0usize;

        for y in 0..height {
            let row = &frame.data[y * width..(y + 1) * width];
            for (x, &pixel) in row.iter().enumerate() {
                if pixel >= self.bright_threshold {
                    bright += 1;
                    min_x = min_x.min(x);
                    min_y = min_y.min(y);
                    max_x = max_x.max(x);
                    max_y = max_y.max(y);
                }
            }
        }

        // With zero bright pixels the min/max accumulators are untouched,
        // whatever the configured floor.
        if bright == 0 || bright < self.min_bright_pixels {
            return Ok(Vec::new());
        }

        Ok(vec![FaceRegion {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        }])
    }
}

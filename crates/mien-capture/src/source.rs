//! Frame source boundary.
//!
//! The synthetic camera produces flat gray frames with a bright square
//! "face" patch whose presence toggles randomly, so a pipeline driven
//! by it exercises both the detection and the no-face paths.

use crate::frame::Frame;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

// --- Named constants (no magic numbers) ---
const BACKGROUND_LUMA: u8 = 60;
const FACE_LUMA: u8 = 230;
/// Per-frame probability that the synthetic subject enters or leaves.
const TOGGLE_PROBABILITY: f64 = 0.2;
/// Patch side as a fraction of the shorter frame dimension.
const FACE_SIDE_DIVISOR: u32 = 3;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("frame source exhausted")]
    Exhausted,
}

/// Supplier of frames for a capture session.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame, SourceError>;
}

/// Synthetic stand-in for a webcam.
pub struct SyntheticCamera {
    width: u32,
    height: u32,
    sequence: u32,
    face_present: bool,
    rng: StdRng,
}

impl SyntheticCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_rng(width, height, StdRng::from_entropy())
    }

    /// Deterministic variant for tests.
    pub fn seeded(width: u32, height: u32, seed: u64) -> Self {
        Self::with_rng(width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(width: u32, height: u32, rng: StdRng) -> Self {
        Self {
            width,
            height,
            sequence: 0,
            face_present: true,
            rng,
        }
    }
}

impl FrameSource for SyntheticCamera {
    fn next_frame(&mut self) -> Result<Frame, SourceError> {
        if self.rng.gen::<f64>() < TOGGLE_PROBABILITY {
            self.face_present = !self.face_present;
        }

        let mut data = vec![BACKGROUND_LUMA; (self.width * self.height) as usize];

        if self.face_present {
            let side = self.width.min(self.height) / FACE_SIDE_DIVISOR;
            let jitter = (side / 8).max(1) as i64;
            let base_x = ((self.width - side) / 2) as i64;
            let base_y = ((self.height - side) / 2) as i64;
            let x = (base_x + self.rng.gen_range(-jitter..=jitter))
                .clamp(0, (self.width - side) as i64) as u32;
            let y = (base_y + self.rng.gen_range(-jitter..=jitter))
                .clamp(0, (self.height - side) as i64) as u32;

            for py in y..y + side {
                for px in x..x + side {
                    data[(py * self.width + px) as usize] = FACE_LUMA;
                }
            }
        }

        let frame = Frame {
            data,
            width: self.width,
            height: self.height,
            timestamp: std::time::Instant::now(),
            sequence: self.sequence,
        };
        self.sequence = self.sequence.wrapping_add(1);
        Ok(frame)
    }
}

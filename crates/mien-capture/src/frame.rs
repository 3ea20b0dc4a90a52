//! Frame type shared by sources, detectors, and classifiers.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("could not read image {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// A single grayscale frame.
#[derive(Clone, Debug)]
pub struct Frame {
    /// Luma pixel data, `width * height` bytes, row-major.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: std::time::Instant,
    pub sequence: u32,
}

impl Frame {
    /// Average pixel brightness (0.0-255.0).
    pub fn avg_brightness(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&b| b as f32).sum::<f32>() / self.data.len() as f32
    }

    /// Build a frame from a decoded image via luma conversion.
    pub fn from_image(img: &image::DynamicImage, sequence: u32) -> Self {
        let luma = img.to_luma8();
        let (width, height) = luma.dimensions();
        Self {
            data: luma.into_raw(),
            width,
            height,
            timestamp: std::time::Instant::now(),
            sequence,
        }
    }

    /// Decode an image file into a frame (the still-image analysis path).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FrameError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| FrameError::Image {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_image(&img, 0))
    }
}

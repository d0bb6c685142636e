//! Turns uploaded bytes into the input the classifier was trained on:
//! a 1x130x130x3 NHWC tensor of RGB values scaled to `[0, 1]`.

use crate::error::InvalidImageError;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use ndarray::Array4;

pub const INPUT_SIZE: u32 = 130;
pub const INPUT_CHANNELS: usize = 3;
pub const INPUT_SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, INPUT_CHANNELS];

/// A decoded upload, already resampled to the model's input resolution.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pixels: RgbImage,
}

impl UploadedImage {
    /// Accepts JPEG and PNG only.
    pub fn decode(bytes: &[u8]) -> Result<Self, InvalidImageError> {
        if bytes.is_empty() {
            return Err(InvalidImageError::Empty);
        }

        let format = image::guess_format(bytes)
            .map_err(|e| InvalidImageError::Undecodable(e.to_string()))?;
        match format {
            ImageFormat::Jpeg | ImageFormat::Png => {}
            other => {
                return Err(InvalidImageError::UnsupportedFormat(
                    format!("{:?}", other).to_lowercase(),
                ));
            }
        }

        let decoded = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| InvalidImageError::Undecodable(e.to_string()))?;
        Ok(Self::from_dynamic(&decoded))
    }

    /// Resamples with Catmull-Rom (bicubic) and drops any alpha channel.
    pub fn from_dynamic(image: &DynamicImage) -> Self {
        let pixels = if image.dimensions() == (INPUT_SIZE, INPUT_SIZE) {
            image.to_rgb8()
        } else {
            image
                .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::CatmullRom)
                .to_rgb8()
        };
        Self { pixels }
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

/// Model input. Only constructible from an [`UploadedImage`] (or as the
/// all-zero probe), so shape and value range always hold.
#[derive(Debug, Clone)]
pub struct NormalizedTensor {
    data: Array4<f32>,
}

impl NormalizedTensor {
    pub fn from_image(image: &UploadedImage) -> Self {
        let mut data = Array4::<f32>::zeros(INPUT_SHAPE);
        for (x, y, pixel) in image.pixels().enumerate_pixels() {
            for channel in 0..INPUT_CHANNELS {
                data[[0, y as usize, x as usize, channel]] = pixel[channel] as f32 / 255.0;
            }
        }
        Self { data }
    }

    /// All-zero input used to check a freshly loaded model's signature.
    pub fn probe() -> Self {
        Self {
            data: Array4::<f32>::zeros(INPUT_SHAPE),
        }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }

    /// Values in row-major NHWC order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.as_array().iter().copied().collect()
    }
}

use image::imageops::{self, FilterType};
use image::{ImageError, ImageReader};
use ndarray::Array4;
use std::io::Cursor;

use super::BatchedInput;

pub const INPUT_WIDTH: u32 = 224;
pub const INPUT_HEIGHT: u32 = 224;
const CHANNELS: usize = 3;

// Bicubic, matching the resampling the classifier was trained with.
const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("uploaded file is empty")]
    Empty,
    #[error("could not read image data: {0}")]
    Read(#[from] std::io::Error),
    #[error("could not decode image: {0}")]
    Decode(#[from] ImageError),
}

/// Decodes `image` and turns it into the classifier's batched input.
///
/// The picture is forced to RGB, stretched to 224x224 regardless of its
/// aspect ratio, scaled to `[0, 1]` and wrapped in a batch of one.
pub fn preprocess(image: &[u8]) -> Result<BatchedInput, PreprocessError> {
    if image.is_empty() {
        return Err(PreprocessError::Empty);
    }

    let decoded = ImageReader::new(Cursor::new(image))
        .with_guessed_format()?
        .decode()?;
    let rgb = decoded.to_rgb8();
    let resized = imageops::resize(&rgb, INPUT_WIDTH, INPUT_HEIGHT, RESIZE_FILTER);

    let data: Vec<f32> = resized
        .into_raw()
        .into_iter()
        .map(|v| f32::from(v) / 255.0)
        .collect();
    let array = Array4::from_shape_vec(
        (1, INPUT_HEIGHT as usize, INPUT_WIDTH as usize, CHANNELS),
        data,
    )
    .map_err(|e| PreprocessError::Read(std::io::Error::other(e)))?;

    Ok(BatchedInput::new(array))
}

//! Raw image decoding seam
//!
//! The dataset images are stored in a medical imaging format whose decoding
//! lives outside this workspace. Callers plug a decoder in through
//! [`ImageSource`].

use crate::error::{Error, Result};
use ndarray::Array2;
use std::path::Path;

/// Decodes a raw image into a grayscale pixel array (rows × columns)
pub trait ImageSource: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Array2<u16>>;
}

/// Placeholder used when no decoder was configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImageSource;

impl ImageSource for NoImageSource {
    fn decode(&self, path: &Path) -> Result<Array2<u16>> {
        Err(Error::Decode(format!(
            "no image decoder configured for {}",
            path.display()
        )))
    }
}

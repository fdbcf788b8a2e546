//! Heatmap archives and per-fixation heatmap synthesis
//!
//! A heatmap archive bundles one precomputed gaze heatmap with the image and
//! session it belongs to. Archives are read through [`HeatmapArchiveLoader`]
//! so the on-disk format stays swappable; [`JsonHeatmapArchive`] is the
//! bundled implementation.

use crate::error::Result;
use crate::models::Fixation;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Identifying fields embedded in every archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapHeader {
    /// Path of the image the heatmap was computed over
    pub img_path: String,
    /// Session id
    pub id: String,
}

impl HeatmapHeader {
    /// Image id: last `/` component of `img_path`, up to its first `.`
    pub fn dicom_id(&self) -> Option<&str> {
        let file_name = self.img_path.rsplit('/').next()?;
        file_name.split('.').next().filter(|id| !id.is_empty())
    }
}

/// Complete archive contents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapArchive {
    pub img_path: String,
    pub id: String,
    pub np_image: Array2<f64>,
}

/// Reads heatmap archives
pub trait HeatmapArchiveLoader: Send + Sync {
    /// Read only the identifying fields
    fn load_header(&self, path: &Path) -> Result<HeatmapHeader>;

    /// Read the heatmap array
    fn load_image(&self, path: &Path) -> Result<Array2<f64>>;
}

/// Archive stored as a JSON document `{ img_path, id, np_image }`
///
/// `np_image` uses ndarray's serde layout (`{"v":1,"dim":[h,w],"data":[..]}`).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHeatmapArchive;

impl JsonHeatmapArchive {
    pub fn write(path: &Path, archive: &HeatmapArchive) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, archive)?;
        writer.flush()?;
        Ok(())
    }
}

impl HeatmapArchiveLoader for JsonHeatmapArchive {
    fn load_header(&self, path: &Path) -> Result<HeatmapHeader> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn load_image(&self, path: &Path) -> Result<Array2<f64>> {
        let reader = BufReader::new(File::open(path)?);
        let archive: HeatmapArchive = serde_json::from_reader(reader)?;
        Ok(archive.np_image)
    }
}

/// Turns a set of fixations into a 2-D attention density
pub trait HeatmapSynthesizer: Send + Sync {
    /// Heatmap of `height` rows by `width` columns
    fn synthesize(&self, fixations: &[Fixation], width: usize, height: usize) -> Array2<f64>;
}

/// Sum of one isotropic Gaussian per fixation, weighted by dwell time
///
/// The result is scaled to sum to 1; an input without usable fixations
/// yields all zeros. Kernels are truncated at three standard deviations.
#[derive(Debug, Clone)]
pub struct GaussianSynthesizer {
    sigma: f64,
}

impl GaussianSynthesizer {
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma: sigma.max(f64::EPSILON),
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Kernel weights for indices `lo..hi` around `center`
    fn kernel(&self, center: f64, len: usize) -> (usize, Vec<f64>) {
        let radius = 3.0 * self.sigma;
        let lo = (center - radius).floor().max(0.0) as usize;
        let hi = ((center + radius).ceil() + 1.0).min(len as f64) as usize;
        let weights = (lo..hi)
            .map(|i| {
                let d = i as f64 - center;
                (-(d * d) / (2.0 * self.sigma * self.sigma)).exp()
            })
            .collect();
        (lo, weights)
    }
}

impl Default for GaussianSynthesizer {
    fn default() -> Self {
        Self::new(150.0)
    }
}

impl HeatmapSynthesizer for GaussianSynthesizer {
    fn synthesize(&self, fixations: &[Fixation], width: usize, height: usize) -> Array2<f64> {
        let mut heatmap = Array2::<f64>::zeros((height, width));

        for fixation in fixations.iter().filter(|f| f.is_valid()) {
            let (x, y) = (fixation.x_position, fixation.y_position);
            if x >= width as f64 || y >= height as f64 {
                continue;
            }

            let weight = fixation.duration().max(0.0);
            if weight == 0.0 {
                continue;
            }

            let (x0, gx) = self.kernel(x, width);
            let (y0, gy) = self.kernel(y, height);
            for (dy, wy) in gy.iter().enumerate() {
                for (dx, wx) in gx.iter().enumerate() {
                    heatmap[[y0 + dy, x0 + dx]] += weight * wy * wx;
                }
            }
        }

        let total = heatmap.sum();
        if total > 0.0 {
            heatmap /= total;
        }
        heatmap
    }
}

//! Radiologist annotations: chest bounding box and anomaly ellipses

use ndarray::{s, Array2, ArrayView2};
use reflacx_common::tabular::{parse_flag, row_f64, Row};
use reflacx_common::Result;
use serde::{Deserialize, Serialize};

const BOUND_COLUMNS: [&str; 4] = ["xmin", "ymin", "xmax", "ymax"];

/// Chest region of the image, in pixels
///
/// `xmin..xmax` and `ymin..ymax` are half-open column and row ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: usize,
    pub ymin: usize,
    pub xmax: usize,
    pub ymax: usize,
}

fn pixel(row: &Row, column: &str) -> Result<usize> {
    Ok(row_f64(row, column)?.round().max(0.0) as usize)
}

impl BoundingBox {
    pub fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            xmin: pixel(row, "xmin")?,
            ymin: pixel(row, "ymin")?,
            xmax: pixel(row, "xmax")?,
            ymax: pixel(row, "ymax")?,
        })
    }

    pub fn width(&self) -> usize {
        self.xmax.saturating_sub(self.xmin)
    }

    pub fn height(&self) -> usize {
        self.ymax.saturating_sub(self.ymin)
    }

    /// Copy of the boxed region of `img`
    ///
    /// Bounds are clamped to the image, so a box reaching past the edge
    /// yields the overlapping part only.
    pub fn crop<A: Clone>(&self, img: ArrayView2<'_, A>) -> Array2<A> {
        let (rows, cols) = img.dim();
        let y1 = self.ymax.min(rows);
        let x1 = self.xmax.min(cols);
        let y0 = self.ymin.min(y1);
        let x0 = self.xmin.min(x1);
        img.slice(s![y0..y1, x0..x1]).to_owned()
    }
}

/// One abnormality location drawn by the radiologist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEllipse {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    pub certainty: Option<f64>,
    /// Finding columns marked `True` for this ellipse, sorted by name
    pub labels: Vec<String>,
}

impl AnomalyEllipse {
    pub fn from_row(row: &Row) -> Result<Self> {
        let labels = row
            .iter()
            .filter(|(column, _)| !BOUND_COLUMNS.contains(&column.as_str()))
            .filter(|(_, value)| parse_flag(value) == Some(true))
            .map(|(column, _)| column.clone())
            .collect();

        Ok(Self {
            xmin: row_f64(row, "xmin")?,
            ymin: row_f64(row, "ymin")?,
            xmax: row_f64(row, "xmax")?,
            ymax: row_f64(row, "ymax")?,
            certainty: row.get("certainty").and_then(|c| c.parse().ok()),
            labels,
        })
    }

    /// Ellipse centre `(x, y)`
    pub fn center(&self) -> (f64, f64) {
        ((self.xmin + self.xmax) / 2.0, (self.ymin + self.ymax) / 2.0)
    }

    /// Semi-axes `(horizontal, vertical)` of the ellipse inscribed in the
    /// bounding rectangle
    pub fn semi_axes(&self) -> (f64, f64) {
        ((self.xmax - self.xmin).abs() / 2.0, (self.ymax - self.ymin).abs() / 2.0)
    }
}

//! Gaze fixation records

use reflacx_common::tabular::{row_f64, Row};
use reflacx_common::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const X_POSITION: &str = "x_position";
const Y_POSITION: &str = "y_position";
const START: &str = "timestamp_start_fixation";
const END: &str = "timestamp_end_fixation";

/// One gaze dwell event
///
/// Coordinates are image pixels; a negative coordinate marks a fixation that
/// fell outside the image. Times are seconds from the start of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixation {
    pub x_position: f64,
    pub y_position: f64,
    pub timestamp_start_fixation: f64,
    pub timestamp_end_fixation: f64,
    /// Remaining columns of the fixation table, untouched
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Fixation {
    pub fn new(x: f64, y: f64, start: f64, end: f64) -> Self {
        Self {
            x_position: x,
            y_position: y,
            timestamp_start_fixation: start,
            timestamp_end_fixation: end,
            extra: BTreeMap::new(),
        }
    }

    /// Build from a fixation-table row
    pub fn from_row(row: &Row) -> Result<Self> {
        let extra = row
            .iter()
            .filter(|(k, _)| ![X_POSITION, Y_POSITION, START, END].contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            x_position: row_f64(row, X_POSITION)?,
            y_position: row_f64(row, Y_POSITION)?,
            timestamp_start_fixation: row_f64(row, START)?,
            timestamp_end_fixation: row_f64(row, END)?,
            extra,
        })
    }

    /// On-image fixation (both coordinates non-negative)
    pub fn is_valid(&self) -> bool {
        self.x_position >= 0.0 && self.y_position >= 0.0
    }

    pub fn start(&self) -> f64 {
        self.timestamp_start_fixation
    }

    pub fn end(&self) -> f64 {
        self.timestamp_end_fixation
    }

    pub fn duration(&self) -> f64 {
        self.timestamp_end_fixation - self.timestamp_start_fixation
    }

    /// Temporal midpoint
    pub fn midpoint(&self) -> f64 {
        (self.timestamp_start_fixation + self.timestamp_end_fixation) / 2.0
    }
}

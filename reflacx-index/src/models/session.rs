//! Per-session metadata record stored in the index

use reflacx_common::tabular::parse_flag;
use reflacx_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Base names of the auxiliary files found in a session directory
pub mod file_keys {
    pub const FIXATIONS: &str = "fixations";
    pub const TRANSCRIPTION: &str = "transcription";
    pub const TIMESTAMPS_TRANSCRIPTION: &str = "timestamps_transcription";
    pub const CHEST_BOUNDING_BOX: &str = "chest_bounding_box";
    pub const ANOMALY_LOCATION_ELLIPSES: &str = "anomaly_location_ellipses";
}

/// Scalar metadata value copied from a metadata-table cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Text(String),
}

impl FieldValue {
    /// Cells spelled as booleans become flags, everything else stays text
    ///
    /// The original spelling of a boolean cell is not kept: `true`, `TRUE`
    /// and `True` all become the same flag and display as `True`.
    pub fn from_cell(raw: &str) -> Self {
        match parse_flag(raw) {
            Some(flag) => FieldValue::Flag(flag),
            None => FieldValue::Text(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Flag(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            FieldValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Flag(true) => f.write_str("True"),
            FieldValue::Flag(false) => f.write_str("False"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// Everything known about one recording session
///
/// Created once while the index is built and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Raw image the session was recorded over
    pub image: PathBuf,
    /// Heatmap archive, when one was precomputed for this session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heatmaps: Option<PathBuf>,
    /// Auxiliary files by base name (see [`file_keys`])
    #[serde(default)]
    pub files: BTreeMap<String, PathBuf>,
    /// Remaining metadata-table columns
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl SessionRecord {
    /// Path of a required auxiliary file
    pub fn file(&self, key: &str) -> Result<&Path> {
        self.files
            .get(key)
            .map(PathBuf::as_path)
            .ok_or_else(|| Error::missing_file(key))
    }

    pub fn heatmap_path(&self) -> Result<&Path> {
        self.heatmaps
            .as_deref()
            .ok_or_else(|| Error::missing_file("heatmaps"))
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Parse a numeric metadata column
    pub fn field_f64(&self, name: &str) -> Result<f64> {
        let raw = self
            .field(name)
            .and_then(FieldValue::as_str)
            .ok_or_else(|| Error::missing_field(name))?;
        raw.parse::<f64>()
            .map_err(|e| Error::InvalidInput(format!("field '{}' value '{}': {}", name, raw, e)))
    }

    /// Image `(width, height)` in pixels
    pub fn image_size(&self) -> Result<(usize, usize)> {
        let width = self.field_f64("image_size_x")?;
        let height = self.field_f64("image_size_y")?;
        if width < 0.0 || height < 0.0 {
            return Err(Error::InvalidInput(format!(
                "negative image size {}x{}",
                width, height
            )));
        }
        Ok((width as usize, height as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_from_cell() {
        assert_eq!(FieldValue::from_cell("True"), FieldValue::Flag(true));
        assert_eq!(FieldValue::from_cell("FALSE"), FieldValue::Flag(false));
        assert_eq!(
            FieldValue::from_cell("PA"),
            FieldValue::Text("PA".to_string())
        );
        assert_eq!(FieldValue::Flag(true).to_string(), "True");
    }

    #[test]
    fn test_flag_spelling_is_normalised() {
        for raw in ["true", "TRUE", "True"] {
            assert_eq!(FieldValue::from_cell(raw).to_string(), "True");
        }
        assert_eq!(FieldValue::from_cell("false").to_string(), "False");
    }

    #[test]
    fn test_field_value_json_is_plain_scalar() {
        let json = serde_json::to_string(&FieldValue::Flag(false)).unwrap();
        assert_eq!(json, "false");
        let text: FieldValue = serde_json::from_str("\"2544\"").unwrap();
        assert_eq!(text, FieldValue::Text("2544".to_string()));
    }

    #[test]
    fn test_missing_file_key() {
        let record = SessionRecord::default();
        let err = record.file(file_keys::FIXATIONS).unwrap_err();
        assert!(matches!(err, Error::MissingFile { ref key } if key == "fixations"));
        assert!(record.heatmap_path().is_err());
    }

    #[test]
    fn test_image_size() {
        let mut record = SessionRecord::default();
        record
            .fields
            .insert("image_size_x".to_string(), FieldValue::from_cell("2544"));
        record
            .fields
            .insert("image_size_y".to_string(), FieldValue::from_cell("3056.0"));
        assert_eq!(record.image_size().unwrap(), (2544, 3056));

        record.fields.remove("image_size_y");
        assert!(matches!(
            record.image_size(),
            Err(Error::MissingField { .. })
        ));
    }
}

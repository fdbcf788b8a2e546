//! Dataset metadata index
//!
//! Maps every image (`dicom_id`) to its recording sessions (`session_id`) and
//! each session to a [`SessionRecord`]. The index is built once from the
//! dataset directories and cached as JSON; later runs load the cache
//! verbatim without checking it against the directories.
//!
//! **Build algorithm:**
//! 1. Concatenate the rows of every metadata table in the session-data
//!    directory
//! 2. Drop rows flagged `eye_tracking_data_discarded` (configurable)
//! 3. Group rows by `dicom_id`, then by session `id`, recording the image path
//! 4. Attach every file in each session's directory under its base name
//! 5. Attach heatmap archives to the sessions they reference; archives whose
//!    session is unknown are dropped
//! 6. Write the cache
//!
//! Steps 4 and 5 fan out over rayon. Results are gathered in enumeration
//! order and merged sequentially, so the index equals a sequential build.

use crate::error::Result;
use crate::models::{FieldValue, SessionRecord};
use crate::sample::{Backends, Sample};
use crate::services::dir_scanner::{base_name, DirScanner};
use crate::services::heatmap::{HeatmapArchiveLoader, HeatmapHeader};
use rand::Rng;
use rayon::prelude::*;
use reflacx_common::config::{DatasetPaths, TomlConfig};
use reflacx_common::tabular::{load_rows, parse_flag, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const DISCARDED_COLUMN: &str = "eye_tracking_data_discarded";
const DICOM_ID_COLUMN: &str = "dicom_id";
const SESSION_ID_COLUMN: &str = "id";
const IMAGE_EXTENSION: &str = "dcm";

/// Where and how to build the index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSources {
    /// Dataset root holding the session-data and heatmap directories
    pub reflacx_dir: PathBuf,
    /// Root folder of the raw images
    pub mimic_dir: PathBuf,
    pub main_data_dir: String,
    pub metadata_search_term: String,
    pub heatmaps_search_term: String,
    pub exclude_invalid_eyetracking: bool,
}

impl IndexSources {
    /// Sources with the default directory names and filters
    pub fn new(reflacx_dir: impl Into<PathBuf>, mimic_dir: impl Into<PathBuf>) -> Self {
        let defaults = TomlConfig::default();
        Self {
            reflacx_dir: reflacx_dir.into(),
            mimic_dir: mimic_dir.into(),
            main_data_dir: defaults.main_data_dir,
            metadata_search_term: defaults.metadata_search_term,
            heatmaps_search_term: defaults.heatmaps_search_term,
            exclude_invalid_eyetracking: defaults.exclude_invalid_eyetracking,
        }
    }

    pub fn from_config(config: &TomlConfig, paths: &DatasetPaths) -> Self {
        Self {
            reflacx_dir: paths.reflacx_dir.clone(),
            mimic_dir: paths.mimic_dir.clone(),
            main_data_dir: config.main_data_dir.clone(),
            metadata_search_term: config.metadata_search_term.clone(),
            heatmaps_search_term: config.heatmaps_search_term.clone(),
            exclude_invalid_eyetracking: config.exclude_invalid_eyetracking,
        }
    }

    pub fn main_data_path(&self) -> PathBuf {
        self.reflacx_dir.join(&self.main_data_dir)
    }
}

/// Which end of the id list to take from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    First,
    Last,
}

/// Sessions of one image, by session id
pub type SessionMap = BTreeMap<String, SessionRecord>;

/// dicom_id → session_id → record
///
/// Keys iterate in sorted order, which fixes the meaning of first-N and
/// last-N across save/load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataIndex {
    dicoms: BTreeMap<String, SessionMap>,
}

impl MetadataIndex {
    /// Load the cache if present, otherwise build from the dataset and write
    /// the cache
    pub fn load_or_build(
        cache_path: &Path,
        sources: &IndexSources,
        archives: &dyn HeatmapArchiveLoader,
    ) -> Result<Self> {
        if cache_path.exists() {
            let index = Self::load(cache_path)?;
            info!(
                cache = %cache_path.display(),
                images = index.len(),
                sessions = index.session_count(),
                "Metadata loaded from cache"
            );
            return Ok(index);
        }

        warn!(
            cache = %cache_path.display(),
            "Metadata cache not found, generating it from the dataset. This can take about 20 minutes"
        );
        let index = Self::build(sources, archives)?;
        index.save(cache_path)?;
        Ok(index)
    }

    /// Build the index from the dataset directories
    ///
    /// Any unreadable table, directory or archive aborts the build.
    pub fn build(sources: &IndexSources, archives: &dyn HeatmapArchiveLoader) -> Result<Self> {
        let scanner = DirScanner::new();
        let main_data = sources.main_data_path();

        let mut rows: Vec<Row> = Vec::new();
        for table in scanner.list_matching_files(&main_data, &sources.metadata_search_term)? {
            let table_rows = load_rows(&table)?;
            debug!(table = %table.display(), rows = table_rows.len(), "Loaded metadata table");
            rows.extend(table_rows);
        }

        info!(rows = rows.len(), "Grouping session metadata by dicom_id");
        let total_rows = rows.len();
        let kept: Vec<Row> = rows
            .into_iter()
            .filter_map(|mut row| {
                let discarded = row
                    .remove(DISCARDED_COLUMN)
                    .and_then(|cell| parse_flag(&cell))
                    .unwrap_or(false);
                if discarded && sources.exclude_invalid_eyetracking {
                    None
                } else {
                    Some(row)
                }
            })
            .collect();
        if kept.len() < total_rows {
            info!(
                discarded = total_rows - kept.len(),
                "Excluded sessions with discarded eye-tracking data"
            );
        }

        let records = kept
            .into_par_iter()
            .map(|row| session_from_row(row, sources, &main_data, &scanner))
            .collect::<Result<Vec<_>>>()?;

        let mut index = Self::default();
        for (dicom_id, session_id, record) in records {
            index.insert(dicom_id, session_id, record);
        }

        info!("Grouping heatmaps");
        let heatmap_dirs =
            scanner.list_matching_dirs(&sources.reflacx_dir, &sources.heatmaps_search_term)?;
        for dir in heatmap_dirs {
            info!(dir = %dir.display(), "Getting heatmaps");
            let paths = scanner.list_files(&dir)?;

            let headers = paths
                .par_iter()
                .map(|path| archives.load_header(path).map(|header| (path.clone(), header)))
                .collect::<Result<Vec<_>>>()?;

            for (count, (path, header)) in headers.into_iter().enumerate() {
                if count % 100 == 0 {
                    info!(count, "Merging heatmap archives");
                }
                index.attach_heatmap(&header, path);
            }
        }

        info!(
            images = index.len(),
            sessions = index.session_count(),
            "Metadata index built"
        );
        Ok(index)
    }

    fn attach_heatmap(&mut self, header: &HeatmapHeader, path: PathBuf) {
        let record = header
            .dicom_id()
            .and_then(|dicom_id| self.dicoms.get_mut(dicom_id))
            .and_then(|sessions| sessions.get_mut(&header.id));

        match record {
            Some(record) => record.heatmaps = Some(path),
            None => debug!(
                archive = %path.display(),
                img_path = %header.img_path,
                session = %header.id,
                "Heatmap references no indexed session, dropping"
            ),
        }
    }

    /// Read a cached index
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the index as JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        info!(cache = %path.display(), "Metadata cache written");
        Ok(())
    }

    pub fn insert(&mut self, dicom_id: String, session_id: String, record: SessionRecord) {
        self.dicoms
            .entry(dicom_id)
            .or_default()
            .insert(session_id, record);
    }

    /// Number of images
    pub fn len(&self) -> usize {
        self.dicoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dicoms.is_empty()
    }

    /// Number of sessions across all images
    pub fn session_count(&self) -> usize {
        self.dicoms.values().map(BTreeMap::len).sum()
    }

    /// Up to `n` image ids from the start or end of the sorted id list
    pub fn list_dicom_ids(&self, n: usize, order: Order) -> Vec<&str> {
        let n = n.min(self.dicoms.len());
        let keys = self.dicoms.keys().map(String::as_str);
        match order {
            Order::First => keys.take(n).collect(),
            Order::Last => keys.skip(self.dicoms.len() - n).collect(),
        }
    }

    /// Up to `n` distinct image ids drawn at random without replacement
    pub fn sample_dicom_ids<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<&str> {
        let n = n.min(self.dicoms.len());
        let keys: Vec<&str> = self.dicoms.keys().map(String::as_str).collect();
        rand::seq::index::sample(rng, keys.len(), n)
            .into_iter()
            .map(|i| keys[i])
            .collect()
    }

    /// Session ids recorded over `dicom_id`; empty when the image is unknown
    pub fn list_reflacx_ids(&self, dicom_id: &str) -> Vec<&str> {
        self.dicoms
            .get(dicom_id)
            .map(|sessions| sessions.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn record(&self, dicom_id: &str, session_id: &str) -> Option<&SessionRecord> {
        self.dicoms.get(dicom_id)?.get(session_id)
    }

    /// Lazily-loaded view of one session; `None` when either id is unknown
    pub fn get_sample(&self, dicom_id: &str, session_id: &str, backends: &Backends) -> Option<Sample> {
        self.record(dicom_id, session_id)
            .map(|record| Sample::new(record.clone(), backends.clone()))
    }

    /// Every `(dicom_id, session_id, record)` in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &SessionRecord)> {
        self.dicoms.iter().flat_map(|(dicom_id, sessions)| {
            sessions
                .iter()
                .map(move |(session_id, record)| (dicom_id.as_str(), session_id.as_str(), record))
        })
    }
}

impl FromIterator<(String, String, SessionRecord)> for MetadataIndex {
    fn from_iter<I: IntoIterator<Item = (String, String, SessionRecord)>>(iter: I) -> Self {
        let mut index = Self::default();
        for (dicom_id, session_id, record) in iter {
            index.insert(dicom_id, session_id, record);
        }
        index
    }
}

/// Turn one metadata row into a keyed session record
fn session_from_row(
    mut row: Row,
    sources: &IndexSources,
    main_data: &Path,
    scanner: &DirScanner,
) -> Result<(String, String, SessionRecord)> {
    let dicom_id = row
        .remove(DICOM_ID_COLUMN)
        .ok_or_else(|| reflacx_common::Error::missing_field(DICOM_ID_COLUMN))?;
    let session_id = row
        .remove(SESSION_ID_COLUMN)
        .ok_or_else(|| reflacx_common::Error::missing_field(SESSION_ID_COLUMN))?;

    let mut files = BTreeMap::new();
    for path in scanner.list_files(&main_data.join(&session_id))? {
        if let Some(key) = base_name(&path) {
            files.insert(key, path);
        }
    }

    let fields = row
        .into_iter()
        .map(|(column, cell)| {
            let value = FieldValue::from_cell(&cell);
            (column, value)
        })
        .collect();

    let record = SessionRecord {
        image: sources
            .mimic_dir
            .join(format!("{}.{}", dicom_id, IMAGE_EXTENSION)),
        heatmaps: None,
        files,
        fields,
    };

    Ok((dicom_id, session_id, record))
}

//! Lazily-loaded view over one recording session
//!
//! A [`Sample`] owns a copy of the session's [`SessionRecord`] and reads the
//! referenced files only when an accessor first needs them. Every derived
//! value is cached for the lifetime of the sample; array-valued results are
//! handed out as copies so callers cannot alter the cache.
//!
//! A sample is single-owner: accessors take `&mut self`.

use crate::error::Result;
use crate::models::{file_keys, AnomalyEllipse, BoundingBox, Fixation, SessionRecord, TimedSentence, WordToken};
use crate::overlay::{self, FixationMark, SentenceMarks};
use crate::services::aligner;
use crate::services::heatmap::{GaussianSynthesizer, HeatmapArchiveLoader, HeatmapSynthesizer, JsonHeatmapArchive};
use crate::services::image_source::{ImageSource, NoImageSource};
use ndarray::Array2;
use reflacx_common::normalize::{normalize, UNIT_RANGE};
use reflacx_common::tabular::{load_records, load_rows};
use std::sync::Arc;

/// Collaborators a sample uses to read images and heatmaps
#[derive(Clone)]
pub struct Backends {
    pub images: Arc<dyn ImageSource>,
    pub archives: Arc<dyn HeatmapArchiveLoader>,
    pub synthesizer: Arc<dyn HeatmapSynthesizer>,
}

impl Backends {
    pub fn with_images(mut self, images: Arc<dyn ImageSource>) -> Self {
        self.images = images;
        self
    }

    pub fn with_archives(mut self, archives: Arc<dyn HeatmapArchiveLoader>) -> Self {
        self.archives = archives;
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn HeatmapSynthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }
}

impl Default for Backends {
    fn default() -> Self {
        Self {
            images: Arc::new(NoImageSource),
            archives: Arc::new(JsonHeatmapArchive),
            synthesizer: Arc::new(GaussianSynthesizer::default()),
        }
    }
}

/// Heatmap of the fixations made while one sentence was spoken
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceHeatmap {
    pub title: String,
    pub image: Array2<f64>,
    pub start_t: f64,
    pub end_t: f64,
}

/// Scale a crop so it sums to 1; an all-zero crop is returned unchanged
fn to_density(mut crop: Array2<f64>) -> Array2<f64> {
    let total = crop.sum();
    if total != 0.0 {
        crop /= total;
    }
    crop
}

/// One session with lazily computed views
pub struct Sample {
    record: SessionRecord,
    backends: Backends,
    dicom_img: Option<Array2<u16>>,
    chest_bb: Option<BoundingBox>,
    fixations: Option<Vec<Fixation>>,
    timed_sentences: Option<Vec<TimedSentence>>,
    global_heatmap: Option<Array2<f64>>,
    heatmaps_by_sentence: Option<Vec<SentenceHeatmap>>,
    anomaly_ellipses: Option<Vec<AnomalyEllipse>>,
}

impl Sample {
    pub fn new(record: SessionRecord, backends: Backends) -> Self {
        Self {
            record,
            backends,
            dicom_img: None,
            chest_bb: None,
            fixations: None,
            timed_sentences: None,
            global_heatmap: None,
            heatmaps_by_sentence: None,
            anomaly_ellipses: None,
        }
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    /// Decoded raw image (rows × columns)
    pub fn dicom_image(&mut self) -> Result<Array2<u16>> {
        if let Some(img) = &self.dicom_img {
            return Ok(img.clone());
        }

        let img = self.backends.images.decode(&self.record.image)?;
        tracing::debug!(
            image = %self.record.image.display(),
            rows = img.nrows(),
            cols = img.ncols(),
            "Decoded image"
        );
        self.dicom_img = Some(img.clone());
        Ok(img)
    }

    /// First row of the chest bounding-box table
    pub fn chest_bounding_box(&mut self) -> Result<BoundingBox> {
        if let Some(bb) = self.chest_bb {
            return Ok(bb);
        }

        let path = self.record.file(file_keys::CHEST_BOUNDING_BOX)?;
        let rows = load_rows(path)?;
        let first = rows.first().ok_or_else(|| {
            reflacx_common::Error::InvalidInput(format!(
                "empty bounding box table {}",
                path.display()
            ))
        })?;
        let bb = BoundingBox::from_row(first)?;

        self.chest_bb = Some(bb);
        Ok(bb)
    }

    /// Raw image cropped to the chest bounding box
    pub fn cropped_chest_image(&mut self) -> Result<Array2<u16>> {
        let bb = self.chest_bounding_box()?;
        let img = self.dicom_image()?;
        Ok(bb.crop(img.view()))
    }

    fn ensure_fixations(&mut self) -> Result<()> {
        if self.fixations.is_some() {
            return Ok(());
        }

        let rows = load_rows(self.record.file(file_keys::FIXATIONS)?)?;
        let fixations = rows
            .iter()
            .map(Fixation::from_row)
            .collect::<reflacx_common::Result<Vec<_>>>()?;

        self.fixations = Some(fixations);
        Ok(())
    }

    /// All fixations of the session, in recorded order
    pub fn fixations(&mut self) -> Result<&[Fixation]> {
        self.ensure_fixations()?;
        Ok(self.fixations.as_deref().unwrap_or_default())
    }

    /// Fixations that landed on the image
    pub fn valid_fixations(&mut self) -> Result<impl Iterator<Item = &Fixation> + '_> {
        Ok(self.fixations()?.iter().filter(|f| f.is_valid()))
    }

    fn ensure_timed_sentences(&mut self) -> Result<()> {
        if self.timed_sentences.is_some() {
            return Ok(());
        }

        self.ensure_fixations()?;
        let transcript = std::fs::read_to_string(self.record.file(file_keys::TRANSCRIPTION)?)?;
        let tokens: Vec<WordToken> =
            load_records(self.record.file(file_keys::TIMESTAMPS_TRANSCRIPTION)?)?;

        let fixations = self.fixations.as_deref().unwrap_or_default();
        let sentences = aligner::align(&transcript, &tokens, fixations)?;

        self.timed_sentences = Some(sentences);
        Ok(())
    }

    /// Transcript sentences with their time intervals and fixations
    pub fn timed_sentences(&mut self) -> Result<&[TimedSentence]> {
        self.ensure_timed_sentences()?;
        Ok(self.timed_sentences.as_deref().unwrap_or_default())
    }

    /// Precomputed gaze heatmap rescaled to `[0, 1]`
    ///
    /// With `chest_only` the map is cropped to the chest bounding box and
    /// rescaled to sum to 1 over the crop.
    pub fn heatmap(&mut self, chest_only: bool) -> Result<Array2<f64>> {
        let heatmap = match &self.global_heatmap {
            Some(heatmap) => heatmap.clone(),
            None => {
                let raw = self.backends.archives.load_image(self.record.heatmap_path()?)?;
                let heatmap = normalize(&raw, UNIT_RANGE);
                self.global_heatmap = Some(heatmap.clone());
                heatmap
            }
        };

        if !chest_only {
            return Ok(heatmap);
        }

        let bb = self.chest_bounding_box()?;
        Ok(to_density(bb.crop(heatmap.view())))
    }

    /// One synthesized heatmap per timed sentence (sentinels included)
    ///
    /// Maps are image-sized; with `chest_only` each is cropped to the chest
    /// bounding box and rescaled to sum to 1. `start_t`/`end_t` span the
    /// sentence's fixations, or the sentence itself when it has none.
    pub fn heatmaps_by_sentence(&mut self, chest_only: bool) -> Result<Vec<SentenceHeatmap>> {
        if self.heatmaps_by_sentence.is_none() {
            let (width, height) = self.record.image_size()?;
            self.ensure_timed_sentences()?;

            let synthesizer = &self.backends.synthesizer;
            let sentences = self.timed_sentences.as_deref().unwrap_or_default();
            let maps = sentences
                .iter()
                .map(|sentence| {
                    let start_t = sentence.fixations.first().map_or(sentence.start_t, Fixation::start);
                    let end_t = sentence.fixations.last().map_or(sentence.end_t, Fixation::end);
                    SentenceHeatmap {
                        title: sentence.sentence.clone(),
                        image: synthesizer.synthesize(&sentence.fixations, width, height),
                        start_t,
                        end_t,
                    }
                })
                .collect();

            self.heatmaps_by_sentence = Some(maps);
        }
        let maps = self.heatmaps_by_sentence.clone().unwrap_or_default();

        if !chest_only {
            return Ok(maps);
        }

        let bb = self.chest_bounding_box()?;
        Ok(maps
            .into_iter()
            .map(|mut map| {
                map.image = to_density(bb.crop(map.image.view()));
                map
            })
            .collect())
    }

    /// Abnormality locations drawn by the radiologist
    pub fn anomaly_ellipses(&mut self) -> Result<Vec<AnomalyEllipse>> {
        if let Some(ellipses) = &self.anomaly_ellipses {
            return Ok(ellipses.clone());
        }

        let rows = load_rows(self.record.file(file_keys::ANOMALY_LOCATION_ELLIPSES)?)?;
        let ellipses = rows
            .iter()
            .map(AnomalyEllipse::from_row)
            .collect::<reflacx_common::Result<Vec<_>>>()?;

        self.anomaly_ellipses = Some(ellipses.clone());
        Ok(ellipses)
    }

    /// Session fixations as time-coloured overlay marks
    pub fn fixation_marks(&mut self) -> Result<Vec<FixationMark>> {
        Ok(overlay::fixation_marks(self.fixations()?))
    }

    /// Per-sentence overlay marks
    pub fn sentence_marks(&mut self) -> Result<Vec<SentenceMarks>> {
        Ok(overlay::sentence_marks(self.timed_sentences()?))
    }
}

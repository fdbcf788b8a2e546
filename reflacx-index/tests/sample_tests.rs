//! Integration tests for lazily-loaded session samples

mod common;

use common::{IMAGE_HEIGHT, IMAGE_WIDTH};
use ndarray::Array2;
use reflacx_index::models::transcript::{POST_TRANSCRIPT, PRE_TRANSCRIPT};
use reflacx_index::models::BoundingBox;
use reflacx_index::overlay::anomaly_label;
use reflacx_index::services::{ImageSource, JsonHeatmapArchive};
use reflacx_index::{Backends, Error, MetadataIndex, Sample};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Decoder returning a row-major ramp and counting calls
#[derive(Default)]
struct RampImages {
    calls: AtomicUsize,
}

impl ImageSource for RampImages {
    fn decode(&self, _path: &Path) -> reflacx_index::Result<Array2<u16>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Array2::from_shape_fn((IMAGE_HEIGHT, IMAGE_WIDTH), |(r, c)| {
            (r * IMAGE_WIDTH + c) as u16
        }))
    }
}

fn sample(ds: &common::Dataset, dicom_id: &str, session_id: &str, backends: &Backends) -> Sample {
    let index = MetadataIndex::build(&ds.sources(), &JsonHeatmapArchive).unwrap();
    index.get_sample(dicom_id, session_id, backends).unwrap()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_timed_sentences_end_to_end() {
    let ds = common::dataset();
    let mut sample = sample(&ds, "d1", "P1R1", &Backends::default());

    let sentences = sample.timed_sentences().unwrap();
    let titles: Vec<&str> = sentences.iter().map(|s| s.sentence.as_str()).collect();
    assert_eq!(
        titles,
        vec![PRE_TRANSCRIPT, "No effusion", "Heart normal", POST_TRANSCRIPT]
    );

    assert_eq!((sentences[0].start_t, sentences[0].end_t), (0.5, 0.8));
    assert_eq!((sentences[1].start_t, sentences[1].end_t), (1.0, 2.0));
    assert_eq!((sentences[2].start_t, sentences[2].end_t), (3.0, 4.0));
    assert_eq!((sentences[3].start_t, sentences[3].end_t), (4.5, 5.0));

    assert!(sentences.iter().all(|s| s.fixations.len() == 1));
    assert_eq!(sentences[1].fixations[0].x_position, 50.0);
    // ends exactly at the sentence end
    assert_eq!(sentences[2].fixations[0].end(), 4.0);
    assert!(sentences[0].is_sentinel() && sentences[3].is_sentinel());
}

#[test]
fn test_fixations_keep_invalid_rows_and_extra_columns() {
    let ds = common::dataset();
    let mut sample = sample(&ds, "d1", "P1R1", &Backends::default());

    let fixations = sample.fixations().unwrap();
    assert_eq!(fixations.len(), 5);
    assert_eq!(
        fixations[0].extra.get("pupil_area_normalized").map(String::as_str),
        Some("0.9")
    );

    assert_eq!(sample.valid_fixations().unwrap().count(), 4);
}

#[test]
fn test_results_are_cached() {
    let ds = common::dataset();
    let images = Arc::new(RampImages::default());
    let backends = Backends::default().with_images(images.clone());
    let mut sample = sample(&ds, "d1", "P1R1", &backends);

    let first = sample.timed_sentences().unwrap().to_vec();
    let ellipses = sample.anomaly_ellipses().unwrap();
    sample.dicom_image().unwrap();

    std::fs::remove_dir_all(ds.session_dir("P1R1")).unwrap();

    assert_eq!(sample.timed_sentences().unwrap(), first.as_slice());
    assert_eq!(sample.anomaly_ellipses().unwrap(), ellipses);
    sample.dicom_image().unwrap();
    assert_eq!(images.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_missing_auxiliary_file() {
    let ds = common::dataset();
    let mut sample = sample(&ds, "d1", "P1R2", &Backends::default());

    assert_eq!(sample.fixations().unwrap().len(), 1);

    let err = sample.timed_sentences().unwrap_err();
    assert!(matches!(
        err,
        Error::Common(reflacx_common::Error::MissingFile { ref key }) if key == "transcription"
    ));

    let err = sample.heatmap(false).unwrap_err();
    assert!(matches!(
        err,
        Error::Common(reflacx_common::Error::MissingFile { ref key }) if key == "heatmaps"
    ));
}

#[test]
fn test_chest_bounding_box_and_ellipses() {
    let ds = common::dataset();
    let mut sample = sample(&ds, "d1", "P1R1", &Backends::default());

    assert_eq!(
        sample.chest_bounding_box().unwrap(),
        BoundingBox {
            xmin: 20,
            ymin: 10,
            xmax: 120,
            ymax: 90
        }
    );

    let ellipses = sample.anomaly_ellipses().unwrap();
    assert_eq!(ellipses.len(), 1);
    assert_eq!(ellipses[0].labels, vec!["Atelectasis".to_string()]);
    assert_eq!(ellipses[0].certainty, Some(4.0));
    assert_eq!(ellipses[0].center(), (55.0, 40.0));
    assert_eq!(anomaly_label(&ellipses[0]), "Atelectasis");
}

#[test]
fn test_image_requires_decoder() {
    let ds = common::dataset();
    let mut sample = sample(&ds, "d1", "P1R1", &Backends::default());

    assert!(matches!(sample.dicom_image(), Err(Error::Decode(_))));
}

#[test]
fn test_cropped_chest_image() {
    let ds = common::dataset();
    let backends = Backends::default().with_images(Arc::new(RampImages::default()));
    let mut sample = sample(&ds, "d1", "P1R1", &backends);

    let full = sample.dicom_image().unwrap();
    assert_eq!(full.dim(), (IMAGE_HEIGHT, IMAGE_WIDTH));

    let crop = sample.cropped_chest_image().unwrap();
    assert_eq!(crop.dim(), (80, 100));
    assert_eq!(crop[[0, 0]], full[[10, 20]]);
    assert_eq!(crop[[79, 99]], full[[89, 119]]);
}

#[test]
fn test_heatmap_normalized_and_cropped() {
    let ds = common::dataset();
    let mut sample = sample(&ds, "d1", "P1R1", &Backends::default());

    let full = sample.heatmap(false).unwrap();
    assert_eq!(full.dim(), (IMAGE_HEIGHT, IMAGE_WIDTH));
    assert_close(full.fold(f64::INFINITY, |a, &b| a.min(b)), 0.0);
    assert_close(full.fold(f64::NEG_INFINITY, |a, &b| a.max(b)), 1.0);

    let chest = sample.heatmap(true).unwrap();
    assert_eq!(chest.dim(), (80, 100));
    assert_close(chest.sum(), 1.0);

    // the cached full map is not altered by cropping
    assert_eq!(sample.heatmap(false).unwrap(), full);
}

#[test]
fn test_heatmaps_by_sentence() {
    let ds = common::dataset();
    let mut sample = sample(&ds, "d1", "P1R1", &Backends::default());

    let maps = sample.heatmaps_by_sentence(false).unwrap();
    assert_eq!(maps.len(), 4);
    for map in &maps {
        assert_eq!(map.image.dim(), (IMAGE_HEIGHT, IMAGE_WIDTH));
        assert_close(map.image.sum(), 1.0);
    }
    assert_eq!(maps[1].title, "No effusion");
    assert_eq!((maps[1].start_t, maps[1].end_t), (1.1, 1.9));

    let chest = sample.heatmaps_by_sentence(true).unwrap();
    assert_eq!(chest.len(), 4);
    for map in &chest {
        assert_eq!(map.image.dim(), (80, 100));
        assert_close(map.image.sum(), 1.0);
    }

    // chest crops come from the cached full maps
    assert_eq!(sample.heatmaps_by_sentence(false).unwrap(), maps);
}

#[test]
fn test_overlay_marks() {
    let ds = common::dataset();
    let mut sample = sample(&ds, "d1", "P1R1", &Backends::default());

    let marks = sample.fixation_marks().unwrap();
    assert_eq!(marks.len(), 4);
    assert!(marks.iter().all(|m| (0.0..=1.0).contains(&m.ratio)));

    let by_sentence = sample.sentence_marks().unwrap();
    assert_eq!(by_sentence.len(), 4);
    assert_eq!(by_sentence[2].title, "Heart normal");
    assert_eq!(by_sentence[2].marks[0].ratio, 0.0);
}

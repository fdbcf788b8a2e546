//! Renderer-agnostic overlay descriptions
//!
//! Drawing happens outside this crate. These helpers compute what a renderer
//! needs to paint: where each fixation goes and the colour-map position
//! (`ratio` in `[0, 1]`) it should take. Off-image fixations never produce a
//! mark.

use crate::models::{AnomalyEllipse, Fixation, TimedSentence};

/// One fixation to draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixationMark {
    pub x: f64,
    pub y: f64,
    /// Colour-map position
    pub ratio: f64,
}

/// Marks for one timed sentence
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceMarks {
    pub title: String,
    pub marks: Vec<FixationMark>,
}

/// Marks for a whole session, coloured by time
///
/// `ratio` is each fixation's midpoint relative to the session span (first
/// fixation start to last fixation end). A zero-length span maps everything
/// to 0.
pub fn fixation_marks(fixations: &[Fixation]) -> Vec<FixationMark> {
    let (first, last) = match (fixations.first(), fixations.last()) {
        (Some(first), Some(last)) => (first.start(), last.end()),
        _ => return Vec::new(),
    };
    let span = last - first;

    fixations
        .iter()
        .filter(|f| f.is_valid())
        .map(|f| FixationMark {
            x: f.x_position,
            y: f.y_position,
            ratio: if span != 0.0 {
                (f.midpoint() - first) / span
            } else {
                0.0
            },
        })
        .collect()
}

/// Marks per sentence, coloured by order within the sentence
///
/// The i-th fixation of a sentence with n fixations gets `i / max(1, n - 1)`.
pub fn sentence_marks(sentences: &[TimedSentence]) -> Vec<SentenceMarks> {
    sentences
        .iter()
        .map(|sentence| {
            let valid: Vec<&Fixation> = sentence.fixations.iter().filter(|f| f.is_valid()).collect();
            let denominator = valid.len().saturating_sub(1).max(1) as f64;
            let marks = valid
                .iter()
                .enumerate()
                .map(|(i, f)| FixationMark {
                    x: f.x_position,
                    y: f.y_position,
                    ratio: i as f64 / denominator,
                })
                .collect();

            SentenceMarks {
                title: sentence.sentence.clone(),
                marks,
            }
        })
        .collect()
}

/// Caption for an anomaly ellipse: its findings joined with `", "`
pub fn anomaly_label(ellipse: &AnomalyEllipse) -> String {
    ellipse.labels.join(", ")
}

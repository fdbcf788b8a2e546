//! Transcript tokens and time-aligned sentences

use super::Fixation;
use serde::{Deserialize, Serialize};

/// Text of the sentinel holding fixations before the first sentence
pub const PRE_TRANSCRIPT: &str = "_pre_transcript";
/// Text of the sentinel holding fixations after the last sentence
pub const POST_TRANSCRIPT: &str = "_post_transcript";
/// Word marking a sentence boundary in the timestamp table
pub const BOUNDARY_WORD: &str = ".";

/// One row of the word-timestamp table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordToken {
    pub word: String,
    pub timestamp_start_word: f64,
    pub timestamp_end_word: f64,
}

impl WordToken {
    pub fn new(word: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            word: word.into(),
            timestamp_start_word: start,
            timestamp_end_word: end,
        }
    }

    pub fn is_boundary(&self) -> bool {
        self.word == BOUNDARY_WORD
    }
}

/// Origin of a timed sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentenceKind {
    /// A sentence from the transcript
    Spoken,
    /// Fixations before the first sentence started
    PreTranscript,
    /// Fixations after the last sentence ended
    PostTranscript,
}

/// A transcript sentence (or sentinel) with its time interval and the
/// fixations assigned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSentence {
    pub start_t: f64,
    pub end_t: f64,
    pub sentence: String,
    pub kind: SentenceKind,
    pub fixations: Vec<Fixation>,
}

impl TimedSentence {
    pub fn spoken(start_t: f64, end_t: f64, sentence: impl Into<String>) -> Self {
        Self {
            start_t,
            end_t,
            sentence: sentence.into(),
            kind: SentenceKind::Spoken,
            fixations: Vec::new(),
        }
    }

    /// Sentinel spanning the first buffered start to the last buffered end
    ///
    /// Returns `None` for an empty buffer.
    pub fn sentinel(kind: SentenceKind, fixations: Vec<Fixation>) -> Option<Self> {
        let first = fixations.first()?;
        let last = fixations.last()?;
        let sentence = match kind {
            SentenceKind::PreTranscript => PRE_TRANSCRIPT,
            SentenceKind::PostTranscript => POST_TRANSCRIPT,
            SentenceKind::Spoken => return None,
        };

        Some(Self {
            start_t: first.start(),
            end_t: last.end(),
            sentence: sentence.to_string(),
            kind,
            fixations,
        })
    }

    pub fn is_sentinel(&self) -> bool {
        self.kind != SentenceKind::Spoken
    }
}

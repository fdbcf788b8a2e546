//! Data models for sessions, gaze and transcripts

pub mod annotations;
pub mod fixation;
pub mod session;
pub mod transcript;

pub use annotations::{AnomalyEllipse, BoundingBox};
pub use fixation::Fixation;
pub use session::{file_keys, FieldValue, SessionRecord};
pub use transcript::{SentenceKind, TimedSentence, WordToken};

//! reflacx-index library interface
//!
//! Indexes the REFLACX eye-tracking dataset and aligns each session's spoken
//! report with its gaze fixations.
//!
//! - [`MetadataIndex`]: dicom_id → session_id → [`SessionRecord`], built once
//!   from the dataset directories and cached as JSON
//! - [`Sample`]: lazily-loaded view over one session
//! - [`services::aligner`]: sentence / fixation temporal alignment

pub mod error;
pub mod models;
pub mod overlay;
pub mod sample;
pub mod services;

pub use crate::error::{AlignError, Error, Result};
pub use crate::models::{Fixation, SessionRecord, TimedSentence};
pub use crate::sample::{Backends, Sample, SentenceHeatmap};
pub use crate::services::metadata_index::{IndexSources, MetadataIndex, Order};

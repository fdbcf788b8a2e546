//! Error types for reflacx-index
//!
//! Library operations return [`Error`]; the binary wraps it in `anyhow`.

use thiserror::Error;

/// Sentence/fixation alignment failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignError {
    /// Timestamp table has no tokens at all
    #[error("Transcript has no word tokens")]
    EmptyTranscript,

    /// Number of `.` boundary tokens differs from the number of sentences in
    /// the transcript text
    #[error("Transcript has {fragments} sentence(s) but {boundaries} boundary token(s)")]
    FragmentMismatch { boundaries: usize, fragments: usize },
}

/// Main error type for reflacx-index
#[derive(Error, Debug)]
pub enum Error {
    /// Errors from shared loaders and config
    #[error(transparent)]
    Common(#[from] reflacx_common::Error),

    /// Transcript could not be aligned
    #[error("Alignment error: {0}")]
    Alignment(#[from] AlignError),

    /// Dataset directory could not be enumerated
    #[error("Scan error: {0}")]
    Scan(#[from] crate::services::dir_scanner::ScanError),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache or archive JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decoding failed
    #[error("Image decode error: {0}")]
    Decode(String),
}

/// Convenience Result type using reflacx-index Error
pub type Result<T> = std::result::Result<T, Error>;

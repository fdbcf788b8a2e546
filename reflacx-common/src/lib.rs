//! # REFLACX Common Library
//!
//! Shared code for the REFLACX gaze tooling including:
//! - Error types
//! - Bootstrap configuration loading
//! - Logging initialisation
//! - Tabular (CSV) loading
//! - Array normalisation

pub mod config;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod tabular;

pub use error::{Error, Result};
pub use tabular::Row;

//! Indexing and alignment services

pub mod aligner;
pub mod dir_scanner;
pub mod heatmap;
pub mod image_source;
pub mod metadata_index;

pub use dir_scanner::{DirScanner, ScanError};
pub use heatmap::{GaussianSynthesizer, HeatmapArchiveLoader, HeatmapSynthesizer, JsonHeatmapArchive};
pub use image_source::{ImageSource, NoImageSource};
pub use metadata_index::{IndexSources, MetadataIndex, Order};

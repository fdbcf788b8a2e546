//! Bootstrap configuration loading and dataset path resolution
//!
//! Configuration is a small TOML file. Every value may be overridden from the
//! command line or the environment; resolution priority for each path is:
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback, where one exists)
//!
//! A missing config file is not an error: a warning is logged and the
//! compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "REFLACX_CONFIG";
/// Environment variable overriding the REFLACX dataset root
pub const REFLACX_DIR_ENV_VAR: &str = "REFLACX_DIR";
/// Environment variable overriding the MIMIC image root
pub const MIMIC_DIR_ENV_VAR: &str = "REFLACX_MIMIC_DIR";
/// Environment variable overriding the metadata cache file
pub const CACHE_PATH_ENV_VAR: &str = "REFLACX_CACHE_PATH";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// REFLACX dataset root (contains `main_data` and `heatmaps_phase_*`)
    #[serde(default)]
    pub reflacx_dir: Option<PathBuf>,

    /// Root folder of the raw chest X-ray images
    #[serde(default)]
    pub mimic_dir: Option<PathBuf>,

    /// Metadata cache file (JSON)
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Name of the session-data directory inside `reflacx_dir`
    #[serde(default = "default_main_data_dir")]
    pub main_data_dir: String,

    /// Substring selecting metadata tables inside the session-data directory
    #[serde(default = "default_metadata_search_term")]
    pub metadata_search_term: String,

    /// Substring selecting heatmap directories inside `reflacx_dir`
    #[serde(default = "default_heatmaps_search_term")]
    pub heatmaps_search_term: String,

    /// Drop sessions whose eye-tracking data was flagged as discarded
    #[serde(default = "default_true")]
    pub exclude_invalid_eyetracking: bool,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-sentence heatmap synthesis (optional)
    #[serde(default)]
    pub heatmap: HeatmapConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Gaussian heatmap synthesis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapConfig {
    /// Standard deviation of the per-fixation kernel, in pixels
    #[serde(default = "default_sigma")]
    pub sigma: f64,
}

fn default_main_data_dir() -> String {
    "main_data".to_string()
}

fn default_metadata_search_term() -> String {
    "metadata".to_string()
}

fn default_heatmaps_search_term() -> String {
    "heatmaps_phase_".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sigma() -> f64 {
    150.0
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            reflacx_dir: None,
            mimic_dir: None,
            cache_path: None,
            main_data_dir: default_main_data_dir(),
            metadata_search_term: default_metadata_search_term(),
            heatmaps_search_term: default_heatmaps_search_term(),
            exclude_invalid_eyetracking: true,
            logging: LoggingConfig::default(),
            heatmap: HeatmapConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl HeatmapConfig {
    /// `sigma` must be a positive, finite pixel count
    pub fn validate(&self) -> Result<()> {
        if !self.sigma.is_finite() || self.sigma <= 0.0 {
            return Err(Error::Config(format!(
                "heatmap sigma must be positive and finite, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            sigma: default_sigma(),
        }
    }
}

impl TomlConfig {
    /// Parse a config document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.heatmap.validate()?;
        Ok(config)
    }

    /// Load config from `path`
    ///
    /// A missing file yields the compiled defaults; a file that exists but
    /// cannot be parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                path = %path.display(),
                "Config file not found, using compiled defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Locate and load the config file, falling back to defaults
    pub fn discover(cli_arg: Option<&Path>) -> Result<Self> {
        match config_file_path(cli_arg) {
            Some(path) => Self::load(&path),
            None => {
                debug!("No config file located, using compiled defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Config file location, in priority order:
/// 1. `--config` argument
/// 2. `REFLACX_CONFIG` environment variable
/// 3. `<user config dir>/reflacx/config.toml`, if it exists
pub fn config_file_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }

    dirs::config_dir()
        .map(|d| d.join("reflacx").join("config.toml"))
        .filter(|p| p.exists())
}

/// Resolve one path setting following the priority order above
pub fn resolve_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config_value: Option<&Path>,
) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return Some(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    config_value.map(Path::to_path_buf)
}

/// Default location of the metadata cache file
pub fn default_cache_path() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("reflacx").join("metadata.json"))
        .unwrap_or_else(|| PathBuf::from("./reflacx_metadata.json"))
}

/// Fully resolved dataset locations
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetPaths {
    pub reflacx_dir: PathBuf,
    pub mimic_dir: PathBuf,
    pub cache_path: PathBuf,
}

impl DatasetPaths {
    /// Resolve dataset locations from CLI overrides, environment and config
    ///
    /// The dataset roots have no compiled default; leaving one unset is a
    /// configuration error. The cache path falls back to the user cache dir.
    pub fn resolve(
        config: &TomlConfig,
        reflacx_dir: Option<&Path>,
        mimic_dir: Option<&Path>,
        cache_path: Option<&Path>,
    ) -> Result<Self> {
        let reflacx_dir = resolve_path(
            reflacx_dir,
            REFLACX_DIR_ENV_VAR,
            config.reflacx_dir.as_deref(),
        )
        .ok_or_else(|| Error::Config("reflacx_dir is not configured".to_string()))?;

        let mimic_dir = resolve_path(mimic_dir, MIMIC_DIR_ENV_VAR, config.mimic_dir.as_deref())
            .ok_or_else(|| Error::Config("mimic_dir is not configured".to_string()))?;

        let cache_path = resolve_path(cache_path, CACHE_PATH_ENV_VAR, config.cache_path.as_deref())
            .unwrap_or_else(default_cache_path);

        Ok(Self {
            reflacx_dir,
            mimic_dir,
            cache_path,
        })
    }
}

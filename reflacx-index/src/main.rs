//! reflacx-index - REFLACX dataset indexer
//!
//! Builds (or loads) the cached metadata index and queries it:
//! - `build`: generate the index and write the cache
//! - `list`: list image ids
//! - `sessions`: list the sessions recorded over one image
//! - `show`: print one session's sentences with their fixations

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use reflacx_common::config::{DatasetPaths, TomlConfig};
use reflacx_common::logging::init_tracing;
use reflacx_index::services::{GaussianSynthesizer, JsonHeatmapArchive};
use reflacx_index::{Backends, IndexSources, MetadataIndex, Order};

/// Command-line arguments for reflacx-index
#[derive(Parser, Debug)]
#[command(name = "reflacx-index")]
#[command(about = "Index and inspect the REFLACX eye-tracking dataset")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "REFLACX_CONFIG")]
    config: Option<PathBuf>,

    /// REFLACX dataset root (overrides config)
    #[arg(long)]
    reflacx_dir: Option<PathBuf>,

    /// Raw image root (overrides config)
    #[arg(long)]
    mimic_dir: Option<PathBuf>,

    /// Metadata cache file (overrides config)
    #[arg(long)]
    cache_path: Option<PathBuf>,

    /// Keep sessions whose eye-tracking data was flagged as discarded
    #[arg(long)]
    include_discarded: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the metadata index and write the cache
    Build {
        /// Rebuild even if the cache already exists
        #[arg(long)]
        force: bool,
    },
    /// List image ids
    List {
        /// Number of ids to list
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,

        /// Take ids from the end of the list
        #[arg(long, conflicts_with = "random")]
        last: bool,

        /// Pick ids at random
        #[arg(long)]
        random: bool,

        /// Seed for --random
        #[arg(long, requires = "random")]
        seed: Option<u64>,
    },
    /// List the sessions recorded over one image
    Sessions { dicom_id: String },
    /// Print one session's timed sentences
    Show {
        dicom_id: String,
        session_id: String,

        /// Print the sentences as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        TomlConfig::discover(args.config.as_deref()).context("Failed to load configuration")?;
    if args.include_discarded {
        config.exclude_invalid_eyetracking = false;
    }

    init_tracing(&config.logging)?;
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let paths = DatasetPaths::resolve(
        &config,
        args.reflacx_dir.as_deref(),
        args.mimic_dir.as_deref(),
        args.cache_path.as_deref(),
    )
    .context("Failed to resolve dataset paths")?;
    info!("REFLACX root: {}", paths.reflacx_dir.display());
    info!("Metadata cache: {}", paths.cache_path.display());

    let sources = IndexSources::from_config(&config, &paths);
    let backends = Backends::default()
        .with_synthesizer(Arc::new(GaussianSynthesizer::new(config.heatmap.sigma)));

    let index = match args.command {
        Command::Build { force: true } => {
            let index = MetadataIndex::build(&sources, &JsonHeatmapArchive)
                .context("Failed to build metadata index")?;
            index.save(&paths.cache_path)?;
            index
        }
        _ => MetadataIndex::load_or_build(&paths.cache_path, &sources, &JsonHeatmapArchive)
            .context("Failed to load metadata index")?,
    };

    match args.command {
        Command::Build { .. } => {
            println!(
                "{} images, {} sessions",
                index.len(),
                index.session_count()
            );
        }
        Command::List {
            count,
            last,
            random,
            seed,
        } => {
            let ids = if random {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                index.sample_dicom_ids(count, &mut rng)
            } else if last {
                index.list_dicom_ids(count, Order::Last)
            } else {
                index.list_dicom_ids(count, Order::First)
            };
            for id in ids {
                println!("{}", id);
            }
        }
        Command::Sessions { dicom_id } => {
            for id in index.list_reflacx_ids(&dicom_id) {
                println!("{}", id);
            }
        }
        Command::Show {
            dicom_id,
            session_id,
            json,
        } => {
            let mut sample = index
                .get_sample(&dicom_id, &session_id, &backends)
                .with_context(|| format!("No session {} for image {}", session_id, dicom_id))?;

            let sentences = sample
                .timed_sentences()
                .context("Failed to align transcript with fixations")?;

            if json {
                println!("{}", serde_json::to_string_pretty(sentences)?);
            } else {
                for sentence in sentences {
                    println!(
                        "[{:>8.3} - {:>8.3}] {:>3} fixations  {}",
                        sentence.start_t,
                        sentence.end_t,
                        sentence.fixations.len(),
                        sentence.sentence
                    );
                }
            }
        }
    }

    Ok(())
}

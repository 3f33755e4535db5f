use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use dataset_prep::{
    build_rng, run_count, run_list, run_merge, run_split, ConfigError, PipelineConfig,
};

/// Merge partitioned image class folders and split them into
/// train/validation/test sets.
#[derive(Debug, Parser)]
#[command(name = "dataset-prep", version, about)]
struct Cli {
    /// JSON config file; defaults to the per-user config when present
    #[arg(long, global = true, env = "DATASET_PREP_CONFIG")]
    config: Option<PathBuf>,

    /// Log level filter (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Directory for the timestamped log file
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log to stdout only
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Args)]
struct Overrides {
    /// Directory holding the source partitions
    #[arg(long, global = true)]
    source_root: Option<PathBuf>,

    /// Source partition name (repeatable)
    #[arg(long = "partition", global = true)]
    partitions: Vec<String>,

    #[arg(long, global = true)]
    merge_root: Option<PathBuf>,

    #[arg(long, global = true)]
    destination: Option<PathBuf>,

    /// Class count report (Product,Total_Count)
    #[arg(long, global = true)]
    counts: Option<PathBuf>,

    /// Classes need strictly more files than this to be split
    #[arg(long, global = true)]
    min_count: Option<u64>,

    /// Fixed shuffle seed for a reproducible split
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge the source partitions into one folder per class
    Merge,
    /// Export the distinct class names found in the merged dataset
    List {
        /// Output CSV (defaults to the configured class list path)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Count merged files per class and write the count report
    Count,
    /// Split the eligible classes into train/validation/test
    Split,
    /// Merge, count and split in one go
    Run,
    /// Write the effective configuration as JSON
    InitConfig {
        /// Destination (defaults to the per-user config path)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

impl Overrides {
    fn apply(self, config: &mut PipelineConfig) {
        if let Some(root) = self.source_root {
            config.source_root = root;
        }
        if !self.partitions.is_empty() {
            config.partitions = self.partitions;
        }
        if let Some(root) = self.merge_root {
            config.merge_root = root;
        }
        if let Some(root) = self.destination {
            config.destination_root = root;
        }
        if let Some(path) = self.counts {
            config.class_counts_path = path;
        }
        if let Some(min) = self.min_count {
            config.minimum_count = min;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

/// Load the explicit config strictly, or the per-user config leniently.
/// The second value is why the per-user config was not used, if it wasn't.
fn load_config(cli: &Cli) -> Result<(PipelineConfig, Option<ConfigError>)> {
    match &cli.config {
        Some(path) => PipelineConfig::load_from(path)
            .map(|config| (config, None))
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(PipelineConfig::load_user()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // The config picks the log level and directory, so it is read first
    let (mut config, fallback) = load_config(&cli)?;
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    let log_dir = if cli.no_log_file {
        None
    } else {
        Some(cli.log_dir.clone().unwrap_or_else(|| config.log_dir.clone()))
    };
    dataset_prep::logging::setup_logging(&level, log_dir.as_deref())
        .context("failed to initialize logging")?;

    match (&cli.config, fallback) {
        (Some(path), _) => info!("Loaded config from {:?}", path),
        (None, Some(reason)) => warn!("{}. Using defaults.", reason),
        (None, None) => {}
    }

    cli.overrides.apply(&mut config);
    config.validate().context("invalid configuration")?;

    info!("Starting dataset preparation: {:?}", cli.command);

    match cli.command {
        Command::Merge => {
            let report = run_merge(&config);
            info!(
                "A total of {} files were copied to {:?}",
                report.files_copied, config.merge_root
            );
        }
        Command::List { output } => {
            let output = output.unwrap_or_else(|| config.class_list_path.clone());
            let tally = run_list(&config, &output)?;
            info!("Total unique classes: {}", tally.len());
        }
        Command::Count => {
            run_count(&config)?;
        }
        Command::Split => {
            let mut rng = build_rng(config.seed);
            run_split(&config, &mut rng)?;
        }
        Command::Run => {
            let report = run_merge(&config);
            if report.files_copied == 0 {
                warn!(
                    "Merge copied no files, continuing with the contents of {:?}",
                    config.merge_root
                );
            }
            run_count(&config)?;
            let mut rng = build_rng(config.seed);
            run_split(&config, &mut rng)?;
        }
        Command::InitConfig { path } => {
            let path = path
                .or_else(PipelineConfig::user_config_path)
                .context("could not determine a config path")?;
            config.save(&path)?;
        }
    }

    info!("Dataset preparation finished");
    Ok(())
}

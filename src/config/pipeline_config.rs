use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::scanner::SourcePartition;
use crate::core::splitter::SplitRatios;

/// Pipeline configuration shared by every stage.
///
/// Defaults reproduce the usual working-directory layout: `fine_train`,
/// `fine_test` and `fine_val` merged into `merged_dataset`, then split
/// into `dataset/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the source partitions
    pub source_root: PathBuf,

    /// Names of the source partitions under `source_root`
    pub partitions: Vec<String>,

    /// Unified per-class layout produced by the merge
    pub merge_root: PathBuf,

    /// Root of the train/validation/test tree
    pub destination_root: PathBuf,

    /// Class count report read by the split stage
    pub class_counts_path: PathBuf,

    /// Class name export written by `list`
    pub class_list_path: PathBuf,

    /// Classes need strictly more files than this to be split
    pub minimum_count: u64,

    pub ratios: SplitRatios,

    /// Fixed shuffle seed; a fresh random seed is used when unset
    pub seed: Option<u64>,

    pub log_level: String,

    pub log_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("."),
            partitions: vec![
                "fine_train".to_string(),
                "fine_test".to_string(),
                "fine_val".to_string(),
            ],
            merge_root: PathBuf::from("merged_dataset"),
            destination_root: PathBuf::from("dataset"),
            class_counts_path: PathBuf::from("product_counts_report.csv"),
            class_list_path: PathBuf::from("product_list_report.csv"),
            minimum_count: 50,
            ratios: SplitRatios::default(),
            seed: None,
            log_level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// Errors loading or validating a configuration
#[derive(Debug)]
pub enum ConfigError {
    Read(PathBuf, std::io::Error),
    Write(PathBuf, std::io::Error),
    Parse(PathBuf, serde_json::Error),
    Invalid(String),
    NoConfigDir,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read(path, e) => write!(f, "Cannot read config {:?}: {}", path, e),
            ConfigError::Write(path, e) => write!(f, "Cannot write config {:?}: {}", path, e),
            ConfigError::Parse(path, e) => write!(f, "Invalid config {:?}: {}", path, e),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::NoConfigDir => write!(f, "Could not determine config directory"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl PipelineConfig {
    /// Per-user config file location, e.g. `~/.config/dataset-prep/config.json`
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dataset-prep").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load a config file that was asked for explicitly. Missing or
    /// malformed files are errors.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading config from: {:?}", path);
        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        serde_json::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    /// Load the per-user config, or fall back to defaults.
    ///
    /// The second value is the reason defaults were used when the file
    /// exists but could not be read or parsed. A missing file is not an
    /// error. Nothing is logged; the caller reports the reason once logging
    /// is set up.
    pub fn load_user() -> (Self, Option<ConfigError>) {
        match Self::user_config_path() {
            Some(path) => Self::load_or_default(&path),
            None => (Self::default(), Some(ConfigError::NoConfigDir)),
        }
    }

    /// Load `path`, or return defaults together with the reason the file
    /// was not used. A missing file yields defaults and no reason.
    pub fn load_or_default(path: &Path) -> (Self, Option<ConfigError>) {
        match Self::load_from(path) {
            Ok(config) => (config, None),
            Err(ConfigError::Read(_, e)) if e.kind() == std::io::ErrorKind::NotFound => {
                (Self::default(), None)
            }
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Save the config as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write(parent.to_path_buf(), e))?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        fs::write(path, json).map_err(|e| ConfigError::Write(path.to_path_buf(), e))?;
        info!("Config saved to: {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.ratios.is_valid() {
            return Err(ConfigError::Invalid(format!(
                "split ratios must lie in [0, 1] and sum to at most 1 (train {}, validation {})",
                self.ratios.train, self.ratios.validation
            )));
        }
        if self.partitions.is_empty() {
            return Err(ConfigError::Invalid("no source partitions configured".to_string()));
        }
        if let Some(name) = self.partitions.iter().find(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("empty partition name {:?}", name)));
        }
        Ok(())
    }

    /// The configured partitions resolved under `source_root`
    pub fn source_partitions(&self) -> Vec<SourcePartition> {
        self.partitions
            .iter()
            .map(|name| SourcePartition::under(&self.source_root, name))
            .collect()
    }
}

//! Stage orchestration: merge, census, and split.
//!
//! Each stage is driven from a [`PipelineConfig`]. Per-item problems are
//! logged and skipped inside the stages; the only fatal condition is an
//! unreadable or malformed class count report, which stops the split
//! before any class is touched.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info, info_span, warn};

use crate::config::PipelineConfig;
use crate::core::catalog::{read_class_counts, write_class_counts, CatalogError};
use crate::core::census::{count_class_files, scan_class_folders, write_class_list, ClassTally};
use crate::core::dataset::DatasetSplit;
use crate::core::filter::filter_classes;
use crate::core::materializer::materialize;
use crate::core::merger::{merge, MergeReport};
use crate::core::splitter::split_class;

/// Errors that abort a pipeline stage
#[derive(Debug)]
pub enum PipelineError {
    /// The class count report is missing or malformed
    ClassCounts(CatalogError),
    /// A report could not be written
    Report(CatalogError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::ClassCounts(e) => write!(f, "Cannot load class counts: {}", e),
            PipelineError::Report(e) => write!(f, "Cannot write report: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::ClassCounts(e) | PipelineError::Report(e) => Some(e),
        }
    }
}

/// Totals of a split run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSummary {
    /// Classes that passed the count filter
    pub classes_selected: usize,
    /// Report rows at or below the minimum count
    pub classes_excluded: usize,
    /// Classes that contributed files to the destination tree
    pub classes_split: usize,
    /// Selected classes skipped as missing, unreadable or empty
    pub classes_skipped: usize,
    /// Files assigned per split
    pub per_split: BTreeMap<DatasetSplit, usize>,
    pub files_copied: usize,
    pub files_failed: usize,
}

impl SplitSummary {
    pub fn assigned(&self, split: DatasetSplit) -> usize {
        self.per_split.get(&split).copied().unwrap_or(0)
    }
}

/// Random source for the split stage: seeded when `seed` is set, freshly
/// seeded from the OS otherwise.
pub fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            info!("Using fixed shuffle seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}

/// Merge the configured source partitions into the merge root.
pub fn run_merge(config: &PipelineConfig) -> MergeReport {
    let _span = info_span!("merge").entered();
    merge(&config.source_partitions(), &config.merge_root)
}

/// Count files per merged class and write the class count report.
pub fn run_count(config: &PipelineConfig) -> Result<ClassTally, PipelineError> {
    let _span = info_span!("count").entered();
    let roots = vec![config.merge_root.clone()];
    let tally = count_class_files(&roots, ClassTally::new());

    write_class_counts(&config.class_counts_path, &tally.counts()).map_err(PipelineError::Report)?;
    info!(
        "Counted {} classes into {:?}",
        tally.len(),
        config.class_counts_path
    );
    Ok(tally)
}

/// Export the distinct class names found under the merge root.
pub fn run_list(config: &PipelineConfig, output: &Path) -> Result<ClassTally, PipelineError> {
    let _span = info_span!("list").entered();
    let roots = vec![config.merge_root.clone()];
    let tally = scan_class_folders(&roots, ClassTally::new());

    if tally.is_empty() {
        warn!("No class folders found under {:?}", config.merge_root);
    }
    write_class_list(output, &tally.class_names()).map_err(PipelineError::Report)?;
    Ok(tally)
}

/// Filter classes by the count report and split each one into the
/// destination tree.
///
/// # Errors
/// Fails before touching any class when the class count report cannot be
/// read or validated.
pub fn run_split<R: Rng + ?Sized>(
    config: &PipelineConfig,
    rng: &mut R,
) -> Result<SplitSummary, PipelineError> {
    let _span = info_span!("split").entered();

    let counts = read_class_counts(&config.class_counts_path).map_err(|e| {
        error!("{}", e);
        PipelineError::ClassCounts(e)
    })?;
    let selected = filter_classes(&counts, config.minimum_count);
    info!(
        "Found {} classes with more than {} files",
        selected.len(),
        config.minimum_count
    );

    let mut summary = SplitSummary {
        classes_selected: selected.len(),
        classes_excluded: counts
            .iter()
            .filter(|row| row.total_count <= config.minimum_count)
            .count(),
        ..SplitSummary::default()
    };

    for class_name in &selected {
        let _class_span = info_span!("class", name = %class_name).entered();

        if !config.merge_root.join(class_name).is_dir() {
            warn!("Source directory not found for '{}', skipping", class_name);
            summary.classes_skipped += 1;
            continue;
        }

        let assignment = match split_class(class_name, &config.merge_root, &config.ratios, rng) {
            Ok(assignment) => assignment,
            Err(e) => {
                error!("Could not read files for '{}': {}, skipping", class_name, e);
                summary.classes_skipped += 1;
                continue;
            }
        };

        if assignment.is_empty() {
            summary.classes_skipped += 1;
            continue;
        }

        for (split, files) in assignment.iter() {
            *summary.per_split.entry(split).or_insert(0) += files.len();
        }

        let report = materialize(
            class_name,
            &assignment,
            &config.merge_root,
            &config.destination_root,
        );
        summary.files_copied += report.copied;
        summary.files_failed += report.failed;
        summary.classes_split += 1;
    }

    info!(
        "Split complete: {} classes split, {} skipped, {} below the minimum, {} train / {} validation / {} test, {} files copied, {} failed",
        summary.classes_split,
        summary.classes_skipped,
        summary.classes_excluded,
        summary.assigned(DatasetSplit::Train),
        summary.assigned(DatasetSplit::Validation),
        summary.assigned(DatasetSplit::Test),
        summary.files_copied,
        summary.files_failed
    );
    Ok(summary)
}

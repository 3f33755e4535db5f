//! Random per-class train/validation/test split.
//!
//! Both boundaries are rounded up independently, so small classes favour
//! train: with one file the train share is 1 and validation/test are empty.
//! Slicing is clamped and never runs past the end of the file list.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io;
use std::path::Path;
use tracing::{debug, info};

use crate::core::dataset::SplitAssignment;
use crate::core::scanner::list_files;

/// Target ratios for the train and validation splits. The test split
/// receives whatever remains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitRatios {
    pub train: f64,      // e.g., 0.70 for 70%
    pub validation: f64, // e.g., 0.15 for 15%
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.70,
            validation: 0.15,
        }
    }
}

impl SplitRatios {
    /// Implicit test ratio
    pub fn test(&self) -> f64 {
        (1.0 - self.train - self.validation).max(0.0)
    }

    pub fn is_valid(&self) -> bool {
        let in_range = |r: f64| (0.0..=1.0).contains(&r);
        in_range(self.train) && in_range(self.validation) && self.train + self.validation <= 1.0
    }
}

/// Number of files going to train and validation for a class of `n` files.
///
/// Each count is `ceil(n * ratio)`, clamped so that train never exceeds `n`
/// and validation never exceeds what train left over.
pub fn split_counts(n: usize, ratios: &SplitRatios) -> (usize, usize) {
    let train = ((n as f64 * ratios.train).ceil() as usize).min(n);
    let validation = ((n as f64 * ratios.validation).ceil() as usize).min(n - train);
    (train, validation)
}

/// Cut an already ordered file list into train, validation and test.
pub fn partition_files(mut files: Vec<OsString>, ratios: &SplitRatios) -> SplitAssignment {
    let (train_count, validation_count) = split_counts(files.len(), ratios);

    let test = files.split_off(train_count + validation_count);
    let validation = files.split_off(train_count);

    SplitAssignment {
        train: files,
        validation,
        test,
    }
}

/// Split the merged files of one class.
///
/// Lists the regular files directly under `merge_root/<class_name>`,
/// shuffles them with `rng` and partitions the result. An empty class
/// yields an empty assignment.
///
/// # Errors
/// Returns the I/O error when the class directory cannot be listed.
pub fn split_class<R: Rng + ?Sized>(
    class_name: &str,
    merge_root: &Path,
    ratios: &SplitRatios,
    rng: &mut R,
) -> io::Result<SplitAssignment> {
    let class_path = merge_root.join(class_name);
    let mut files = list_files(&class_path)?;

    if files.is_empty() {
        info!("No files found in {:?}, skipping", class_path);
        return Ok(SplitAssignment::new());
    }

    files.shuffle(rng);
    let assignment = partition_files(files, ratios);

    debug!(
        "Split '{}': {} train, {} validation, {} test",
        class_name,
        assignment.train.len(),
        assignment.validation.len(),
        assignment.test.len()
    );
    Ok(assignment)
}

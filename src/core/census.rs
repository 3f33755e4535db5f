//! Class inventory of one or more dataset roots.
//!
//! A [`ClassTally`] is owned by the caller and threaded through each scan,
//! so separate runs never share counts.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::catalog::{ClassCount, CatalogError, CLASS_COLUMN};
use crate::core::scanner::{list_class_folders, list_files};

/// Running per-class counter built up across directory scans
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassTally {
    counts: BTreeMap<String, u64>,
}

impl ClassTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note that a class folder named `class_name` was seen
    pub fn record_folder(&mut self, class_name: &str) {
        self.counts.entry(class_name.to_string()).or_insert(0);
    }

    /// Add `files` to the count of `class_name`
    pub fn record_files(&mut self, class_name: &str, files: u64) {
        *self.counts.entry(class_name.to_string()).or_insert(0) += files;
    }

    pub fn count(&self, class_name: &str) -> Option<u64> {
        self.counts.get(class_name).copied()
    }

    /// Distinct class names, sorted
    pub fn class_names(&self) -> Vec<String> {
        self.counts.keys().cloned().collect()
    }

    /// Rows for the class count report, sorted by class name
    pub fn counts(&self) -> Vec<ClassCount> {
        self.counts
            .iter()
            .map(|(name, total)| ClassCount::new(name.clone(), *total))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Record every class folder found under each of `roots`.
pub fn scan_class_folders(roots: &[PathBuf], mut tally: ClassTally) -> ClassTally {
    for root in roots {
        let Some(classes) = classes_under(root) else {
            continue;
        };
        for class_name in &classes {
            tally.record_folder(&class_name.to_string_lossy());
        }
        info!("Found {} class folders in {:?}", classes.len(), root);
    }
    tally
}

/// Add the number of flat files of every class folder under each of `roots`.
pub fn count_class_files(roots: &[PathBuf], mut tally: ClassTally) -> ClassTally {
    for root in roots {
        let Some(classes) = classes_under(root) else {
            continue;
        };
        for class_name in classes {
            let class_path = root.join(&class_name);
            match list_files(&class_path) {
                Ok(files) => {
                    tally.record_files(&class_name.to_string_lossy(), files.len() as u64)
                }
                Err(e) => warn!("Could not read {:?}: {}, skipping", class_path, e),
            }
        }
    }
    tally
}

fn classes_under(root: &Path) -> Option<Vec<OsString>> {
    if !root.is_dir() {
        warn!("Directory {:?} not found, skipping", root);
        return None;
    }
    match list_class_folders(root) {
        Ok(classes) => Some(classes),
        Err(e) => {
            warn!("Could not list {:?}: {}, skipping", root, e);
            None
        }
    }
}

/// Export the class names as a single-column CSV.
pub fn write_class_list(path: &Path, names: &[String]) -> Result<(), CatalogError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([CLASS_COLUMN])?;
    for name in names {
        writer.write_record([name])?;
    }
    writer.flush()?;

    info!("Exported {} class names to {:?}", names.len(), path);
    Ok(())
}

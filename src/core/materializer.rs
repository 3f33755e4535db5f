use std::path::Path;
use tracing::{error, info};

use crate::core::dataset::SplitAssignment;
use crate::core::operations::{copy_with_metadata, ensure_dir};

/// Result of materializing one class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    pub copied: usize,
    pub failed: usize,
}

/// Copy a class's split assignment into `destination_root/<split>/<class>/`.
///
/// Only splits with at least one file get a directory. A file that fails to
/// copy is logged and skipped; nothing already copied is rolled back.
pub fn materialize(
    class_name: &str,
    assignment: &SplitAssignment,
    merge_root: &Path,
    destination_root: &Path,
) -> MaterializeReport {
    let source_dir = merge_root.join(class_name);
    let mut report = MaterializeReport::default();

    for (split, files) in assignment.iter() {
        // An absent directory means the class has no samples in this split
        if files.is_empty() {
            continue;
        }

        let destination_dir = destination_root.join(split.as_str()).join(class_name);
        if let Err(e) = ensure_dir(&destination_dir) {
            error!(
                "Cannot create {:?}, skipping {} {} files of '{}': {}",
                destination_dir,
                files.len(),
                split,
                class_name,
                e
            );
            report.failed += files.len();
            continue;
        }

        for file_name in files {
            let source = source_dir.join(file_name);
            let destination = destination_dir.join(file_name);
            match copy_with_metadata(&source, &destination) {
                Ok(_) => report.copied += 1,
                Err(e) => {
                    error!("Skipping {:?}: {}", source, e);
                    report.failed += 1;
                }
            }
        }
    }

    info!(
        "Split '{}': {} train, {} validation, {} test ({} copied, {} failed)",
        class_name,
        assignment.train.len(),
        assignment.validation.len(),
        assignment.test.len(),
        report.copied,
        report.failed
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::list_files;
    use std::fs;

    fn merged_class(root: &Path, class: &str, files: &[&str]) {
        let dir = root.join(class);
        fs::create_dir_all(&dir).unwrap();
        for name in files {
            fs::write(dir.join(name), name.as_bytes()).unwrap();
        }
    }

    #[test]
    fn test_files_land_under_split_and_class() {
        let merge = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        merged_class(merge.path(), "apple", &["a.jpg", "b.jpg", "c.jpg"]);

        let assignment = SplitAssignment {
            train: vec!["a.jpg".into()],
            validation: vec!["b.jpg".into()],
            test: vec!["c.jpg".into()],
        };
        let report = materialize("apple", &assignment, merge.path(), dest.path());

        assert_eq!(report, MaterializeReport { copied: 3, failed: 0 });
        assert_eq!(list_files(&dest.path().join("train/apple")).unwrap(), vec!["a.jpg"]);
        assert_eq!(list_files(&dest.path().join("validation/apple")).unwrap(), vec!["b.jpg"]);
        assert_eq!(list_files(&dest.path().join("test/apple")).unwrap(), vec!["c.jpg"]);
        // Source stays in place
        assert!(merge.path().join("apple/a.jpg").is_file());
    }

    #[test]
    fn test_empty_splits_create_no_directory() {
        let merge = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        merged_class(merge.path(), "fig", &["a.jpg"]);

        let assignment = SplitAssignment {
            train: vec!["a.jpg".into()],
            ..SplitAssignment::default()
        };
        materialize("fig", &assignment, merge.path(), dest.path());

        assert!(dest.path().join("train/fig/a.jpg").is_file());
        assert!(!dest.path().join("validation").exists());
        assert!(!dest.path().join("test").exists());
    }

    #[test]
    fn test_empty_assignment_touches_nothing() {
        let merge = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();

        let report = materialize("kiwi", &SplitAssignment::new(), merge.path(), dest.path());

        assert_eq!(report, MaterializeReport::default());
        assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_missing_file_is_skipped_and_rest_copied() {
        let merge = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        merged_class(merge.path(), "pear", &["a.jpg", "c.jpg"]);

        let assignment = SplitAssignment {
            train: vec!["a.jpg".into(), "gone.jpg".into(), "c.jpg".into()],
            ..SplitAssignment::default()
        };
        let report = materialize("pear", &assignment, merge.path(), dest.path());

        assert_eq!(report, MaterializeReport { copied: 2, failed: 1 });
        assert_eq!(
            list_files(&dest.path().join("train/pear")).unwrap(),
            vec!["a.jpg", "c.jpg"]
        );
    }
}

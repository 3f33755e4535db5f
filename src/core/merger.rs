//! Merges pre-partitioned source folders into a single per-class layout.
//!
//! Every file lands at `<merge_root>/<class>/<partition>_<original>`, so two
//! partitions holding the same file name never collide. Re-running over an
//! existing merge root overwrites the same targets.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use tracing::{error, info, warn};

use crate::core::operations::{copy_with_metadata, ensure_dir};
use crate::core::scanner::{list_files, SourcePartition};

/// Outcome of a merge run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Number of files copied into the merge root
    pub files_copied: usize,
    /// Files that could not be read or copied
    pub files_failed: usize,
    /// Partitions that were not present on disk
    pub skipped_partitions: Vec<String>,
    /// Files copied per class in this run
    pub per_class: BTreeMap<String, usize>,
}

/// Name a source file receives inside the merge root.
pub fn merged_file_name(partition: &str, original: &OsStr) -> OsString {
    let mut name = OsString::from(partition);
    name.push("_");
    name.push(original);
    name
}

/// Copy every `(partition, class, file)` into `merge_root/<class>/`.
///
/// Missing partitions and unreadable class folders are logged and skipped;
/// a failed copy skips that one file. The merge itself never aborts.
pub fn merge(partitions: &[SourcePartition], merge_root: &Path) -> MergeReport {
    info!("Dataset merge starting into {:?}", merge_root);
    let mut report = MergeReport::default();

    match ensure_dir(merge_root) {
        Ok(true) => info!("Target folder created: {:?}", merge_root),
        Ok(false) => {}
        Err(e) => {
            error!("Cannot create merge root {:?}: {}", merge_root, e);
            return report;
        }
    }

    for partition in partitions {
        if !partition.exists() {
            warn!(
                "Source partition '{}' not found at {:?}, skipping",
                partition.name, partition.root
            );
            report.skipped_partitions.push(partition.name.clone());
            continue;
        }

        info!("Processing partition '{}' at {:?}", partition.name, partition.root);
        let classes = match partition.class_folders() {
            Ok(classes) => classes,
            Err(e) => {
                warn!(
                    "Could not list classes of partition '{}': {}, skipping",
                    partition.name, e
                );
                report.skipped_partitions.push(partition.name.clone());
                continue;
            }
        };

        for class_name in classes {
            merge_class(partition, &class_name, merge_root, &mut report);
        }
    }

    info!(
        "Merge complete: {} files copied, {} failed, {} partitions skipped",
        report.files_copied,
        report.files_failed,
        report.skipped_partitions.len()
    );
    report
}

fn merge_class(
    partition: &SourcePartition,
    class_name: &OsStr,
    merge_root: &Path,
    report: &mut MergeReport,
) {
    let target_class_path = merge_root.join(class_name);
    if let Err(e) = ensure_dir(&target_class_path) {
        error!("Skipping class {:?} of '{}': {}", class_name, partition.name, e);
        return;
    }

    let source_class_path = partition.root.join(class_name);
    let files = match list_files(&source_class_path) {
        Ok(files) => files,
        Err(e) => {
            warn!("Could not read {:?}: {}, skipping class", source_class_path, e);
            return;
        }
    };

    let copied = report
        .per_class
        .entry(class_name.to_string_lossy().into_owned())
        .or_insert(0);
    for file_name in files {
        let source_file = source_class_path.join(&file_name);
        let target_file = target_class_path.join(merged_file_name(&partition.name, &file_name));

        match copy_with_metadata(&source_file, &target_file) {
            Ok(_) => {
                *copied += 1;
                report.files_copied += 1;
            }
            Err(e) => {
                warn!("Skipping {:?}: {}", source_file, e);
                report.files_failed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scanner::list_class_folders;
    use std::fs;
    use std::path::PathBuf;

    fn write_files(dir: &Path, names: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for name in names {
            let path = dir.join(name);
            fs::write(&path, path.to_string_lossy().as_bytes()).unwrap();
        }
    }

    fn fixture(root: &Path) -> Vec<SourcePartition> {
        write_files(&root.join("fine_train").join("apple"), &["1.jpg", "2.jpg"]);
        write_files(&root.join("fine_train").join("pear"), &["1.jpg"]);
        write_files(&root.join("fine_test").join("apple"), &["1.jpg"]);
        write_files(&root.join("fine_val").join("kiwi"), &[]);
        ["fine_train", "fine_test", "fine_val"]
            .iter()
            .map(|name| SourcePartition::under(root, name))
            .collect()
    }

    fn merged(root: &Path, class: &str) -> Vec<OsString> {
        list_files(&root.join(class)).unwrap()
    }

    #[test]
    fn test_merged_file_name_prefixes_partition() {
        assert_eq!(
            merged_file_name("fine_val", OsStr::new("img.jpg")),
            "fine_val_img.jpg"
        );
    }

    #[test]
    fn test_merge_conserves_counts_per_class() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let merge_root = out.path().join("merged_dataset");

        let report = merge(&fixture(src.path()), &merge_root);

        assert_eq!(report.files_copied, 4);
        assert_eq!(report.files_failed, 0);
        assert_eq!(report.per_class.get("apple"), Some(&3));
        assert_eq!(
            merged(&merge_root, "apple"),
            vec!["fine_test_1.jpg", "fine_train_1.jpg", "fine_train_2.jpg"]
        );
        assert_eq!(merged(&merge_root, "pear"), vec!["fine_train_1.jpg"]);
    }

    #[test]
    fn test_same_name_from_two_partitions_does_not_collide() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        merge(&fixture(src.path()), out.path());

        let from_train =
            fs::read_to_string(out.path().join("apple").join("fine_train_1.jpg")).unwrap();
        let from_test =
            fs::read_to_string(out.path().join("apple").join("fine_test_1.jpg")).unwrap();
        assert!(from_train.contains("fine_train"));
        assert!(from_test.contains("fine_test"));
        assert_ne!(from_train, from_test);
    }

    #[test]
    fn test_empty_class_folder_still_created() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        merge(&fixture(src.path()), out.path());

        assert!(out.path().join("kiwi").is_dir());
        assert!(merged(out.path(), "kiwi").is_empty());
        assert_eq!(
            list_class_folders(out.path()).unwrap(),
            vec!["apple", "kiwi", "pear"]
        );
    }

    #[test]
    fn test_missing_partition_is_skipped() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let mut partitions = fixture(src.path());
        partitions.insert(0, SourcePartition::new("ghost", PathBuf::from("/nonexistent/ghost")));

        let report = merge(&partitions, out.path());

        assert_eq!(report.skipped_partitions, vec!["ghost"]);
        assert_eq!(report.files_copied, 4);
    }

    #[test]
    fn test_rerun_overwrites_instead_of_duplicating() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let partitions = fixture(src.path());

        merge(&partitions, out.path());
        let first: usize = ["apple", "pear", "kiwi"]
            .iter()
            .map(|class| merged(out.path(), class).len())
            .sum();

        let second_report = merge(&partitions, out.path());
        let second: usize = ["apple", "pear", "kiwi"]
            .iter()
            .map(|class| merged(out.path(), class).len())
            .sum();

        assert_eq!(second_report.files_copied, 4);
        assert_eq!(first, 4);
        assert_eq!(second, first);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_file_name_is_merged() {
        use std::os::unix::ffi::OsStrExt;

        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let class_dir = src.path().join("fine_train").join("apple");
        write_files(&class_dir, &["ok.jpg"]);
        fs::write(class_dir.join(OsStr::from_bytes(b"img_\xff.jpg")), b"raw").unwrap();

        let report = merge(&[SourcePartition::under(src.path(), "fine_train")], out.path());

        assert_eq!(report.files_copied, 2);
        assert_eq!(report.files_failed, 0);
        let target = out
            .path()
            .join("apple")
            .join(OsStr::from_bytes(b"fine_train_img_\xff.jpg"));
        assert_eq!(fs::read(target).unwrap(), b"raw");
    }
}

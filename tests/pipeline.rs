use dataset_prep::core::{list_class_folders, list_files, DatasetSplit};
use dataset_prep::{build_rng, run_count, run_merge, run_split, PipelineConfig};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::path::Path;

fn write_class(root: &Path, partition: &str, class: &str, files: usize) {
    let dir = root.join(partition).join(class);
    fs::create_dir_all(&dir).unwrap();
    for i in 0..files {
        fs::write(dir.join(format!("img_{:03}.jpg", i)), format!("{partition}/{class}/{i}")).unwrap();
    }
}

fn config_in(root: &Path, minimum_count: u64) -> PipelineConfig {
    PipelineConfig {
        source_root: root.to_path_buf(),
        merge_root: root.join("merged_dataset"),
        destination_root: root.join("dataset"),
        class_counts_path: root.join("product_counts_report.csv"),
        class_list_path: root.join("product_list_report.csv"),
        minimum_count,
        seed: Some(2024),
        ..PipelineConfig::default()
    }
}

fn tree_files(root: &Path, class: &str) -> BTreeSet<OsString> {
    DatasetSplit::all()
        .into_iter()
        .map(|split| root.join(split.as_str()).join(class))
        .filter(|dir| dir.is_dir())
        .flat_map(|dir| list_files(&dir).unwrap())
        .collect()
}

#[test]
fn merge_count_split_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    // apple: 6 + 3 + 1 = 10 files, pear: 5 files, fig: 1 file
    write_class(root, "fine_train", "apple", 6);
    write_class(root, "fine_test", "apple", 3);
    write_class(root, "fine_val", "apple", 1);
    write_class(root, "fine_train", "pear", 5);
    write_class(root, "fine_test", "fig", 1);
    let config = config_in(root, 0);

    let report = run_merge(&config);
    assert_eq!(report.files_copied, 16);
    assert_eq!(list_files(&config.merge_root.join("apple")).unwrap().len(), 10);

    let tally = run_count(&config).unwrap();
    assert_eq!(tally.count("apple"), Some(10));
    assert_eq!(tally.count("pear"), Some(5));

    let summary = run_split(&config, &mut build_rng(config.seed)).unwrap();
    assert_eq!(summary.classes_split, 3);
    assert_eq!(summary.files_copied, 16);
    assert_eq!(summary.files_failed, 0);

    let dest = &config.destination_root;
    assert_eq!(list_files(&dest.join("train/apple")).unwrap().len(), 7);
    assert_eq!(list_files(&dest.join("validation/apple")).unwrap().len(), 2);
    assert_eq!(list_files(&dest.join("test/apple")).unwrap().len(), 1);

    // A single-file class only ever reaches train
    assert_eq!(list_files(&dest.join("train/fig")).unwrap().len(), 1);
    assert!(!dest.join("validation/fig").exists());
    assert!(!dest.join("test/fig").exists());

    for class in ["apple", "pear", "fig"] {
        let merged: BTreeSet<OsString> = list_files(&config.merge_root.join(class))
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(tree_files(dest, class), merged, "class {}", class);
    }
}

#[test]
fn minimum_count_is_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_class(root, "fine_train", "apple", 4);
    write_class(root, "fine_train", "pear", 3);
    let config = config_in(root, 3);

    run_merge(&config);
    run_count(&config).unwrap();
    let summary = run_split(&config, &mut build_rng(config.seed)).unwrap();

    assert_eq!(summary.classes_selected, 1);
    assert_eq!(summary.classes_excluded, 1);
    assert!(config.destination_root.join("train/apple").is_dir());
    for split in DatasetSplit::all() {
        assert!(!config.destination_root.join(split.as_str()).join("pear").exists());
    }
    // Excluded classes stay in the merged dataset
    assert_eq!(list_files(&config.merge_root.join("pear")).unwrap().len(), 3);
}

#[test]
fn merging_twice_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_class(root, "fine_train", "apple", 2);
    write_class(root, "fine_val", "apple", 2);
    let config = config_in(root, 0);

    run_merge(&config);
    let first = list_files(&config.merge_root.join("apple")).unwrap();
    run_merge(&config);
    let second = list_files(&config.merge_root.join("apple")).unwrap();

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
    assert_eq!(list_class_folders(&config.merge_root).unwrap(), vec!["apple"]);
}

#[test]
fn seeded_runs_produce_identical_trees() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_class(root, "fine_train", "apple", 30);
    let mut config = config_in(root, 0);
    run_merge(&config);
    run_count(&config).unwrap();

    run_split(&config, &mut build_rng(Some(11))).unwrap();
    let first = list_files(&config.destination_root.join("validation/apple")).unwrap();

    config.destination_root = root.join("dataset_again");
    run_split(&config, &mut build_rng(Some(11))).unwrap();
    let second = list_files(&config.destination_root.join("validation/apple")).unwrap();

    assert_eq!(first, second);
}

#[cfg(unix)]
#[test]
fn non_utf8_file_names_survive_merge_and_split() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_class(root, "fine_train", "apple", 3);
    let odd = OsStr::from_bytes(b"caf\xe9.jpg");
    fs::write(root.join("fine_train/apple").join(odd), b"latin-1").unwrap();
    let config = config_in(root, 0);

    assert_eq!(run_merge(&config).files_copied, 4);
    run_count(&config).unwrap();
    let summary = run_split(&config, &mut build_rng(config.seed)).unwrap();

    assert_eq!(summary.files_copied, 4);
    assert_eq!(summary.files_failed, 0);
    assert!(tree_files(&config.destination_root, "apple")
        .contains(OsStr::from_bytes(b"fine_train_caf\xe9.jpg")));
}

//! Read-only traversal of source partitions and class folders.
//!
//! Layout: `<source_root>/<partition>/<class>/<file>`. Only one level is
//! listed at a time; nested directories inside a class folder are never
//! descended into.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One pre-partitioned source bucket (e.g. `fine_train`) and its directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePartition {
    pub name: String,
    pub root: PathBuf,
}

impl SourcePartition {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    /// Partition whose directory is `<source_root>/<name>`.
    pub fn under(source_root: &Path, name: &str) -> Self {
        Self::new(name, source_root.join(name))
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Class folder names inside this partition, sorted
    pub fn class_folders(&self) -> io::Result<Vec<OsString>> {
        list_class_folders(&self.root)
    }
}

/// List the names of the immediate subdirectories of `dir`, sorted.
///
/// Names are returned as the OS reports them so they can be joined back
/// onto `dir` even when they are not valid UTF-8.
pub fn list_class_folders(dir: &Path) -> io::Result<Vec<OsString>> {
    list_entries(dir, |file_type| file_type.is_dir())
}

/// List the names of the regular files directly inside `dir`, sorted.
/// Subdirectories are skipped.
pub fn list_files(dir: &Path) -> io::Result<Vec<OsString>> {
    list_entries(dir, |file_type| file_type.is_file())
}

fn list_entries(dir: &Path, keep: impl Fn(&fs::FileType) -> bool) -> io::Result<Vec<OsString>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        // Follow symlinks so a linked image counts as a file
        let file_type = match fs::metadata(entry.path()) {
            Ok(metadata) => metadata.file_type(),
            Err(_) => entry.file_type()?,
        };
        if keep(&file_type) {
            names.push(entry.file_name());
        }
    }

    // Sort for consistent ordering
    names.sort();
    Ok(names)
}

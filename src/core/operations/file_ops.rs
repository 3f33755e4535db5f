use filetime::FileTime;
use std::fs;
use std::path::Path;
use tracing::{debug, error, warn};

/// Result type for file operations
pub type FileOpResult<T> = Result<T, FileOpError>;

/// Error types for file operations
#[derive(Debug)]
pub enum FileOpError {
    CopyFailed(String),
    CreateDirFailed(String),
}

impl std::fmt::Display for FileOpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOpError::CopyFailed(msg) => write!(f, "Copy failed: {}", msg),
            FileOpError::CreateDirFailed(msg) => write!(f, "Create directory failed: {}", msg),
        }
    }
}

impl std::error::Error for FileOpError {}

/// Copy a file together with its permissions and access/modification times.
///
/// An existing file at `dest` is overwritten. Failing to carry the
/// timestamps over is logged but does not fail the copy, since the bytes
/// are already in place.
///
/// # Arguments
/// * `src` - Source file path
/// * `dest` - Destination file path
///
/// # Returns
/// * `Ok(bytes)` with the number of bytes copied
/// * `Err(FileOpError)` if the copy failed
pub fn copy_with_metadata(src: &Path, dest: &Path) -> FileOpResult<u64> {
    debug!("Copying file from {:?} to {:?}", src, dest);

    // fs::copy carries the permission bits along with the contents
    let bytes = fs::copy(src, dest).map_err(|e| {
        error!("Failed to copy file from {:?} to {:?}: {}", src, dest, e);
        FileOpError::CopyFailed(format!(
            "Failed to copy from {:?} to {:?}: {}",
            src, dest, e
        ))
    })?;

    match fs::metadata(src) {
        Ok(metadata) => {
            let accessed = FileTime::from_last_access_time(&metadata);
            let modified = FileTime::from_last_modification_time(&metadata);
            if let Err(e) = filetime::set_file_times(dest, accessed, modified) {
                warn!("Copied {:?} but could not preserve timestamps: {}", dest, e);
            }
        }
        Err(e) => {
            warn!("Copied {:?} but could not read source metadata: {}", dest, e);
        }
    }

    Ok(bytes)
}

/// Create a directory and all of its parents if it does not exist yet.
///
/// # Returns
/// * `Ok(true)` if the directory was created
/// * `Ok(false)` if it already existed
/// * `Err(FileOpError)` if creation failed
pub fn ensure_dir(path: &Path) -> FileOpResult<bool> {
    if path.is_dir() {
        return Ok(false);
    }

    fs::create_dir_all(path).map_err(|e| {
        error!("Failed to create directory {:?}: {}", path, e);
        FileOpError::CreateDirFailed(format!("Failed to create {:?}: {}", path, e))
    })?;

    debug!("Created directory {:?}", path);
    Ok(true)
}

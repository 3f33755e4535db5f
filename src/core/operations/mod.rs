mod file_ops;

pub use file_ops::{copy_with_metadata, ensure_dir, FileOpError, FileOpResult};

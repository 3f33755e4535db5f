//! Per-class file counts exchanged as a CSV report.
//!
//! The report has a `Product` column with the class name and a
//! `Total_Count` column with the number of merged files. Any other columns
//! are ignored on read.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

pub const CLASS_COLUMN: &str = "Product";
pub const COUNT_COLUMN: &str = "Total_Count";

/// One row of the class count report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCount {
    #[serde(rename = "Product")]
    pub class_name: String,
    #[serde(rename = "Total_Count")]
    pub total_count: u64,
}

impl ClassCount {
    pub fn new(class_name: impl Into<String>, total_count: u64) -> Self {
        Self {
            class_name: class_name.into(),
            total_count,
        }
    }
}

/// Errors reading or writing the class count report
#[derive(Debug)]
pub enum CatalogError {
    /// The report file does not exist
    Missing(String),
    /// A required column is absent from the header
    MissingColumn(&'static str),
    /// A row could not be parsed (line number, reason)
    MalformedRow(u64, String),
    Csv(csv::Error),
    IoError(std::io::Error),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Missing(path) => write!(f, "Class count report not found: {}", path),
            CatalogError::MissingColumn(column) => {
                write!(f, "Class count report has no '{}' column", column)
            }
            CatalogError::MalformedRow(line, reason) => {
                write!(f, "Malformed class count row at line {}: {}", line, reason)
            }
            CatalogError::Csv(e) => write!(f, "CSV error: {}", e),
            CatalogError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<csv::Error> for CatalogError {
    fn from(error: csv::Error) -> Self {
        CatalogError::Csv(error)
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(error: std::io::Error) -> Self {
        CatalogError::IoError(error)
    }
}

/// Read and validate the class count report.
///
/// Every row must carry a non-empty class name and a non-negative integer
/// count; the first bad row fails the whole read.
pub fn read_class_counts(path: &Path) -> Result<Vec<ClassCount>, CatalogError> {
    if !path.is_file() {
        return Err(CatalogError::Missing(path.display().to_string()));
    }

    let contents = fs::read(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(contents.as_slice());

    let headers = reader.headers()?.clone();
    for column in [CLASS_COLUMN, COUNT_COLUMN] {
        if !headers.iter().any(|h| h == column) {
            return Err(CatalogError::MissingColumn(column));
        }
    }

    let mut counts = Vec::new();
    let mut record = csv::StringRecord::new();
    while reader.read_record(&mut record)? {
        let offset = record.position().map_or(0, |p| p.byte());
        let line = record_line(&contents, offset);

        let row: ClassCount = record
            .deserialize(Some(&headers))
            .map_err(|e| CatalogError::MalformedRow(line, e.to_string()))?;
        if row.class_name.is_empty() {
            return Err(CatalogError::MalformedRow(line, "empty class name".to_string()));
        }
        counts.push(row);
    }

    info!("Loaded {} class counts from {:?}", counts.len(), path);
    Ok(counts)
}

/// 1-based line on which the record read from `offset` begins. The reader
/// reports the offset before any blank lines it skipped, so those are
/// stepped over first.
fn record_line(contents: &[u8], offset: u64) -> u64 {
    let start = (offset as usize).min(contents.len());
    let skipped = contents[start..]
        .iter()
        .take_while(|&&b| b == b'\n' || b == b'\r')
        .count();
    let newlines = contents[..start + skipped].iter().filter(|&&b| b == b'\n').count();
    newlines as u64 + 1
}

/// Write the class count report, one row per class.
pub fn write_class_counts(path: &Path, counts: &[ClassCount]) -> Result<(), CatalogError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in counts {
        writer.serialize(row)?;
    }
    // An empty report still gets its header
    if counts.is_empty() {
        writer.write_record([CLASS_COLUMN, COUNT_COLUMN])?;
    }
    writer.flush()?;

    info!("Wrote {} class counts to {:?}", counts.len(), path);
    Ok(())
}

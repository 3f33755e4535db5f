use std::collections::BTreeSet;
use tracing::info;

use crate::core::catalog::ClassCount;

/// Select the classes eligible for splitting.
///
/// A class is kept only when its recorded count is strictly greater than
/// `minimum_count`. Classes missing from `counts` are never selected.
///
/// # Arguments
/// * `counts` - Rows of the class count report
/// * `minimum_count` - Exclusive lower bound on the number of files
///
/// # Returns
/// * Sorted set of selected class names
pub fn filter_classes(counts: &[ClassCount], minimum_count: u64) -> BTreeSet<String> {
    counts
        .iter()
        .filter(|row| {
            let keep = row.total_count > minimum_count;
            if !keep {
                info!(
                    "Excluding class '{}': {} files, need more than {}",
                    row.class_name, row.total_count, minimum_count
                );
            }
            keep
        })
        .map(|row| row.class_name.clone())
        .collect()
}

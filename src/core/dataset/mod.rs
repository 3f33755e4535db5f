mod dataset;

pub use dataset::{DatasetSplit, SplitAssignment};

//! Merge pre-partitioned image class folders and repartition them into
//! fresh train/validation/test subsets.
//!
//! Stages, in order:
//! 1. [`pipeline::run_merge`] copies `<source>/<partition>/<class>/<file>`
//!    to `<merge_root>/<class>/<partition>_<file>`.
//! 2. [`pipeline::run_count`] writes the per-class count report.
//! 3. [`pipeline::run_split`] keeps classes with more than the minimum
//!    count, shuffles each one and copies it to
//!    `<destination>/<split>/<class>/<file>`.

pub mod config;
pub mod core;
pub mod logging;
pub mod pipeline;

pub use config::{ConfigError, PipelineConfig};
pub use pipeline::{build_rng, run_count, run_list, run_merge, run_split, PipelineError, SplitSummary};

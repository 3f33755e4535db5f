pub mod catalog;
pub mod census;
pub mod dataset;
pub mod filter;
pub mod materializer;
pub mod merger;
pub mod operations;
pub mod scanner;
pub mod splitter;

pub use catalog::*;
pub use census::*;
pub use dataset::*;
pub use filter::*;
pub use materializer::*;
pub use merger::*;
pub use operations::*;
pub use scanner::*;
pub use splitter::*;

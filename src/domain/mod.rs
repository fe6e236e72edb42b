pub mod aggregate;
pub mod feature;
pub mod file_walker;
pub mod scanner;

pub use aggregate::{AggregateResult, Evidence, FeatureStatus, FileMatches};
pub use feature::{builtin_specs, Feature, FeatureSet, FeatureSpec};
pub use file_walker::{SuffixFilter, WalkOptions};
pub use scanner::{FileScan, Scanner};

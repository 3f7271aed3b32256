// Normalization pipeline: field resolution, coercion, and dataset replacement

pub mod clock;
pub mod processing;

pub use processing::normalize::{DefaultNormalizer, NormalizationPolicy, Normalizer};
pub use processing::replace::{CommitResult, DatasetReplacer, ReplaceStrategy};

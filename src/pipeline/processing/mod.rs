// Pipeline processing: per-record normalization, then the dataset commit

pub mod normalize;
pub mod replace;

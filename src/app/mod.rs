pub mod normalize_use_case;

pub use normalize_use_case::{NormalizeUseCase, RunOutput, RunReport};

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrandError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Replace(#[from] DatasetReplaceError),
}

pub type Result<T> = std::result::Result<T, BrandError>;

/// Failures raised by a document store collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("dataset file {path} is not a JSON array of documents")]
    Malformed { path: String },

    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// The step of a dataset replace that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceStage {
    /// Removing the prior dataset (clear-then-insert).
    Clear,
    /// Writing the new set after the clear (clear-then-insert).
    Insert,
    /// Writing the new set into staging (staged swap).
    Stage,
    /// Swapping the staged set in for the prior dataset (staged swap).
    Swap,
}

impl ReplaceStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplaceStage::Clear => "clear",
            ReplaceStage::Insert => "insert",
            ReplaceStage::Stage => "stage",
            ReplaceStage::Swap => "swap",
        }
    }

    /// Whether a failure at this stage can leave the dataset empty or partial.
    pub fn leaves_dataset_inconsistent(&self) -> bool {
        matches!(self, ReplaceStage::Clear | ReplaceStage::Insert)
    }
}

impl fmt::Display for ReplaceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("dataset replace failed at the {stage} stage: {source}")]
pub struct DatasetReplaceError {
    pub stage: ReplaceStage,
    #[source]
    pub source: StoreError,
}

impl DatasetReplaceError {
    pub fn new(stage: ReplaceStage, source: StoreError) -> Self {
        Self { stage, source }
    }
}

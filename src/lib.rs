pub mod constants;
pub mod config;
pub mod domain;
pub mod error;
pub mod observability;
pub mod pipeline;
pub mod server;
pub mod storage;

// Application layer orchestrating the pipeline against a store
pub mod app;

pub use domain::{CanonicalBrand, Document, RawRecord};
pub use error::{BrandError, DatasetReplaceError, ReplaceStage, Result, StoreError};

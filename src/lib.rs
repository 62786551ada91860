//! apb-classifier — reproducible quotation-vs-noise training pipeline.
//!
//! Trains a binary classifier that separates genuine biblical quotations
//! from spurious ("noise") matches in a corpus of historical documents,
//! using hand-engineered features (token count, tf-idf, match proportion,
//! runs-test p-value) plus a derived tradition group (LDS vs not-LDS).
//!
//! The pipeline is a single linear run:
//!
//! 1. Query the relational store for labeled matches, feature
//!    measurements, and verse/version metadata ([`storage`])
//! 2. Join them into a labeled dataset with derived label and group
//!    columns ([`dataset`])
//! 3. Resolve a seeded, stratified train/test split — recomputing and
//!    persisting CSV snapshots, or reloading the persisted ones
//!    ([`dataset::cache`])
//! 4. Clean the partitions and fit a center/scale/one-hot preprocessor
//!    on the training partition only ([`preprocess`])
//! 5. Fit a logistic-regression baseline and report standard
//!    classification metrics and diagnostic plots ([`model`],
//!    [`metrics`], [`report`])
//!
//! The split seed and training fraction are explicit parameters with
//! documented defaults, so a historical split can be regenerated exactly.

pub mod dataset;
pub mod metrics;
pub mod model;
pub mod preprocess;
pub mod report;
pub mod storage;

/// Crate error types.
#[derive(thiserror::Error, Debug)]
pub enum ApbError {
    /// Relational store connectivity or query failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Split-cache reload failure (missing column, type mismatch,
    /// unreadable snapshot). A cached file that does not conform to the
    /// declared schema is a fatal misconfiguration, not recovered.
    #[error("split cache error: {0}")]
    Cache(String),

    /// CSV snapshot write failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid pipeline configuration (e.g. train fraction out of range).
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience alias for `std::result::Result<T, ApbError>`.
pub type Result<T> = std::result::Result<T, ApbError>;

/// Re-export commonly used types for pipeline consumers.
pub mod prelude {
    pub use crate::dataset::cache::{DatasetSplits, SplitCache, SplitSource};
    pub use crate::dataset::split::{DEFAULT_SPLIT_SEED, DEFAULT_TRAIN_FRACTION};
    pub use crate::dataset::{LabeledQuotation, MatchLabel, Observation, Tradition};
    pub use crate::metrics::{ClassificationMetrics, ConfusionMatrix};
    pub use crate::model::{LogisticRegression, LrConfig};
    pub use crate::preprocess::Preprocessor;
    pub use crate::{ApbError, Result};
}

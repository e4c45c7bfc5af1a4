//! Error types for model loading, preprocessing and scoring

use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading model artifacts or building the model state
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact not found: {}", .0.display())]
    Unavailable(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported model format: {0}")]
    UnsupportedFormat(String),

    #[error("unknown feature name in schema: {0}")]
    Schema(String),

    #[error("classifier expects {expected} features but schema lists {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("malformed model: {0}")]
    Malformed(String),

    #[cfg(feature = "onnx")]
    #[error("onnx runtime error: {0}")]
    Onnx(#[from] ort::Error),
}

/// Amount scaling failed; always absorbed by the log fallback
#[derive(Debug, Error, PartialEq)]
pub enum PreprocessError {
    #[error("amount scaler is not fitted")]
    NotFitted,

    #[error("scaler produced a non-finite value for amount {0}")]
    NonFinite(f64),
}

/// Failures while invoking the classifier
#[derive(Debug, Error)]
pub enum ScoringError {
    /// Artifact exported by an older trainer; repairable by the compat shim
    #[error("tree {tree} is missing monotonic constraint metadata")]
    MissingTreeMetadata { tree: usize },

    #[error("feature vector has {actual} values, classifier expects {expected}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("malformed classifier: {0}")]
    Malformed(String),

    #[error("inference failed: {0}")]
    Inference(String),

    /// No classifier loaded and the caller needs one
    #[error("model not loaded")]
    ModelUnavailable,
}

impl ScoringError {
    /// Whether the compat shim knows how to repair the cause
    pub fn is_repairable(&self) -> bool {
        matches!(self, ScoringError::MissingTreeMetadata { .. })
    }
}

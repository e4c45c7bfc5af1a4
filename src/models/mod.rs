//! ML model inference components

pub mod compat;
pub mod forest;
pub mod inference;
pub mod loader;
#[cfg(feature = "onnx")]
pub mod onnx;

use crate::error::ScoringError;
use crate::feature_extractor::FeatureVector;

pub use forest::RandomForest;
pub use inference::{Score, Scorer};
pub use loader::{ModelLoader, ModelState};

/// Label and positive-class probability for one feature vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label
    pub label: i64,
    /// Probability mass on the fraud (1) class
    pub fraud_probability: f64,
}

/// A trained binary classifier
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// Expected input width, when the artifact declares one
    fn n_features(&self) -> Option<usize>;

    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ScoringError>;

    /// A repaired copy for artifacts with a known, fixable incompatibility
    fn repaired(&self) -> Option<Box<dyn Classifier>> {
        None
    }
}

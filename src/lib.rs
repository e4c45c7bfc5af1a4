//! Fraud Scoring Service Library
//!
//! Scores individual payment transactions over HTTP: feature encoding,
//! tree-ensemble inference (or a rule-based fallback when no model is
//! loaded) and a risk policy that labels each score.

pub mod api;
pub mod config;
pub mod deterministic;
pub mod error;
pub mod feature_extractor;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod policy;
pub mod scaler;
pub mod service;
pub mod types;

pub use config::AppConfig;
pub use feature_extractor::FeatureExtractor;
pub use models::{ModelLoader, ModelState};
pub use service::FraudScoringService;
pub use types::{ScoringResult, Transaction};

//! Fraud scoring: classifier inference or the degraded heuristic

use crate::error::ScoringError;
use crate::feature_extractor::FeatureVector;
use crate::models::{Classifier, ModelState};
use crate::types::Transaction;
use std::sync::Arc;
use tracing::{debug, warn};

/// Degraded-mode score ceiling
const HEURISTIC_CAP: f64 = 0.95;

/// Classification and fraud probability for one transaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// 0 = legitimate, 1 = fraud
    pub classification: u8,
    /// Probability of the fraud class (0.0 - 1.0)
    pub fraud_score: f64,
    /// Produced by the heuristic rather than a classifier
    pub degraded: bool,
}

/// Scorer over the shared model state
#[derive(Debug, Clone)]
pub struct Scorer {
    state: Arc<ModelState>,
}

impl Scorer {
    pub fn new(state: Arc<ModelState>) -> Self {
        Self { state }
    }

    pub fn is_degraded(&self) -> bool {
        !self.state.is_loaded()
    }

    /// Score an encoded transaction with the loaded classifier.
    ///
    /// Falls back to [`Scorer::score_degraded`] when no classifier is loaded.
    pub fn score(&self, tx: &Transaction, features: &FeatureVector) -> Result<Score, ScoringError> {
        match self.state.classifier() {
            Some(classifier) => score_with_classifier(classifier, features),
            None => Ok(self.score_degraded(tx)),
        }
    }

    /// Score an already-encoded vector. There is no heuristic for raw
    /// features, so this requires a loaded classifier.
    pub fn score_features(&self, features: &FeatureVector) -> Result<Score, ScoringError> {
        let classifier = self
            .state
            .classifier()
            .ok_or(ScoringError::ModelUnavailable)?;
        score_with_classifier(classifier, features)
    }

    /// Rule-based score used when no classifier is loaded
    pub fn score_degraded(&self, tx: &Transaction) -> Score {
        warn!(amount = tx.amount, hour = tx.hour, "Model not loaded, using heuristic score");
        heuristic_score(tx.amount, tx.hour)
    }
}

/// Run the classifier, repairing a known artifact incompatibility once.
pub fn score_with_classifier(
    classifier: &dyn Classifier,
    features: &FeatureVector,
) -> Result<Score, ScoringError> {
    let prediction = match classifier.predict(features) {
        Ok(prediction) => prediction,
        Err(e) if e.is_repairable() => {
            let repaired = classifier.repaired().ok_or(e)?;
            warn!(model = %classifier.name(), "Retrying inference with repaired model");
            repaired.predict(features)?
        }
        Err(e) => return Err(e),
    };

    let fraud_score = prediction.fraud_probability.clamp(0.0, 1.0);
    let classification = u8::from(prediction.label != 0);

    debug!(
        model = %classifier.name(),
        fraud_score = fraud_score,
        classification = classification,
        "Classifier inference complete"
    );

    Ok(Score {
        classification,
        fraud_score,
        degraded: false,
    })
}

/// High amounts and night-time hours push the score up; fraud iff > 0.5
pub fn heuristic_score(amount: f64, hour: u8) -> Score {
    let mut fraud_score: f64 = 0.0;
    if amount > 5000.0 {
        fraud_score += 0.3;
    }
    if hour < 6 || hour > 22 {
        fraud_score += 0.2;
    }
    if amount > 10000.0 {
        fraud_score += 0.3;
    }
    let fraud_score = fraud_score.min(HEURISTIC_CAP);

    Score {
        classification: u8::from(fraud_score > 0.5),
        fraud_score,
        degraded: true,
    }
}

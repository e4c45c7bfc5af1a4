//! Scoring facade: encode, score and label one transaction

use crate::error::ScoringError;
use crate::models::{ModelState, Score, Scorer};
use crate::policy::{RiskLevel, RiskPolicy};
use crate::scaler::scale_amount;
use crate::types::{RawFeatures, ScoringResult, Transaction};
use std::sync::Arc;
use tracing::debug;

/// Scored transaction plus how it was scored
#[derive(Debug, Clone)]
pub struct Outcome {
    pub result: ScoringResult,
    /// The heuristic produced the score
    pub degraded: bool,
}

/// Model verdict for pre-computed features
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPrediction {
    /// 0 = legitimate, 1 = fraud
    pub classification: u8,
    pub fraud_probability: f64,
    pub risk_level: RiskLevel,
}

impl RawPrediction {
    pub fn is_fraud(&self) -> bool {
        self.classification == 1
    }
}

/// Fraud scoring service over an immutable model state
#[derive(Debug, Clone)]
pub struct FraudScoringService {
    state: Arc<ModelState>,
    scorer: Scorer,
    policy: RiskPolicy,
}

impl FraudScoringService {
    pub fn new(state: Arc<ModelState>) -> Self {
        Self {
            scorer: Scorer::new(state.clone()),
            state,
            policy: RiskPolicy::new(),
        }
    }

    pub fn with_policy(mut self, policy: RiskPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model_loaded(&self) -> bool {
        self.state.is_loaded()
    }

    pub fn state(&self) -> &ModelState {
        &self.state
    }

    /// Score a validated transaction
    pub fn classify(&self, tx: &Transaction) -> Result<Outcome, ScoringError> {
        let score = self.score(tx)?;
        let assessment = self.policy.assess(score.fraud_score);
        let result = ScoringResult::new(score.classification, score.fraud_score, assessment);

        debug!(
            transaction_id = %result.transaction_id,
            fraud_score = result.fraud_score,
            risk_level = result.details.risk_level.as_str(),
            degraded = score.degraded,
            "Transaction scored"
        );

        // Results are not stored; a persistence hook would go here.
        Ok(Outcome {
            result,
            degraded: score.degraded,
        })
    }

    /// Score caller-supplied `V1..V28` values with the loaded classifier.
    ///
    /// Fails with [`ScoringError::ModelUnavailable`] in degraded mode.
    pub fn predict(&self, raw: &RawFeatures) -> Result<RawPrediction, ScoringError> {
        let amount_scaled = scale_amount(self.state.scaler(), raw.amount);
        let features = self.state.extractor().extract_raw(raw, amount_scaled);
        let score = self.scorer.score_features(&features)?;

        Ok(RawPrediction {
            classification: score.classification,
            fraud_probability: score.fraud_score,
            risk_level: self.policy.assess(score.fraud_score).risk_level,
        })
    }

    fn score(&self, tx: &Transaction) -> Result<Score, ScoringError> {
        if !self.state.is_loaded() {
            return Ok(self.scorer.score_degraded(tx));
        }

        let amount_scaled = scale_amount(self.state.scaler(), tx.amount);
        let features = self.state.extractor().extract(tx, amount_scaled);
        self.scorer.score(tx, &features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forest::tests::{forest, stump};
    use crate::policy::{Confidence, RiskLevel};
    use crate::scaler::AmountScaler;
    use crate::types::Location;

    fn degraded_service() -> FraudScoringService {
        FraudScoringService::new(Arc::new(ModelState::unloaded()))
    }

    #[test]
    fn test_degraded_end_to_end() {
        let tx = Transaction::new(7500.0, 3)
            .with_day_of_week(5)
            .with_merchant_category("online_retail")
            .with_location(Location::new("BR"));

        let outcome = degraded_service().classify(&tx).unwrap();
        let result = outcome.result;

        assert!(outcome.degraded);
        assert_eq!(result.fraud_score, 0.5);
        assert_eq!(result.classification, 0);
        assert_eq!(result.confidence, Confidence::Low);
        assert_eq!(result.details.risk_level, RiskLevel::Medium);
        assert_eq!(result.details.legitimate_probability, 0.5);
        assert!(result.transaction_id.starts_with("txn_"));
    }

    #[test]
    fn test_degraded_fraud() {
        let outcome = degraded_service().classify(&Transaction::new(12000.0, 2)).unwrap();
        assert!(outcome.result.is_fraud());
        assert_eq!(outcome.result.confidence, Confidence::High);
        assert_eq!(outcome.result.details.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_unique_ids() {
        let service = degraded_service();
        let tx = Transaction::new(10.0, 12);
        let a = service.classify(&tx).unwrap().result;
        let b = service.classify(&tx).unwrap().result;
        assert_ne!(a.transaction_id, b.transaction_id);
    }

    #[test]
    fn test_loaded_model_scores_amount_slot() {
        // Split on Amount_scaled (slot 28): robust (x - 100) / 100 > 0.5 means fraud
        let model = forest(33, vec![stump(33, 28, 0.5)]);
        let scaler = AmountScaler::Robust {
            center: 100.0,
            scale: 100.0,
        };
        let state = ModelState::loaded(
            Box::new(model),
            scaler,
            crate::feature_extractor::default_feature_names(),
        )
        .unwrap();
        let service = FraudScoringService::new(Arc::new(state));
        assert!(service.model_loaded());

        let low = service.classify(&Transaction::new(50.0, 12)).unwrap();
        assert!(!low.degraded);
        assert_eq!(low.result.classification, 0);
        assert!((low.result.fraud_score - 0.1).abs() < 1e-12);

        let high = service.classify(&Transaction::new(900.0, 12)).unwrap();
        assert_eq!(high.result.classification, 1);
        assert!((high.result.fraud_score - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_vector_matches_feature_list() {
        let names = vec!["hour_sin".to_string(), "Amount_scaled".to_string(), "V3".to_string()];
        let state = ModelState::loaded(
            Box::new(forest(3, vec![stump(3, 1, 0.5)])),
            AmountScaler::Unfitted,
            names.clone(),
        )
        .unwrap();

        let features = state.extractor().extract(&Transaction::new(100.0, 6), 0.46);
        assert_eq!(features.len(), names.len());
        assert_eq!(features.as_slice()[1], 0.46);
    }

    #[test]
    fn test_predict_requires_model() {
        let raw = RawFeatures::new(0.0, [0.0; 28], 10.0);
        let err = degraded_service().predict(&raw).unwrap_err();
        assert!(matches!(err, ScoringError::ModelUnavailable));
    }

    #[test]
    fn test_predict_scores_components() {
        // Split on V14 (slot 13)
        let state = ModelState::loaded(
            Box::new(forest(33, vec![stump(33, 13, -2.0)])),
            AmountScaler::Unfitted,
            crate::feature_extractor::default_feature_names(),
        )
        .unwrap();
        let service = FraudScoringService::new(Arc::new(state));

        let mut components = [0.0; 28];
        components[13] = -5.0;
        let legit = service.predict(&RawFeatures::new(86_520.0, components, 75.0)).unwrap();
        assert_eq!(legit.classification, 0);
        assert!((legit.fraud_probability - 0.1).abs() < 1e-12);
        assert_eq!(legit.risk_level, RiskLevel::Low);

        components[13] = 1.0;
        let prediction = service.predict(&RawFeatures::new(86_520.0, components, 75.0)).unwrap();
        assert!(prediction.is_fraud());
        assert_eq!(prediction.risk_level, RiskLevel::Critical);
    }
}

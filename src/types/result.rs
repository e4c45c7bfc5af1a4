//! Scoring result returned to callers

use crate::policy::{Assessment, Confidence, RiskLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Probability split and risk bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringDetails {
    pub legitimate_probability: f64,
    pub fraud_probability: f64,
    pub risk_level: RiskLevel,
}

/// Outcome of scoring one transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// Unique identifier, `txn_` followed by 12 hex characters
    pub transaction_id: String,

    /// 0 = legitimate, 1 = fraud
    pub classification: u8,

    /// Fraud probability (0.0 - 1.0)
    pub fraud_score: f64,

    pub confidence: Confidence,

    pub details: ScoringDetails,

    /// Scoring time (UTC)
    pub timestamp: DateTime<Utc>,
}

impl ScoringResult {
    /// Build a result with a fresh id and the current time
    pub fn new(classification: u8, fraud_score: f64, assessment: Assessment) -> Self {
        Self {
            transaction_id: new_transaction_id(),
            classification,
            fraud_score,
            confidence: assessment.confidence,
            details: ScoringDetails {
                legitimate_probability: 1.0 - fraud_score,
                fraud_probability: fraud_score,
                risk_level: assessment.risk_level,
            },
            timestamp: Utc::now(),
        }
    }

    pub fn is_fraud(&self) -> bool {
        self.classification == 1
    }
}

/// `txn_` plus the first 12 hex digits of a random UUID
pub fn new_transaction_id() -> String {
    let uuid = uuid::Uuid::new_v4().simple().to_string();
    format!("txn_{}", &uuid[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_format() {
        let id = new_transaction_id();
        assert_eq!(id.len(), 16);
        assert!(id.starts_with("txn_"));
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(id, new_transaction_id());
    }

    #[test]
    fn test_result_serialization() {
        let result = ScoringResult::new(
            1,
            0.85,
            Assessment {
                confidence: Confidence::High,
                risk_level: RiskLevel::Critical,
            },
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["classification"], 1);
        assert_eq!(json["confidence"], "high");
        assert_eq!(json["details"]["risk_level"], "critical");
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));

        let legit = json["details"]["legitimate_probability"].as_f64().unwrap();
        assert!((legit - 0.15).abs() < 1e-12);
        assert!(result.is_fraud());
    }
}

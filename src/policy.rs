//! Maps a fraud probability onto confidence and risk labels.

use serde::{Deserialize, Serialize};

/// How decisively the score sits away from the 0.5 decision boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 || score < 0.2 {
            Confidence::High
        } else if score > 0.6 || score < 0.4 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

/// Risk level classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Determine risk level from score and thresholds (lower bounds, inclusive)
    pub fn from_score(score: f64, thresholds: &RiskLevelThresholds) -> Self {
        if score >= thresholds.critical {
            RiskLevel::Critical
        } else if score >= thresholds.high {
            RiskLevel::High
        } else if score >= thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Inclusive lower bounds of each risk bucket above `low`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskLevelThresholds {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for RiskLevelThresholds {
    fn default() -> Self {
        Self {
            medium: 0.4,
            high: 0.6,
            critical: 0.8,
        }
    }
}

/// Labels attached to one fraud score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub confidence: Confidence,
    pub risk_level: RiskLevel,
}

/// Policy layer with the service's fixed thresholds
#[derive(Debug, Clone, Default)]
pub struct RiskPolicy {
    thresholds: RiskLevelThresholds,
}

impl RiskPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thresholds(&self) -> &RiskLevelThresholds {
        &self.thresholds
    }

    pub fn assess(&self, fraud_score: f64) -> Assessment {
        Assessment {
            confidence: Confidence::from_score(fraud_score),
            risk_level: RiskLevel::from_score(fraud_score, &self.thresholds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extremeness(score: f64) -> f64 {
        (score - 0.5).abs()
    }

    #[test]
    fn test_confidence_boundaries() {
        assert_eq!(Confidence::from_score(0.19), Confidence::High);
        assert_eq!(Confidence::from_score(0.2), Confidence::Medium);
        assert_eq!(Confidence::from_score(0.39), Confidence::Medium);
        assert_eq!(Confidence::from_score(0.4), Confidence::Low);
        assert_eq!(Confidence::from_score(0.5), Confidence::Low);
        assert_eq!(Confidence::from_score(0.6), Confidence::Low);
        assert_eq!(Confidence::from_score(0.61), Confidence::Medium);
        assert_eq!(Confidence::from_score(0.8), Confidence::Medium);
        assert_eq!(Confidence::from_score(0.81), Confidence::High);
        assert_eq!(Confidence::from_score(0.0), Confidence::High);
        assert_eq!(Confidence::from_score(1.0), Confidence::High);
    }

    #[test]
    fn test_risk_level_boundaries() {
        let thresholds = RiskLevelThresholds::default();

        assert_eq!(RiskLevel::from_score(0.0, &thresholds), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.2, &thresholds), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.39, &thresholds), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.4, &thresholds), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.59, &thresholds), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.6, &thresholds), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.79, &thresholds), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.8, &thresholds), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(1.0, &thresholds), RiskLevel::Critical);
    }

    #[test]
    fn test_risk_level_monotonic() {
        let thresholds = RiskLevelThresholds::default();
        let mut previous = RiskLevel::Low;
        for i in 0..=1000 {
            let level = RiskLevel::from_score(i as f64 / 1000.0, &thresholds);
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn test_confidence_monotonic_in_extremeness() {
        let scores: Vec<f64> = (0..=1000).map(|i| i as f64 / 1000.0).collect();
        for &a in &scores {
            for &b in scores.iter().step_by(37) {
                if extremeness(a) > extremeness(b) + 0.0005 {
                    assert!(
                        Confidence::from_score(a) >= Confidence::from_score(b),
                        "score {a} vs {b}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_assess_combines_labels() {
        let policy = RiskPolicy::new();
        let assessment = policy.assess(0.5);
        assert_eq!(assessment.confidence, Confidence::Low);
        assert_eq!(assessment.risk_level, RiskLevel::Medium);

        let assessment = policy.assess(0.95);
        assert_eq!(assessment.confidence, Confidence::High);
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_labels_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&RiskLevel::Critical).unwrap(), "\"critical\"");
        assert_eq!(serde_json::to_string(&Confidence::Medium).unwrap(), "\"medium\"");
    }
}

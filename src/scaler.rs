//! Amount scaling with the statistics fit at training time.

use crate::error::{ModelError, PreprocessError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Fitted amount scaler, deserialized from the exported JSON artifact.
///
/// ```json
/// {"kind": "robust", "center": 22.0, "scale": 71.5}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AmountScaler {
    /// Median / interquartile-range scaling (training default)
    Robust { center: f64, scale: f64 },
    /// Mean / standard-deviation scaling
    Standard { mean: f64, scale: f64 },
    /// Stand-in when a model loaded without its scaler; never transforms
    Unfitted,
}

impl AmountScaler {
    /// Load a scaler artifact from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn transform(&self, amount: f64) -> Result<f64, PreprocessError> {
        let scaled = match *self {
            AmountScaler::Robust { center, scale } => (amount - center) / non_zero(scale),
            AmountScaler::Standard { mean, scale } => (amount - mean) / non_zero(scale),
            AmountScaler::Unfitted => return Err(PreprocessError::NotFitted),
        };

        if scaled.is_finite() {
            Ok(scaled)
        } else {
            Err(PreprocessError::NonFinite(amount))
        }
    }
}

// Constant features are exported with scale 0; sklearn treats them as 1.
fn non_zero(scale: f64) -> f64 {
    if scale == 0.0 {
        1.0
    } else {
        scale
    }
}

/// `ln(1 + amount) / 10`, used whenever the fitted scaler cannot be applied
pub fn fallback_scale(amount: f64) -> f64 {
    amount.ln_1p() / 10.0
}

/// Scale `amount`, degrading silently to [`fallback_scale`].
pub fn scale_amount(scaler: Option<&AmountScaler>, amount: f64) -> f64 {
    let Some(scaler) = scaler else {
        return fallback_scale(amount);
    };

    match scaler.transform(amount) {
        Ok(scaled) => scaled,
        Err(e) => {
            warn!(amount = amount, error = %e, "Amount scaler failed, using log fallback");
            fallback_scale(amount)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_robust_transform() {
        let scaler = AmountScaler::Robust {
            center: 22.0,
            scale: 72.0,
        };
        let scaled = scaler.transform(94.0).unwrap();
        assert!((scaled - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_standard_transform() {
        let scaler = AmountScaler::Standard {
            mean: 100.0,
            scale: 50.0,
        };
        assert_eq!(scaler.transform(50.0).unwrap(), -1.0);
    }

    #[test]
    fn test_zero_scale_treated_as_one() {
        let scaler = AmountScaler::Robust {
            center: 10.0,
            scale: 0.0,
        };
        assert_eq!(scaler.transform(15.0).unwrap(), 5.0);
    }

    #[test]
    fn test_unfitted_falls_back() {
        let scaler = AmountScaler::Unfitted;
        assert_eq!(scaler.transform(100.0), Err(PreprocessError::NotFitted));
        assert_eq!(scale_amount(Some(&scaler), 100.0), fallback_scale(100.0));
    }

    #[test]
    fn test_missing_scaler_falls_back() {
        let expected = 1000.0f64.ln_1p() / 10.0;
        assert_eq!(scale_amount(None, 1000.0), expected);
    }

    #[test]
    fn test_non_finite_result_falls_back() {
        let scaler = AmountScaler::Standard {
            mean: 0.0,
            scale: f64::MIN_POSITIVE,
        };
        let amount = 1e300;
        assert!(scaler.transform(amount).is_err());
        assert_eq!(scale_amount(Some(&scaler), amount), fallback_scale(amount));
    }

    #[test]
    fn test_fallback_handles_extreme_amounts() {
        for amount in [1e-9, 5e-7, 1e-6, 1.0, 1e9, 5e9, 1e15, f64::MAX] {
            let scaled = scale_amount(None, amount);
            assert!(scaled.is_finite() && scaled >= 0.0, "{amount} -> {scaled}");
            let scaled = scale_amount(Some(&AmountScaler::Unfitted), amount);
            assert!(scaled.is_finite(), "{amount} -> {scaled}");
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"kind": "robust", "center": 22.0, "scale": 71.5}}"#).unwrap();

        let scaler = AmountScaler::from_path(file.path()).unwrap();
        assert_eq!(
            scaler,
            AmountScaler::Robust {
                center: 22.0,
                scale: 71.5
            }
        );
    }

    #[test]
    fn test_load_rejects_unknown_kind() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"kind": "minmax", "min": 0.0}}"#).unwrap();

        assert!(matches!(
            AmountScaler::from_path(file.path()),
            Err(ModelError::Parse { .. })
        ));
    }
}

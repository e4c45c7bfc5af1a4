//! Model artifact loading and the process-wide model state

use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::feature_extractor::{default_feature_names, FeatureExtractor, FeatureSchema};
use crate::models::forest::RandomForest;
use crate::models::{compat, Classifier};
use crate::scaler::AmountScaler;
use std::fmt;
use std::path::Path;
use tracing::{error, info, warn};

/// Classifier, amount scaler and feature schema, loaded once at startup.
///
/// Read-only after construction. Without a classifier the state is
/// "unloaded" and scoring runs the degraded heuristic.
pub struct ModelState {
    classifier: Option<Box<dyn Classifier>>,
    scaler: Option<AmountScaler>,
    extractor: FeatureExtractor,
}

impl ModelState {
    /// No classifier; default schema, no scaler
    pub fn unloaded() -> Self {
        Self {
            classifier: None,
            scaler: None,
            extractor: FeatureExtractor::default(),
        }
    }

    /// Assemble a loaded state, checking the schema against the classifier
    pub fn loaded(
        classifier: Box<dyn Classifier>,
        scaler: AmountScaler,
        feature_names: Vec<String>,
    ) -> Result<Self, ModelError> {
        let schema = FeatureSchema::new(feature_names)?;

        if let Some(expected) = classifier.n_features() {
            if expected != schema.len() {
                return Err(ModelError::FeatureCount {
                    expected,
                    actual: schema.len(),
                });
            }
        }

        Ok(Self {
            classifier: Some(classifier),
            scaler: Some(scaler),
            extractor: FeatureExtractor::new(schema),
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn classifier(&self) -> Option<&dyn Classifier> {
        self.classifier.as_deref()
    }

    pub fn scaler(&self) -> Option<&AmountScaler> {
        self.scaler.as_ref()
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn feature_names(&self) -> &[String] {
        self.extractor.schema().names()
    }
}

impl fmt::Debug for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelState")
            .field("classifier", &self.classifier.as_ref().map(|c| c.name()))
            .field("scaler", &self.scaler)
            .field("features", &self.extractor.feature_count())
            .finish()
    }
}

/// Loader for model artifacts
pub struct ModelLoader {
    config: ModelConfig,
}

impl ModelLoader {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    /// Load the model state.
    ///
    /// Any failure degrades to [`ModelState::unloaded`] unless `require_model`
    /// is set, in which case it is returned to the caller.
    pub fn load(&self, require_model: bool) -> Result<ModelState, ModelError> {
        match self.load_artifacts() {
            Ok(state) => {
                info!(
                    classifier = state.classifier().map(|c| c.name()).unwrap_or("none"),
                    features = state.extractor().feature_count(),
                    "Model state loaded"
                );
                Ok(state)
            }
            Err(e) if require_model => {
                error!(error = %e, "Failed to load model");
                Err(e)
            }
            Err(ModelError::Unavailable(path)) => {
                warn!(
                    path = %path.display(),
                    "Model not found, scoring with the fallback heuristic"
                );
                Ok(ModelState::unloaded())
            }
            Err(e) => {
                error!(error = %e, "Failed to load model");
                warn!("Continuing without model (scoring with the fallback heuristic)");
                Ok(ModelState::unloaded())
            }
        }
    }

    fn load_artifacts(&self) -> Result<ModelState, ModelError> {
        let model_path = &self.config.model_path;
        if !model_path.exists() {
            return Err(ModelError::Unavailable(model_path.clone()));
        }

        let classifier = self.load_classifier(model_path)?;
        info!(model = %classifier.name(), path = %model_path.display(), "Classifier loaded");

        let scaler_path = &self.config.scaler_path;
        let scaler = if scaler_path.exists() {
            AmountScaler::from_path(scaler_path)?
        } else {
            warn!(
                path = %scaler_path.display(),
                "Amount scaler not found, amounts will use the log fallback"
            );
            AmountScaler::Unfitted
        };

        let features_path = &self.config.features_path;
        let feature_names = if features_path.exists() {
            load_feature_names(features_path)?
        } else {
            warn!(
                path = %features_path.display(),
                "Feature list not found, using default column order"
            );
            default_feature_names()
        };

        ModelState::loaded(classifier, scaler, feature_names)
    }

    fn load_classifier(&self, path: &Path) -> Result<Box<dyn Classifier>, ModelError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "json" => {
                let mut forest = RandomForest::from_path(path)?;
                if self.config.repair_on_load {
                    compat::repair_missing_tree_metadata(&mut forest);
                }
                Ok(Box::new(forest))
            }
            #[cfg(feature = "onnx")]
            "onnx" => Ok(Box::new(crate::models::onnx::OnnxClassifier::load(
                path,
                self.config.onnx_threads,
            )?)),
            #[cfg(not(feature = "onnx"))]
            "onnx" => Err(ModelError::UnsupportedFormat(
                "onnx (build with the `onnx` feature)".to_string(),
            )),
            other => Err(ModelError::UnsupportedFormat(format!(
                "'.{other}' ({})",
                path.display()
            ))),
        }
    }
}

/// Ordered feature names from a JSON array
pub fn load_feature_names<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ModelError> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forest::tests::{forest, stump};

    fn config_in(dir: &Path) -> ModelConfig {
        ModelConfig {
            model_path: dir.join("fraud_classifier.json"),
            scaler_path: dir.join("amount_scaler.json"),
            features_path: dir.join("feature_columns.json"),
            ..ModelConfig::default()
        }
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) {
        std::fs::write(path, serde_json::to_string(value).unwrap()).unwrap();
    }

    #[test]
    fn test_missing_model_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let state = ModelLoader::new(config_in(dir.path())).load(false).unwrap();

        assert!(!state.is_loaded());
        assert_eq!(state.feature_names().len(), 33);
    }

    #[test]
    fn test_missing_model_fatal_when_required() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelLoader::new(config_in(dir.path())).load(true).unwrap_err();
        assert!(matches!(err, ModelError::Unavailable(_)));
    }

    #[test]
    fn test_load_full_artifact_set() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        write_json(&config.model_path, &forest(33, vec![stump(33, 28, 0.5)]));
        write_json(
            &config.scaler_path,
            &AmountScaler::Robust {
                center: 10.0,
                scale: 2.0,
            },
        );
        write_json(&config.features_path, &default_feature_names());

        let state = ModelLoader::new(config).load(true).unwrap();
        assert!(state.is_loaded());
        assert_eq!(state.classifier().unwrap().name(), "random_forest");
        assert!(matches!(state.scaler(), Some(AmountScaler::Robust { .. })));
    }

    #[test]
    fn test_missing_scaler_and_features_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        write_json(&config.model_path, &forest(33, vec![stump(33, 0, 0.5)]));

        let state = ModelLoader::new(config).load(true).unwrap();
        assert!(state.is_loaded());
        assert_eq!(state.scaler(), Some(&AmountScaler::Unfitted));
        assert_eq!(state.feature_names(), default_feature_names().as_slice());
    }

    #[test]
    fn test_feature_count_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        write_json(&config.model_path, &forest(2, vec![stump(2, 0, 0.5)]));

        let err = ModelLoader::new(config.clone()).load(true).unwrap_err();
        assert!(matches!(
            err,
            ModelError::FeatureCount {
                expected: 2,
                actual: 33
            }
        ));

        // Same artifact degrades outside production
        assert!(!ModelLoader::new(config).load(false).unwrap().is_loaded());
    }

    #[test]
    fn test_custom_feature_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        write_json(&config.model_path, &forest(2, vec![stump(2, 0, 0.5)]));
        write_json(&config.features_path, &vec!["Amount_scaled", "hour_sin"]);

        let state = ModelLoader::new(config).load(true).unwrap();
        assert_eq!(state.feature_names(), &["Amount_scaled", "hour_sin"]);
        assert_eq!(state.extractor().feature_count(), 2);
    }

    #[test]
    fn test_repair_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let mut tree = stump(33, 0, 0.5);
        tree.monotonic_cst = None;
        write_json(&config.model_path, &forest(33, vec![tree]));

        let state = ModelLoader::new(config).load(true).unwrap();
        let features = crate::feature_extractor::FeatureVector::new(vec![0.0; 33]);
        assert!(state.classifier().unwrap().predict(&features).is_ok());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.model_path = dir.path().join("fraud_classifier.pkl");
        std::fs::write(&config.model_path, b"not a model").unwrap();

        let err = ModelLoader::new(config).load(true).unwrap_err();
        assert!(matches!(err, ModelError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_corrupt_model_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        std::fs::write(&config.model_path, b"{ nope").unwrap();

        let err = ModelLoader::new(config).load(true).unwrap_err();
        assert!(matches!(err, ModelError::Parse { path, .. } if path.ends_with("fraud_classifier.json")));
    }

    #[test]
    fn test_unloaded_debug() {
        let rendered = format!("{:?}", ModelState::unloaded());
        assert!(rendered.contains("classifier: None"));
    }
}

//! ONNX Runtime backend for classifiers exported to ONNX

use crate::error::{ModelError, ScoringError};
use crate::feature_extractor::FeatureVector;
use crate::models::{Classifier, Prediction};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Classifier backed by an ONNX Runtime session.
///
/// `Session::run` needs exclusive access, so the session sits behind a mutex.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    label_name: Option<String>,
    probability_name: String,
}

impl OnnxClassifier {
    pub fn load(path: &Path, onnx_threads: usize) -> Result<Self, ModelError> {
        ort::init().commit()?;
        info!(path = %path.display(), threads = onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(onnx_threads)?
            .commit_from_file(path)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let label_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let probability_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(
            input = %input_name,
            label = ?label_name,
            probabilities = %probability_name,
            "ONNX model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            label_name,
            probability_name,
        })
    }

    fn extract_label(&self, outputs: &SessionOutputs) -> Option<i64> {
        let output = outputs.get(self.label_name.as_deref()?)?;
        let (_, data) = output.try_extract_tensor::<i64>().ok()?;
        data.first().copied()
    }

    /// Fraud probability from either a `[1, n_classes]` tensor or the
    /// `seq(map(int64, float))` layout produced by ZipMap exports
    fn extract_probability(&self, outputs: &SessionOutputs) -> Result<f64, ScoringError> {
        let output = outputs.get(self.probability_name.as_str()).ok_or_else(|| {
            ScoringError::Inference(format!("missing output '{}'", self.probability_name))
        })?;

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let classes = shape.last().copied().unwrap_or(1);
            let prob = if classes >= 2 { data.get(1) } else { data.first() };
            return prob
                .map(|&p| f64::from(p))
                .ok_or_else(|| ScoringError::Inference("empty probability tensor".to_string()));
        }

        if DynSequenceValueType::can_downcast(&output.dtype()) {
            return extract_from_sequence_map(output);
        }

        Err(ScoringError::Inference(format!(
            "unsupported probability output type {:?}",
            output.dtype()
        )))
    }
}

fn extract_from_sequence_map(output: &DynValue) -> Result<f64, ScoringError> {
    let allocator = Allocator::default();
    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| ScoringError::Inference(e.to_string()))?;
    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(|e| ScoringError::Inference(e.to_string()))?;
    let first = maps
        .first()
        .ok_or_else(|| ScoringError::Inference("empty probability sequence".to_string()))?;
    let pairs = first
        .try_extract_key_values::<i64, f32>()
        .map_err(|e| ScoringError::Inference(e.to_string()))?;

    if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 1) {
        return Ok(f64::from(*p));
    }
    if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 0) {
        return Ok(1.0 - f64::from(*p));
    }
    Err(ScoringError::Inference("no class probability in map".to_string()))
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    fn n_features(&self) -> Option<usize> {
        None
    }

    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ScoringError> {
        let shape = vec![1_i64, features.len() as i64];
        let input = Tensor::from_array((shape, features.to_f32()))
            .map_err(|e| ScoringError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ScoringError::Inference(format!("lock error: {e}")))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| ScoringError::Inference(e.to_string()))?;

        let fraud_probability = self.extract_probability(&outputs)?;
        let label = self.extract_label(&outputs).unwrap_or_else(|| {
            warn!("ONNX model has no label output, thresholding probability");
            i64::from(fraud_probability > 0.5)
        });

        debug!(label = label, fraud_probability = fraud_probability, "ONNX inference complete");

        Ok(Prediction {
            label,
            fraud_probability,
        })
    }
}

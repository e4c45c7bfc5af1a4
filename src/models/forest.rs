//! Native random-forest evaluator for JSON tree exports.
//!
//! Each tree carries the parallel node arrays of a fitted decision tree:
//!
//! ```json
//! {
//!   "n_features": 33,
//!   "classes": [0, 1],
//!   "estimators": [
//!     {
//!       "n_features": 33,
//!       "children_left":  [1, -1, -1],
//!       "children_right": [2, -1, -1],
//!       "feature":        [28, -2, -2],
//!       "threshold":      [0.5, -2.0, -2.0],
//!       "value":          [[50, 50], [45, 5], [5, 45]],
//!       "monotonic_cst":  [0, 0, ...]
//!     }
//!   ]
//! }
//! ```
//!
//! Trees exported by older trainers omit `monotonic_cst`. Those must go through
//! [`super::compat::repair_missing_tree_metadata`] before they can be evaluated.

use crate::error::{ModelError, ScoringError};
use crate::feature_extractor::FeatureVector;
use crate::models::{compat, Classifier, Prediction};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Marker for "no child" in `children_left` / `children_right`
pub const TREE_LEAF: i64 = -1;

/// One fitted decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub n_features: usize,
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// Per-node class counts (or fractions)
    pub value: Vec<Vec<f64>>,
    /// Per-feature monotonicity constraint (-1, 0, 1)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monotonic_cst: Option<Vec<i8>>,
}

impl DecisionTree {
    pub fn node_count(&self) -> usize {
        self.children_left.len()
    }

    /// Check array lengths and node references
    fn validate(&self, index: usize, n_classes: usize) -> Result<(), String> {
        let nodes = self.node_count();
        if nodes == 0 {
            return Err(format!("tree {index} has no nodes"));
        }
        if self.children_right.len() != nodes
            || self.feature.len() != nodes
            || self.threshold.len() != nodes
            || self.value.len() != nodes
        {
            return Err(format!("tree {index} has node arrays of different lengths"));
        }

        for node in 0..nodes {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == TREE_LEAF {
                if self.value[node].len() != n_classes {
                    return Err(format!(
                        "tree {index} leaf {node} has {} class values, expected {n_classes}",
                        self.value[node].len()
                    ));
                }
                continue;
            }
            for child in [left, right] {
                if child <= node as i64 || child as usize >= nodes {
                    return Err(format!("tree {index} node {node} has invalid child {child}"));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature as usize >= self.n_features {
                return Err(format!("tree {index} node {node} splits on feature {feature}"));
            }
        }

        Ok(())
    }

    /// Index of the leaf reached by `x`.
    ///
    /// Children always have a higher index than their parent (checked by
    /// `validate`), so the walk terminates.
    fn leaf_index(&self, x: &[f64]) -> usize {
        let mut node = 0usize;
        while self.children_left[node] != TREE_LEAF {
            let feature = self.feature[node] as usize;
            // Trees split on single-precision inputs
            let value = f64::from(x[feature] as f32);
            node = if value <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        node
    }

    /// Normalized class distribution at the leaf reached by `x`
    pub fn predict_proba(&self, x: &[f64]) -> Vec<f64> {
        let counts = &self.value[self.leaf_index(x)];
        let total: f64 = counts.iter().sum();
        if total > 0.0 {
            counts.iter().map(|c| c / total).collect()
        } else {
            vec![1.0 / counts.len() as f64; counts.len()]
        }
    }
}

/// Bagged ensemble of decision trees; probabilities are averaged across trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    pub classes: Vec<i64>,
    pub estimators: Vec<DecisionTree>,
}

impl RandomForest {
    /// Load a forest export from a JSON file and validate its structure
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let forest: RandomForest =
            serde_json::from_str(&raw).map_err(|source| ModelError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        forest.validate()?;
        Ok(forest)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.classes.len() < 2 {
            return Err(ModelError::Malformed(format!(
                "forest declares {} classes, need at least 2",
                self.classes.len()
            )));
        }
        if !self.classes.contains(&1) {
            return Err(ModelError::Malformed(
                "forest has no positive (1) class".to_string(),
            ));
        }
        if self.estimators.is_empty() {
            return Err(ModelError::Malformed("forest has no trees".to_string()));
        }
        for (index, tree) in self.estimators.iter().enumerate() {
            if tree.n_features != self.n_features {
                return Err(ModelError::Malformed(format!(
                    "tree {index} expects {} features, forest expects {}",
                    tree.n_features, self.n_features
                )));
            }
            tree.validate(index, self.classes.len())
                .map_err(ModelError::Malformed)?;
        }
        Ok(())
    }

    /// First tree lacking the metadata block required for evaluation
    pub fn first_incomplete_tree(&self) -> Option<usize> {
        self.estimators
            .iter()
            .position(|tree| tree.monotonic_cst.is_none())
    }

    /// Mean class distribution over all trees
    pub fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ScoringError> {
        if x.len() != self.n_features {
            return Err(ScoringError::FeatureCount {
                expected: self.n_features,
                actual: x.len(),
            });
        }
        if let Some(tree) = self.first_incomplete_tree() {
            return Err(ScoringError::MissingTreeMetadata { tree });
        }

        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.estimators {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(x)) {
                *acc += p;
            }
        }
        let n_trees = self.estimators.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn predict(&self, features: &FeatureVector) -> Result<Prediction, ScoringError> {
        let proba = self.predict_proba(features.as_slice())?;

        // argmax, first class wins ties
        let best = proba
            .iter()
            .enumerate()
            .fold(0, |best, (i, &p)| if p > proba[best] { i } else { best });

        let fraud_probability = self
            .classes
            .iter()
            .position(|&c| c == 1)
            .map(|i| proba[i])
            .ok_or_else(|| ScoringError::Malformed("no positive class".to_string()))?;

        Ok(Prediction {
            label: self.classes[best],
            fraud_probability,
        })
    }

    fn repaired(&self) -> Option<Box<dyn Classifier>> {
        let mut copy = self.clone();
        if compat::repair_missing_tree_metadata(&mut copy) > 0 {
            Some(Box::new(copy))
        } else {
            None
        }
    }
}

//! Compatibility repairs for model artifacts exported by older trainers.

use crate::models::forest::RandomForest;
use tracing::warn;

/// Install a neutral monotonic constraint (all zeros) on every tree that lacks
/// one. Returns the number of trees repaired.
pub fn repair_missing_tree_metadata(forest: &mut RandomForest) -> usize {
    let mut repaired = 0;
    for tree in &mut forest.estimators {
        if tree.monotonic_cst.is_none() {
            tree.monotonic_cst = Some(vec![0; tree.n_features]);
            repaired += 1;
        }
    }

    if repaired > 0 {
        warn!(
            trees = repaired,
            total = forest.estimators.len(),
            "Installed neutral monotonic constraints on trees missing them"
        );
    }

    repaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::forest::tests::{forest, stump};

    #[test]
    fn test_repair_fills_only_missing() {
        let mut incomplete = stump(4, 0, 0.5);
        incomplete.monotonic_cst = None;
        let mut constrained = stump(4, 1, 0.5);
        constrained.monotonic_cst = Some(vec![1, 0, -1, 0]);

        let mut model = forest(4, vec![incomplete, constrained]);
        assert_eq!(repair_missing_tree_metadata(&mut model), 1);

        assert_eq!(model.estimators[0].monotonic_cst, Some(vec![0; 4]));
        assert_eq!(model.estimators[1].monotonic_cst, Some(vec![1, 0, -1, 0]));
        assert_eq!(model.first_incomplete_tree(), None);
    }

    #[test]
    fn test_repair_is_idempotent() {
        let mut tree = stump(2, 0, 0.5);
        tree.monotonic_cst = None;
        let mut model = forest(2, vec![tree]);

        assert_eq!(repair_missing_tree_metadata(&mut model), 1);
        assert_eq!(repair_missing_tree_metadata(&mut model), 0);
    }
}

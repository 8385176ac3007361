//! Random forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{ForestParams, OobMode};
use crate::error::{ForestError, validate_training_data};
use crate::label::Label;
use crate::oob::{OobScore, compute_oob};
use crate::tree::DecisionTree;

/// A bagged ensemble of decision trees.
///
/// Created empty with [`RandomForest::new`] and populated by
/// [`fit`](RandomForest::fit). Re-fitting discards and replaces every tree.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomForest<L> {
    pub(crate) params: ForestParams,
    pub(crate) trees: Vec<DecisionTree<L>>,
    pub(crate) n_features: Option<usize>,
    #[serde(skip)]
    pub(crate) bootstrap_indices: Vec<Vec<usize>>,
    pub(crate) oob_score: Option<OobScore>,
}

/// Draw `n_samples` row indices uniformly with replacement.
pub(crate) fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

impl<L: Label> RandomForest<L> {
    /// Create an unfitted forest.
    #[must_use]
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            n_features: None,
            bootstrap_indices: Vec::new(),
            oob_score: None,
        }
    }

    /// Assemble a forest from trees that were fitted elsewhere.
    ///
    /// Tree order is kept and decides vote ties.
    ///
    /// # Errors
    ///
    /// | Variant                              | When                                   |
    /// |--------------------------------------|----------------------------------------|
    /// | [`ForestError::InvalidTreeCount`]    | `trees` is empty                       |
    /// | [`ForestError::NotFitted`]           | any tree is unfitted                   |
    /// | [`ForestError::InconsistentTrees`]   | trees disagree on their feature count  |
    pub fn from_trees(trees: Vec<DecisionTree<L>>) -> Result<Self, ForestError> {
        let mut params = ForestParams::new(trees.len())?;
        let first = trees[0].n_features().ok_or(ForestError::NotFitted)?;
        for (tree_index, tree) in trees.iter().enumerate() {
            let got = tree.n_features().ok_or(ForestError::NotFitted)?;
            if got != first {
                return Err(ForestError::InconsistentTrees {
                    expected: first,
                    got,
                    tree_index,
                });
            }
        }
        params.tree = trees[0].params().clone();
        Ok(Self {
            params,
            trees,
            n_features: Some(first),
            bootstrap_indices: Vec::new(),
            oob_score: None,
        })
    }

    /// Train the ensemble on a row-major dataset.
    ///
    /// One seed per tree is drawn from a master `ChaCha8Rng`; each tree then
    /// draws its own bootstrap sample and is fitted on a rayon worker. Trees
    /// are kept in seed order, so results do not depend on the thread count.
    /// Existing trees are replaced only if every tree fits.
    ///
    /// # Errors
    ///
    /// | Variant                                 | When                                           |
    /// |-----------------------------------------|------------------------------------------------|
    /// | [`ForestError::LabelCountMismatch`]     | `features.len() != labels.len()`               |
    /// | [`ForestError::EmptyDataset`]           | `features` is empty                            |
    /// | [`ForestError::ZeroFeatures`]           | rows have zero feature columns                 |
    /// | [`ForestError::FeatureCountMismatch`]   | rows have inconsistent lengths                 |
    /// | [`ForestError::NonFiniteValue`]         | any value is NaN or infinite                   |
    /// | [`ForestError::InvalidMaxDepth`]        | `max_depth` is 0                               |
    /// | [`ForestError::InvalidMinSamplesSplit`] | `min_samples_split` is 0                       |
    /// | [`ForestError::InvalidMaxFeatures`]     | `n_feats` is 0 or exceeds the feature count    |
    /// | [`ForestError::OobEvaluationFailed`]    | OOB enabled but no sample has any OOB tree     |
    #[instrument(skip_all, fields(n_trees = self.params.n_trees, n_samples = features.len()))]
    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[L]) -> Result<(), ForestError> {
        let n_features = validate_training_data(features, labels)?;
        let n_feats = self.params.tree.validate(n_features)?;
        let n_samples = features.len();

        info!(
            n_trees = self.params.n_trees,
            n_samples,
            n_features,
            n_feats,
            "training random forest"
        );

        let mut master_rng = ChaCha8Rng::seed_from_u64(self.params.seed);
        let tree_seeds: Vec<u64> = (0..self.params.n_trees)
            .map(|_| master_rng.r#gen())
            .collect();

        let tree_params = &self.params.tree;
        let fitted: Vec<(DecisionTree<L>, Vec<usize>)> = tree_seeds
            .into_par_iter()
            .map(|seed| -> Result<(DecisionTree<L>, Vec<usize>), ForestError> {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let indices = bootstrap_sample(n_samples, &mut rng);

                let boot_features: Vec<Vec<f64>> =
                    indices.iter().map(|&i| features[i].clone()).collect();
                let boot_labels: Vec<L> = indices.iter().map(|&i| labels[i].clone()).collect();

                let mut tree = DecisionTree::new(tree_params.clone().with_seed(rng.r#gen()));
                tree.fit(&boot_features, &boot_labels)?;
                Ok((tree, indices))
            })
            .collect::<Result<_, ForestError>>()?;

        let (trees, bootstrap_indices): (Vec<_>, Vec<_>) = fitted.into_iter().unzip();

        debug!(
            n_trees_trained = trees.len(),
            total_nodes = trees.iter().map(DecisionTree::n_nodes).sum::<usize>(),
            "tree training complete"
        );

        let oob_score = match self.params.oob_mode {
            OobMode::Enabled => Some(compute_oob(&trees, features, labels, &bootstrap_indices)?),
            OobMode::Disabled => None,
        };

        self.trees = trees;
        self.n_features = Some(n_features);
        self.bootstrap_indices = bootstrap_indices;
        self.oob_score = oob_score;

        info!(
            oob_accuracy = self.oob_score.as_ref().map(|s| s.accuracy),
            "random forest training complete"
        );
        Ok(())
    }
}

impl<L: Label> Default for RandomForest<L> {
    fn default() -> Self {
        Self::new(ForestParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeParams;

    /// Simple 3-class dataset separable on the first feature.
    fn make_separable_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for (class, offset) in [0.0, 10.0, 20.0].into_iter().enumerate() {
            for i in 0..20 {
                features.push(vec![offset + i as f64 * 0.15, 0.5]);
                labels.push(class);
            }
        }
        (features, labels)
    }

    #[test]
    fn bootstrap_sample_has_n_rows_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for n in [1, 2, 17, 100] {
            let sample = bootstrap_sample(n, &mut rng);
            assert_eq!(sample.len(), n);
            assert!(sample.iter().all(|&i| i < n));
        }
    }

    #[test]
    fn every_bootstrap_sample_matches_training_size() {
        let (features, labels) = make_separable_data();
        let mut forest = RandomForest::new(ForestParams::new(8).unwrap());
        forest.fit(&features, &labels).unwrap();
        assert_eq!(forest.bootstrap_indices().len(), 8);
        for indices in forest.bootstrap_indices() {
            assert_eq!(indices.len(), features.len());
        }
    }

    #[test]
    fn three_class_training_accuracy() {
        let (features, labels) = make_separable_data();
        let mut forest = RandomForest::new(ForestParams::new(25).unwrap().with_seed(42));
        forest.fit(&features, &labels).unwrap();
        let predictions = forest.predict(&features).unwrap();
        let correct = predictions.iter().zip(&labels).filter(|(p, l)| p == l).count();
        assert!(correct as f64 / labels.len() as f64 > 0.95);
    }

    #[test]
    fn oob_score_computed_when_enabled() {
        let (features, labels) = make_separable_data();
        let mut forest = RandomForest::new(
            ForestParams::new(30)
                .unwrap()
                .with_oob_mode(OobMode::Enabled),
        );
        forest.fit(&features, &labels).unwrap();
        let oob = forest.oob_score().expect("OOB should be computed");
        assert!(oob.accuracy > 0.8, "oob accuracy = {}", oob.accuracy);
        assert!(oob.n_oob_samples > 0);
    }

    #[test]
    fn oob_absent_by_default() {
        let (features, labels) = make_separable_data();
        let mut forest = RandomForest::new(ForestParams::new(3).unwrap());
        forest.fit(&features, &labels).unwrap();
        assert!(forest.oob_score().is_none());
    }

    #[test]
    fn refit_replaces_trees() {
        let (features, labels) = make_separable_data();
        let mut forest = RandomForest::new(ForestParams::new(4).unwrap());
        forest.fit(&features, &labels).unwrap();
        forest.fit(&features[..30], &labels[..30]).unwrap();
        assert_eq!(forest.n_trees(), 4);
        assert!(forest.bootstrap_indices().iter().all(|b| b.len() == 30));
    }

    #[test]
    fn failed_fit_keeps_previous_model() {
        let (features, labels) = make_separable_data();
        let mut forest = RandomForest::new(ForestParams::new(4).unwrap());
        forest.fit(&features, &labels).unwrap();
        let before = forest.predict(&features).unwrap();

        let err = forest.fit(&features, &labels[..10]).unwrap_err();
        assert!(matches!(err, ForestError::LabelCountMismatch { .. }));
        assert_eq!(forest.predict(&features).unwrap(), before);
    }

    #[test]
    fn n_feats_larger_than_width_rejected() {
        let (features, labels) = make_separable_data();
        let mut forest =
            RandomForest::new(ForestParams::new(2).unwrap().with_n_feats(Some(3)));
        let err = forest.fit(&features, &labels).unwrap_err();
        assert!(matches!(
            err,
            ForestError::InvalidMaxFeatures { n_feats: 3, n_features: 2 }
        ));
        assert!(!forest.is_fitted());
    }

    #[test]
    fn single_label_gives_one_class_forest() {
        let features: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64]).collect();
        let labels = vec!["same"; 10];
        let mut forest = RandomForest::new(ForestParams::new(5).unwrap());
        forest.fit(&features, &labels).unwrap();
        assert!(forest.trees().iter().all(|t| t.n_nodes() == 1));
        assert_eq!(forest.predict(&[vec![-3.0], vec![42.0]]).unwrap(), vec!["same", "same"]);
    }

    #[test]
    fn from_trees_rejects_unfitted_and_mismatched() {
        let unfitted: DecisionTree<u8> = DecisionTree::new(TreeParams::new());
        assert!(matches!(
            RandomForest::from_trees(vec![unfitted]),
            Err(ForestError::NotFitted)
        ));

        let mut narrow = DecisionTree::new(TreeParams::new());
        narrow.fit(&[vec![0.0], vec![1.0]], &[0u8, 1]).unwrap();
        let mut wide = DecisionTree::new(TreeParams::new());
        wide.fit(&[vec![0.0, 0.0], vec![1.0, 1.0]], &[0u8, 1]).unwrap();
        assert!(matches!(
            RandomForest::from_trees(vec![narrow, wide]),
            Err(ForestError::InconsistentTrees { expected: 1, got: 2, tree_index: 1 })
        ));

        assert!(matches!(
            RandomForest::<u8>::from_trees(Vec::new()),
            Err(ForestError::InvalidTreeCount { n_trees: 0 })
        ));
    }
}

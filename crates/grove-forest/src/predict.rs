//! Prediction and introspection for the random forest ensemble.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::config::ForestParams;
use crate::error::ForestError;
use crate::forest::RandomForest;
use crate::label::Label;
use crate::oob::OobScore;
use crate::tree::DecisionTree;
use crate::vote::majority_vote;

impl<L: Label> RandomForest<L> {
    /// Predict one label per row by plurality vote over all trees.
    ///
    /// Every tree predicts the full batch (trees run in parallel); for each
    /// row the per-tree labels are tallied in tree order and the most
    /// frequent wins, ties going to the label that appeared first.
    ///
    /// # Errors
    ///
    /// | Variant                                    | When                             |
    /// |--------------------------------------------|----------------------------------|
    /// | [`ForestError::NotFitted`]                 | the forest has no trees          |
    /// | [`ForestError::PredictionFeatureMismatch`] | a row has the wrong width        |
    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<L>, ForestError> {
        if self.trees.is_empty() {
            return Err(ForestError::NotFitted);
        }

        let per_tree: Vec<Vec<L>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(features))
            .collect::<Result<_, ForestError>>()?;

        (0..features.len())
            .map(|row| {
                majority_vote(per_tree.iter().map(|preds| &preds[row]))
                    .ok_or(ForestError::NotFitted)
            })
            .collect()
    }

    /// Predict the label of a single row.
    ///
    /// # Errors
    ///
    /// Same as [`predict`](RandomForest::predict).
    pub fn predict_row(&self, row: &[f64]) -> Result<L, ForestError> {
        let votes = self
            .trees
            .iter()
            .map(|tree| tree.predict_row(row))
            .collect::<Result<Vec<&L>, ForestError>>()?;
        majority_vote(votes).ok_or(ForestError::NotFitted)
    }

    /// Return `true` once the forest holds fitted trees.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Return the forest's hyperparameters.
    #[must_use]
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Return the fitted trees in vote order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree<L>] {
        &self.trees
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    /// Return each tree's bootstrap row indices from the last `fit`.
    ///
    /// Not persisted by [`save`](RandomForest::save); empty after `load`
    /// and for forests built with [`from_trees`](RandomForest::from_trees).
    #[must_use]
    pub fn bootstrap_indices(&self) -> &[Vec<usize>] {
        &self.bootstrap_indices
    }

    /// Return the OOB score, if it was computed.
    #[must_use]
    pub fn oob_score(&self) -> Option<&OobScore> {
        self.oob_score.as_ref()
    }
}

//! Hyperparameter builders for trees and forests.

use crate::error::ForestError;
use crate::split::SplitCriterion;

/// Whether to compute out-of-bag evaluation during forest training.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OobMode {
    /// Compute OOB accuracy after fitting.
    Enabled,
    /// Skip OOB evaluation.
    #[default]
    Disabled,
}

/// Hyperparameters for a single decision tree.
///
/// Construct via [`TreeParams::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `min_samples_split` | 2                     |
/// | `max_depth`         | 100                   |
/// | `n_feats`           | `None` (all features) |
/// | `criterion`         | `Entropy`             |
/// | `seed`              | 42                    |
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TreeParams {
    pub(crate) min_samples_split: usize,
    pub(crate) max_depth: usize,
    pub(crate) n_feats: Option<usize>,
    pub(crate) criterion: SplitCriterion,
    pub(crate) seed: u64,
}

impl TreeParams {
    /// Create tree parameters with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_samples_split: 2,
            max_depth: 100,
            n_feats: None,
            criterion: SplitCriterion::Entropy,
            seed: 42,
        }
    }

    /// Set the minimum number of samples a node needs before a split is attempted.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the maximum tree depth (the root is depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the number of features drawn at each node. `None` considers all.
    #[must_use]
    pub fn with_n_feats(mut self, n_feats: Option<usize>) -> Self {
        self.n_feats = n_feats;
        self
    }

    /// Set the impurity criterion.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the seed for per-node feature sampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the minimum samples required to attempt a split.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the maximum depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return the number of features drawn per node, if limited.
    #[must_use]
    pub fn n_feats(&self) -> Option<usize> {
        self.n_feats
    }

    /// Return the impurity criterion.
    #[must_use]
    pub fn criterion(&self) -> SplitCriterion {
        self.criterion
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Check the parameters against a dataset width.
    ///
    /// Returns the number of features to draw per node.
    pub(crate) fn validate(&self, n_features: usize) -> Result<usize, ForestError> {
        if self.max_depth == 0 {
            return Err(ForestError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.min_samples_split == 0 {
            return Err(ForestError::InvalidMinSamplesSplit {
                min_samples_split: 0,
            });
        }
        let n_feats = self.n_feats.unwrap_or(n_features);
        if n_feats == 0 || n_feats > n_features {
            return Err(ForestError::InvalidMaxFeatures {
                n_feats,
                n_features,
            });
        }
        Ok(n_feats)
    }
}

impl Default for TreeParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Hyperparameters for a random forest.
///
/// Construct via [`ForestParams::new`], then chain `with_*` methods. The
/// tree-level settings are passed through to every tree; each tree's seed
/// is derived from the forest seed.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `n_trees`           | 100 (via `Default`)   |
/// | `min_samples_split` | 2                     |
/// | `max_depth`         | 100                   |
/// | `n_feats`           | `None` (all features) |
/// | `criterion`         | `Entropy`             |
/// | `seed`              | 42                    |
/// | `oob_mode`          | `Disabled`            |
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ForestParams {
    pub(crate) n_trees: usize,
    pub(crate) tree: TreeParams,
    pub(crate) seed: u64,
    pub(crate) oob_mode: OobMode,
}

impl ForestParams {
    /// Create forest parameters with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, ForestError> {
        if n_trees == 0 {
            return Err(ForestError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            tree: TreeParams::new(),
            seed: 42,
            oob_mode: OobMode::Disabled,
        })
    }

    /// Set the minimum number of samples a node needs before a split is attempted.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.tree.min_samples_split = min_samples_split;
        self
    }

    /// Set the maximum depth of every tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.tree.max_depth = max_depth;
        self
    }

    /// Set the number of features drawn at each node. `None` considers all.
    #[must_use]
    pub fn with_n_feats(mut self, n_feats: Option<usize>) -> Self {
        self.tree.n_feats = n_feats;
        self
    }

    /// Set the impurity criterion used by every tree.
    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.tree.criterion = criterion;
        self
    }

    /// Set the master seed for bootstrap draws and per-tree seeds.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the OOB evaluation mode.
    #[must_use]
    pub fn with_oob_mode(mut self, oob_mode: OobMode) -> Self {
        self.oob_mode = oob_mode;
        self
    }

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the parameters shared by every tree (seed excluded).
    #[must_use]
    pub fn tree_params(&self) -> &TreeParams {
        &self.tree
    }

    /// Return the master seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the OOB evaluation mode.
    #[must_use]
    pub fn oob_mode(&self) -> OobMode {
        self.oob_mode
    }
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            tree: TreeParams::new(),
            seed: 42,
            oob_mode: OobMode::Disabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_defaults() {
        let params = TreeParams::default();
        assert_eq!(params.min_samples_split(), 2);
        assert_eq!(params.max_depth(), 100);
        assert_eq!(params.n_feats(), None);
        assert_eq!(params.criterion(), SplitCriterion::Entropy);
    }

    #[test]
    fn forest_defaults() {
        let params = ForestParams::default();
        assert_eq!(params.n_trees(), 100);
        assert_eq!(params.oob_mode(), OobMode::Disabled);
        assert_eq!(params.tree_params(), &TreeParams::new());
    }

    #[test]
    fn forest_setters_reach_tree_params() {
        let params = ForestParams::new(3)
            .unwrap()
            .with_max_depth(7)
            .with_min_samples_split(4)
            .with_n_feats(Some(2))
            .with_criterion(SplitCriterion::Gini);
        let tree = params.tree_params();
        assert_eq!(tree.max_depth(), 7);
        assert_eq!(tree.min_samples_split(), 4);
        assert_eq!(tree.n_feats(), Some(2));
        assert_eq!(tree.criterion(), SplitCriterion::Gini);
    }

    #[test]
    fn zero_trees_rejected() {
        assert!(matches!(
            ForestParams::new(0),
            Err(ForestError::InvalidTreeCount { n_trees: 0 })
        ));
    }

    #[test]
    fn validate_resolves_all_features() {
        assert_eq!(TreeParams::new().validate(5).unwrap(), 5);
        assert_eq!(TreeParams::new().with_n_feats(Some(2)).validate(5).unwrap(), 2);
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(matches!(
            TreeParams::new().with_max_depth(0).validate(3),
            Err(ForestError::InvalidMaxDepth { .. })
        ));
        assert!(matches!(
            TreeParams::new().with_min_samples_split(0).validate(3),
            Err(ForestError::InvalidMinSamplesSplit { .. })
        ));
        assert!(matches!(
            TreeParams::new().with_n_feats(Some(4)).validate(3),
            Err(ForestError::InvalidMaxFeatures { n_feats: 4, n_features: 3 })
        ));
        assert!(matches!(
            TreeParams::new().with_n_feats(Some(0)).validate(3),
            Err(ForestError::InvalidMaxFeatures { n_feats: 0, .. })
        ));
    }
}

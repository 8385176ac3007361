use std::collections::VecDeque;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::config::TreeParams;
use crate::error::{ForestError, validate_training_data};
use crate::label::{Label, encode_labels};
use crate::node::{Impurity, Node, NodeIndex};
use crate::split::find_best_split;
use crate::vote::argmax_first;

/// A CART-style classification tree over numeric features.
///
/// Created empty with [`DecisionTree::new`], populated by
/// [`fit`](DecisionTree::fit), then read-only. Nodes are stored in an arena
/// (`Vec<Node>`, root at index 0) and leaves hold an index into the tree's
/// class table, which lists the distinct training labels in first-seen order.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree<L> {
    params: TreeParams,
    fitted: Option<FittedTree<L>>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct FittedTree<L> {
    nodes: Vec<Node>,
    classes: Vec<L>,
    n_features: usize,
}

impl<L: Label> DecisionTree<L> {
    /// Create an unfitted tree.
    #[must_use]
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            fitted: None,
        }
    }

    /// Return the tree's hyperparameters.
    #[must_use]
    pub fn params(&self) -> &TreeParams {
        &self.params
    }

    /// Grow the tree on a row-major dataset.
    ///
    /// `features[sample_idx][feature_idx]` and `labels[sample_idx]`. A
    /// previously fitted tree is replaced only if fitting succeeds.
    ///
    /// # Errors
    ///
    /// | Variant                                 | When                                        |
    /// |-----------------------------------------|---------------------------------------------|
    /// | [`ForestError::LabelCountMismatch`]     | `features.len() != labels.len()`            |
    /// | [`ForestError::EmptyDataset`]           | `features` is empty                         |
    /// | [`ForestError::ZeroFeatures`]           | rows have zero feature columns              |
    /// | [`ForestError::FeatureCountMismatch`]   | rows have inconsistent lengths              |
    /// | [`ForestError::NonFiniteValue`]         | any value is NaN or infinite                |
    /// | [`ForestError::InvalidMaxDepth`]        | `max_depth` is 0                            |
    /// | [`ForestError::InvalidMinSamplesSplit`] | `min_samples_split` is 0                    |
    /// | [`ForestError::InvalidMaxFeatures`]     | `n_feats` is 0 or exceeds the feature count |
    #[instrument(skip_all, fields(n_samples = features.len(), seed = self.params.seed))]
    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[L]) -> Result<(), ForestError> {
        let n_features = validate_training_data(features, labels)?;
        let n_feats = self.params.validate(n_features)?;

        let (classes, encoded) = encode_labels(labels);

        debug!(
            n_features,
            n_classes = classes.len(),
            n_feats,
            "fitting decision tree"
        );

        // Column-major copy so split search walks contiguous memory.
        let columns: Vec<Vec<f64>> = (0..n_features)
            .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
            .collect();

        let mut grower = Grower {
            columns: &columns,
            classes: &encoded,
            n_classes: classes.len(),
            params: &self.params,
            n_feats,
            rng: ChaCha8Rng::seed_from_u64(self.params.seed),
            arena: Vec::new(),
        };
        let samples: Vec<usize> = (0..features.len()).collect();
        grower.grow(&samples, 0);
        let nodes = grower.arena;

        debug!(n_nodes = nodes.len(), "decision tree built");

        self.fitted = Some(FittedTree {
            nodes,
            classes,
            n_features,
        });
        Ok(())
    }

    /// Predict one label per row.
    ///
    /// # Errors
    ///
    /// | Variant                                    | When                             |
    /// |--------------------------------------------|----------------------------------|
    /// | [`ForestError::NotFitted`]                 | called before a successful `fit` |
    /// | [`ForestError::PredictionFeatureMismatch`] | a row has the wrong width        |
    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<L>, ForestError> {
        if !self.is_fitted() {
            return Err(ForestError::NotFitted);
        }
        features
            .iter()
            .map(|row| self.predict_row(row).cloned())
            .collect()
    }

    /// Predict the label of a single row.
    ///
    /// Traverses from the root: at each split, goes left when
    /// `row[feature] <= threshold`, right otherwise.
    ///
    /// # Errors
    ///
    /// Same as [`predict`](DecisionTree::predict).
    pub fn predict_row(&self, row: &[f64]) -> Result<&L, ForestError> {
        let fitted = self.fitted.as_ref().ok_or(ForestError::NotFitted)?;
        if row.len() != fitted.n_features {
            return Err(ForestError::PredictionFeatureMismatch {
                expected: fitted.n_features,
                got: row.len(),
            });
        }
        let mut idx = NodeIndex::ROOT;
        loop {
            match &fitted.nodes[idx.index()] {
                Node::Leaf { class, .. } => return Ok(&fitted.classes[*class]),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[feature.index()] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Return `true` once `fit` has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Return the node arena. Empty before fitting.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        self.fitted.as_ref().map(|f| f.nodes.as_slice()).unwrap_or_default()
    }

    /// Return the distinct training labels in first-seen order. Empty before fitting.
    #[must_use]
    pub fn classes(&self) -> &[L] {
        self.fitted.as_ref().map(|f| f.classes.as_slice()).unwrap_or_default()
    }

    /// Return the number of feature columns seen at fit time.
    #[must_use]
    pub fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_features)
    }

    /// Return the total number of nodes (splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes().len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes().iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the depth of the deepest leaf; a lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let nodes = self.nodes();
        if nodes.is_empty() {
            return 0;
        }

        let mut max_depth = 0usize;
        let mut queue = VecDeque::new();
        queue.push_back((NodeIndex::ROOT, 0usize));
        while let Some((idx, d)) = queue.pop_front() {
            match &nodes[idx.index()] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    queue.push_back((*left, d + 1));
                    queue.push_back((*right, d + 1));
                }
            }
        }
        max_depth
    }
}

impl<L: Label> Default for DecisionTree<L> {
    fn default() -> Self {
        Self::new(TreeParams::default())
    }
}

/// Recursive partitioning state for one `fit` call.
struct Grower<'a> {
    columns: &'a [Vec<f64>],
    classes: &'a [usize],
    n_classes: usize,
    params: &'a TreeParams,
    n_feats: usize,
    rng: ChaCha8Rng,
    arena: Vec<Node>,
}

impl Grower<'_> {
    /// Grow the subtree for `samples` and return the index of its root.
    fn grow(&mut self, samples: &[usize], depth: usize) -> NodeIndex {
        let n_samples = samples.len();

        let mut counts = vec![0usize; self.n_classes];
        for &si in samples {
            counts[self.classes[si]] += 1;
        }
        let impurity = self.params.criterion.impurity(&counts, n_samples);

        let n_labels = counts.iter().filter(|&&c| c > 0).count();
        if depth >= self.params.max_depth
            || n_labels == 1
            || n_samples < self.params.min_samples_split
        {
            return self.push_leaf(&counts, impurity, n_samples);
        }

        let Some(split) = find_best_split(
            self.columns,
            self.classes,
            samples,
            &counts,
            self.params.criterion,
            self.n_feats,
            &mut self.rng,
        ) else {
            return self.push_leaf(&counts, impurity, n_samples);
        };

        // Reserve the parent slot so children land after it, then patch it in.
        let node_idx = self.arena.len();
        self.arena.push(Node::Leaf {
            class: 0,
            impurity,
            n_samples,
        });

        let left = self.grow(&split.left_indices, depth + 1);
        let right = self.grow(&split.right_indices, depth + 1);

        self.arena[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            impurity,
            n_samples,
            gain: split.gain,
        };
        NodeIndex::new(node_idx)
    }

    fn push_leaf(
        &mut self,
        counts: &[usize],
        impurity: Impurity,
        n_samples: usize,
    ) -> NodeIndex {
        let idx = self.arena.len();
        self.arena.push(Node::Leaf {
            class: argmax_first(counts),
            impurity,
            n_samples,
        });
        NodeIndex::new(idx)
    }
}

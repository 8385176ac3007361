use rand::Rng;

use crate::node::{FeatureIndex, Impurity};

/// Relative margin, scaled by the parent impurity, that a candidate's gain
/// must clear to count as an improvement.
const GAIN_RELATIVE_TOLERANCE: f64 = 1e-12;

/// Criterion for measuring the impurity of a sample subset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SplitCriterion {
    /// Shannon entropy in bits: -Σ(p_i · log2(p_i))
    #[default]
    Entropy,
    /// Gini impurity: 1 - Σ(p_i²)
    Gini,
}

impl SplitCriterion {
    /// Compute the impurity of a subset from its class counts.
    ///
    /// Empty subsets have zero impurity. Classes with a zero count contribute
    /// nothing (`0 · log 0` is taken as 0).
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let value = match self {
            // Adding 0.0 turns the -0.0 of a pure node into +0.0.
            SplitCriterion::Entropy => {
                -class_counts
                    .iter()
                    .filter(|&&c| c > 0)
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p.log2()
                    })
                    .sum::<f64>()
                    + 0.0
            }
            SplitCriterion::Gini => {
                let sum_sq: f64 = class_counts
                    .iter()
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p
                    })
                    .sum();
                1.0 - sum_sq
            }
        };
        Impurity::new(value)
    }

    /// Information gain of partitioning a parent into two children.
    ///
    /// Parent impurity minus the sample-weighted mean of child impurities.
    #[must_use]
    pub fn gain(&self, parent: &[usize], left: &[usize], right: &[usize]) -> f64 {
        let n_left: usize = left.iter().sum();
        let n_right: usize = right.iter().sum();
        let n = (n_left + n_right) as f64;
        if n == 0.0 {
            return 0.0;
        }
        let parent_impurity = self.impurity(parent, n_left + n_right).value();
        let weighted = (n_left as f64 / n) * self.impurity(left, n_left).value()
            + (n_right as f64 / n) * self.impurity(right, n_right).value();
        parent_impurity - weighted
    }
}

/// The winning split for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    pub(crate) feature: FeatureIndex,
    /// One of the values observed at the node; `<=` goes left.
    pub(crate) threshold: f64,
    pub(crate) gain: f64,
    pub(crate) left_indices: Vec<usize>,
    pub(crate) right_indices: Vec<usize>,
}

/// Draw `n_feats` distinct feature indices from `0..n_features`.
///
/// Partial Fisher-Yates: only the first `n_feats` positions are shuffled,
/// and they are returned in the order they were drawn.
pub(crate) fn sample_features(n_features: usize, n_feats: usize, rng: &mut impl Rng) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_features).collect();
    let take = n_feats.min(n_features);
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        order.swap(i, j);
    }
    order.truncate(take);
    order
}

/// Find the split with the highest information gain.
///
/// Draws `n_feats` candidate features, then for each one considers every
/// distinct value observed among `sample_indices` as a threshold, scanning
/// thresholds in ascending order with incremental class counts.
///
/// A candidate replaces the current best only when its gain exceeds it by
/// more than `parent_impurity * 1e-12`. Gains that close are rounding noise
/// of the same partition quality, so they count as ties and the earlier
/// candidate (drawn feature order, then ascending threshold) is kept. For
/// the same reason a gain no larger than that margin is not positive.
///
/// Returns `None` when no candidate has positive gain.
///
/// `features` is column-major: `features[feature_idx][sample_idx]`, and
/// `classes[sample_idx]` is the encoded label.
#[allow(clippy::too_many_arguments)]
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    classes: &[usize],
    sample_indices: &[usize],
    parent_counts: &[usize],
    criterion: SplitCriterion,
    n_feats: usize,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    let n_samples = sample_indices.len();
    if n_samples < 2 || features.is_empty() {
        return None;
    }

    let tolerance =
        criterion.impurity(parent_counts, n_samples).value() * GAIN_RELATIVE_TOLERANCE;

    let mut best_gain = 0.0;
    let mut best: Option<(FeatureIndex, f64)> = None;

    for feat_idx in sample_features(features.len(), n_feats, rng) {
        let column = &features[feat_idx];

        let mut sorted: Vec<(f64, usize)> = sample_indices
            .iter()
            .map(|&si| (column[si], classes[si]))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Left grows from empty, right shrinks from the full node.
        let mut left_counts = vec![0usize; parent_counts.len()];
        let mut right_counts = parent_counts.to_vec();

        for i in 0..(n_samples - 1) {
            let (value, class) = sorted[i];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            // Only the last occurrence of a value closes a "<= value" group.
            if value == sorted[i + 1].0 {
                continue;
            }

            let gain = criterion.gain(parent_counts, &left_counts, &right_counts);
            if gain > best_gain + tolerance {
                best_gain = gain;
                best = Some((FeatureIndex::new(feat_idx), value));
            }
        }
    }

    let (feature, threshold) = best?;

    let column = &features[feature.index()];
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
        .iter()
        .partition(|&&si| column[si] <= threshold);

    Some(SplitResult {
        feature,
        threshold,
        gain: best_gain,
        left_indices,
        right_indices,
    })
}

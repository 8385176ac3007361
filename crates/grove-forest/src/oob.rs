//! Out-of-bag (OOB) evaluation for the random forest.

use crate::error::ForestError;
use crate::label::Label;
use crate::tree::DecisionTree;
use crate::vote::majority_vote;

/// Out-of-bag evaluation result.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OobScore {
    /// Fraction of OOB-evaluated samples whose vote matched their label.
    pub accuracy: f64,
    /// Number of samples left out by at least one tree.
    pub n_oob_samples: usize,
}

/// Rows of `0..n_samples` that never appear in `bootstrap`.
pub(crate) fn out_of_bag_indices(n_samples: usize, bootstrap: &[usize]) -> Vec<usize> {
    let mut in_bag = vec![false; n_samples];
    for &idx in bootstrap {
        in_bag[idx] = true;
    }
    (0..n_samples).filter(|&i| !in_bag[i]).collect()
}

/// Score every training sample using only the trees that did not see it.
///
/// Votes are collected in tree order, so ties resolve exactly as they do in
/// [`RandomForest::predict`](crate::RandomForest::predict). Samples that
/// every tree drew are skipped.
pub(crate) fn compute_oob<L: Label>(
    trees: &[DecisionTree<L>],
    features: &[Vec<f64>],
    labels: &[L],
    bootstrap_indices: &[Vec<usize>],
) -> Result<OobScore, ForestError> {
    let n_samples = features.len();
    let mut votes: Vec<Vec<&L>> = vec![Vec::new(); n_samples];

    for (tree, bootstrap) in trees.iter().zip(bootstrap_indices) {
        for sample_idx in out_of_bag_indices(n_samples, bootstrap) {
            votes[sample_idx].push(tree.predict_row(&features[sample_idx])?);
        }
    }

    let mut n_oob_samples = 0usize;
    let mut correct = 0usize;
    for (sample_votes, label) in votes.iter().zip(labels) {
        let Some(predicted) = majority_vote(sample_votes.iter().copied()) else {
            continue;
        };
        n_oob_samples += 1;
        if &predicted == label {
            correct += 1;
        }
    }

    if n_oob_samples == 0 {
        return Err(ForestError::OobEvaluationFailed {
            reason: "no sample has any OOB tree".to_string(),
        });
    }

    Ok(OobScore {
        accuracy: correct as f64 / n_oob_samples as f64,
        n_oob_samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeParams;

    #[test]
    fn out_of_bag_is_complement() {
        assert_eq!(out_of_bag_indices(5, &[0, 0, 3, 3, 1]), vec![2, 4]);
        assert!(out_of_bag_indices(3, &[2, 1, 0]).is_empty());
    }

    #[test]
    fn fails_when_every_tree_saw_every_sample() {
        let features = vec![vec![0.0], vec![1.0]];
        let labels = vec![0u8, 1];
        let mut tree = DecisionTree::new(TreeParams::new());
        tree.fit(&features, &labels).unwrap();

        let err = compute_oob(&[tree], &features, &labels, &[vec![0, 1]]).unwrap_err();
        assert!(matches!(err, ForestError::OobEvaluationFailed { .. }));
    }

    #[test]
    fn scores_only_left_out_samples() {
        let features = vec![vec![0.0], vec![1.0], vec![2.0]];
        let labels = vec![0u8, 1, 1];
        let mut tree = DecisionTree::new(TreeParams::new());
        tree.fit(&features[..2], &labels[..2]).unwrap();

        // Sample 2 was left out and is predicted correctly.
        let score = compute_oob(&[tree], &features, &labels, &[vec![0, 1, 1]]).unwrap();
        assert_eq!(score.n_oob_samples, 1);
        assert_eq!(score.accuracy, 1.0);
    }
}

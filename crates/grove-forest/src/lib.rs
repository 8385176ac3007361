//! Random forest classification: train, vote, persist.
//!
//! Decision trees are grown greedily on a bootstrap sample each, testing a
//! random subset of features at every node and scoring thresholds by
//! information gain (entropy by default, Gini optionally). The forest
//! fits its trees in parallel via rayon and predicts by plurality vote.
//!
//! ```no_run
//! use grove_forest::{ForestParams, RandomForest};
//!
//! # fn main() -> Result<(), grove_forest::ForestError> {
//! let features = vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0], vec![4.0], vec![5.0]];
//! let labels = vec![0, 0, 0, 1, 1, 1];
//!
//! let mut forest = RandomForest::new(ForestParams::new(10)?.with_max_depth(5));
//! forest.fit(&features, &labels)?;
//! assert_eq!(forest.predict(&[vec![0.5], vec![4.5]])?, vec![0, 1]);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod forest;
mod label;
mod metrics;
mod node;
mod oob;
mod predict;
mod serialize;
mod split;
mod tree;
mod vote;

pub use config::{ForestParams, OobMode, TreeParams};
pub use error::ForestError;
pub use forest::RandomForest;
pub use label::{Label, unique_labels};
pub use metrics::accuracy;
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use oob::OobScore;
pub use split::SplitCriterion;
pub use tree::DecisionTree;
pub use vote::majority_vote;

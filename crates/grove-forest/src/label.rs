use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// A class label usable by trees and forests.
///
/// Blanket-implemented for every type that can be compared, hashed, cloned
/// and shared across rayon workers, so `u8`, `usize`, `&str` and `String`
/// all work without ceremony.
pub trait Label: Clone + Eq + Hash + Debug + Send + Sync {}

impl<T> Label for T where T: Clone + Eq + Hash + Debug + Send + Sync {}

/// Map labels onto dense class indices in first-seen order.
///
/// Returns the class table (`classes[i]` is the label of class `i`) and the
/// encoded label vector.
pub(crate) fn encode_labels<L: Label>(labels: &[L]) -> (Vec<L>, Vec<usize>) {
    let mut index: HashMap<&L, usize> = HashMap::new();
    let mut classes = Vec::new();
    let encoded = labels
        .iter()
        .map(|label| {
            *index.entry(label).or_insert_with(|| {
                classes.push(label.clone());
                classes.len() - 1
            })
        })
        .collect();
    (classes, encoded)
}

/// Distinct labels in first-seen order.
///
/// The same ordering a fitted tree or forest uses for its class table.
pub fn unique_labels<L: Label>(labels: &[L]) -> Vec<L> {
    encode_labels(labels).0
}

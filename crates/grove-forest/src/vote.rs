//! Plurality voting with deterministic tie-breaking.

use std::collections::HashMap;

use crate::label::Label;

/// Return the most frequent label in `votes`.
///
/// Ties go to the label whose first vote came earliest, so the result
/// depends only on the order of `votes`, never on hashing. Returns `None`
/// when `votes` is empty.
pub fn majority_vote<'a, L, I>(votes: I) -> Option<L>
where
    L: Label + 'a,
    I: IntoIterator<Item = &'a L>,
{
    let mut position: HashMap<&L, usize> = HashMap::new();
    let mut tally: Vec<(&L, usize)> = Vec::new();
    for label in votes {
        let slot = *position.entry(label).or_insert_with(|| {
            tally.push((label, 0));
            tally.len() - 1
        });
        tally[slot].1 += 1;
    }

    let mut best: Option<(&L, usize)> = None;
    for &(label, count) in &tally {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((label, count));
        }
    }
    best.map(|(label, _)| label.clone())
}

/// Index of the largest count; the lowest index wins ties.
///
/// Returns 0 for an empty slice.
pub(crate) fn argmax_first(counts: &[usize]) -> usize {
    let mut best = 0;
    for (idx, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = idx;
        }
    }
    best
}

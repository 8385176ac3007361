//! Classification scoring.

use crate::error::ForestError;

/// Fraction of positions where `predicted` equals `truth`.
///
/// # Errors
///
/// Returns [`ForestError::ScoreLengthMismatch`] when the slices differ in
/// length or are empty.
pub fn accuracy<L: PartialEq>(truth: &[L], predicted: &[L]) -> Result<f64, ForestError> {
    if truth.is_empty() || truth.len() != predicted.len() {
        return Err(ForestError::ScoreLengthMismatch {
            n_true: truth.len(),
            n_predicted: predicted.len(),
        });
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / truth.len() as f64)
}

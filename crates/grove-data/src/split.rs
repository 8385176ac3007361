//! Seeded train/test splitting.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::DataError;
use crate::domain::Dataset;

/// Shuffle the rows with a seeded `ChaCha8Rng` and cut off
/// `ceil(n_samples * test_fraction)` of them as the test part.
///
/// Both parts keep the original relative row order.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DataError::InvalidTestFraction`] | `test_fraction` not in (0, 1) |
/// | [`DataError::SplitTooSmall`] | train or test part would be empty |
#[instrument(skip(dataset), fields(n_samples = dataset.n_samples()))]
pub fn train_test_split(
    dataset: &Dataset,
    test_fraction: f64,
    seed: u64,
) -> Result<(Dataset, Dataset), DataError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DataError::InvalidTestFraction { test_fraction });
    }

    let n_samples = dataset.n_samples();
    let n_test = (n_samples as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(DataError::SplitTooSmall { n_samples, n_test });
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

    let (test_part, train_part) = indices.split_at_mut(n_test);
    test_part.sort_unstable();
    train_part.sort_unstable();

    let train = dataset.select(train_part)?;
    let test = dataset.select(test_part)?;
    debug!(n_train = train.n_samples(), n_test, "dataset split");
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize) -> Dataset {
        Dataset::new(
            vec!["x".into()],
            (0..n).map(|i| vec![i as f64]).collect(),
            Some((0..n).map(|i| format!("c{}", i % 2)).collect()),
        )
    }

    #[test]
    fn sizes_follow_ceiling() {
        let (train, test) = train_test_split(&dataset(10), 0.25, 42).unwrap();
        assert_eq!(test.n_samples(), 3);
        assert_eq!(train.n_samples(), 7);
    }

    #[test]
    fn parts_partition_the_rows() {
        let (train, test) = train_test_split(&dataset(20), 0.3, 7).unwrap();
        let mut seen: Vec<f64> = train
            .features()
            .iter()
            .chain(test.features())
            .map(|row| row[0])
            .collect();
        seen.sort_by(f64::total_cmp);
        let expected: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn labels_follow_their_rows() {
        let (train, _) = train_test_split(&dataset(12), 0.5, 1).unwrap();
        for (row, label) in train.features().iter().zip(train.labels().unwrap()) {
            assert_eq!(label, &format!("c{}", row[0] as usize % 2));
        }
    }

    #[test]
    fn same_seed_same_split() {
        let ds = dataset(30);
        let a = train_test_split(&ds, 0.2, 9).unwrap();
        let b = train_test_split(&ds, 0.2, 9).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_fraction_rejected() {
        for fraction in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let err = train_test_split(&dataset(10), fraction, 0).unwrap_err();
            assert!(matches!(err, DataError::InvalidTestFraction { .. }));
        }
    }

    #[test]
    fn too_few_rows_rejected() {
        let err = train_test_split(&dataset(1), 0.2, 0).unwrap_err();
        assert!(matches!(
            err,
            DataError::SplitTooSmall { n_samples: 1, n_test: 1 }
        ));
    }
}

//! Model serialization and deserialization via bincode.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use crate::error::ForestError;
use crate::forest::RandomForest;
use crate::label::Label;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for the serialized model.
///
/// Generic over the payload so saving can borrow the forest while loading
/// takes ownership.
#[derive(serde::Serialize, serde::Deserialize)]
struct ModelEnvelope<F> {
    format_version: u32,
    n_trees: usize,
    n_features: usize,
    forest: F,
}

impl<L> RandomForest<L>
where
    L: Label + Serialize + DeserializeOwned,
{
    /// Save the fitted model to a binary file.
    ///
    /// Bootstrap indices are not stored.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::NotFitted`] | the forest has no trees |
    /// | [`ForestError::SerializeModel`] | bincode encoding failed |
    /// | [`ForestError::WriteModel`] | file write failed |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ForestError> {
        let path = path.as_ref();
        let n_features = self.n_features.ok_or(ForestError::NotFitted)?;

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_trees: self.trees.len(),
            n_features,
            forest: self,
        };

        let bytes = bincode::serialize(&envelope)
            .map_err(|source| ForestError::SerializeModel { source })?;

        std::fs::write(path, &bytes).map_err(|source| ForestError::WriteModel {
            path: path.to_path_buf(),
            source,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_trees = self.trees.len(),
            "model saved"
        );
        Ok(())
    }

    /// Load a model from a binary file written by [`save`](RandomForest::save).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::ReadModel`] | file read failed |
    /// | [`ForestError::DeserializeModel`] | bincode decoding failed |
    /// | [`ForestError::IncompatibleModelVersion`] | format version mismatch |
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ForestError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|source| ForestError::ReadModel {
            path: path.to_path_buf(),
            source,
        })?;

        let envelope: ModelEnvelope<RandomForest<L>> =
            bincode::deserialize(&bytes).map_err(|source| ForestError::DeserializeModel {
                path: path.to_path_buf(),
                source,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(ForestError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        debug!(
            n_trees = envelope.n_trees,
            n_features = envelope.n_features,
            "model loaded"
        );
        Ok(envelope.forest)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::config::ForestParams;
    use crate::error::ForestError;
    use crate::forest::RandomForest;

    fn train_simple_model() -> RandomForest<String> {
        let features = vec![
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![3.0, 0.0],
            vec![10.0, 0.0],
            vec![11.0, 0.0],
            vec![12.0, 0.0],
        ];
        let labels: Vec<String> = ["low", "low", "low", "high", "high", "high"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut forest = RandomForest::new(ForestParams::new(5).unwrap().with_seed(42));
        forest.fit(&features, &labels).unwrap();
        forest
    }

    #[test]
    fn round_trip_identical_predictions() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("model.bin");

        let forest = train_simple_model();
        forest.save(&model_path).unwrap();
        let loaded: RandomForest<String> = RandomForest::load(&model_path).unwrap();

        let samples = vec![vec![1.5, 0.0], vec![11.0, 0.0], vec![5.0, 0.0]];
        assert_eq!(
            forest.predict(&samples).unwrap(),
            loaded.predict(&samples).unwrap()
        );
        assert_eq!(loaded.params(), forest.params());
        assert_eq!(loaded.n_features(), Some(2));
        assert!(loaded.bootstrap_indices().is_empty());
    }

    #[test]
    fn unfitted_model_not_saved() {
        let dir = TempDir::new().unwrap();
        let forest: RandomForest<String> = RandomForest::default();
        let err = forest.save(dir.path().join("empty.bin")).unwrap_err();
        assert!(matches!(err, ForestError::NotFitted));
    }

    #[test]
    fn load_nonexistent_file_error() {
        let dir = TempDir::new().unwrap();
        let err = RandomForest::<String>::load(dir.path().join("missing.bin")).unwrap_err();
        assert!(matches!(err, ForestError::ReadModel { .. }));
    }

    #[test]
    fn load_corrupt_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, b"not a model").unwrap();
        let err = RandomForest::<String>::load(&path).unwrap_err();
        assert!(matches!(err, ForestError::DeserializeModel { .. }));
    }

    #[test]
    fn version_mismatch_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.bin");
        let forest = train_simple_model();
        forest.save(&path).unwrap();

        // format_version is the first little-endian u32 in the envelope.
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[..4].copy_from_slice(&99u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let err = RandomForest::<String>::load(&path).unwrap_err();
        assert!(matches!(
            err,
            ForestError::IncompatibleModelVersion { expected: 1, found: 99, .. }
        ));
    }
}

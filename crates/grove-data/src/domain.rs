//! Domain types for grove-data.

use crate::DataError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, DataError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(DataError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tabular dataset of numeric feature rows with optional class labels.
///
/// Produced by [`DatasetReader`](crate::DatasetReader). When labels are
/// present, `labels[i]` belongs to `features[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    feature_names: Vec<String>,
    features: Vec<Vec<f64>>,
    labels: Option<Vec<String>>,
}

impl Dataset {
    pub(crate) fn new(
        feature_names: Vec<String>,
        features: Vec<Vec<f64>>,
        labels: Option<Vec<String>>,
    ) -> Self {
        debug_assert!(
            labels.as_ref().is_none_or(|l| l.len() == features.len()),
            "labels must be parallel to feature rows"
        );
        Self {
            feature_names,
            features,
            labels,
        }
    }

    /// Return the feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the feature matrix (row-major).
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Return the class labels, if the file carried a label column.
    #[must_use]
    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Build a new dataset from the given rows, in the given order.
    ///
    /// Indices may repeat.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::RowOutOfRange`] if any index is `>= n_samples()`.
    pub fn select(&self, indices: &[usize]) -> Result<Self, DataError> {
        let n_samples = self.n_samples();
        if let Some(&index) = indices.iter().find(|&&i| i >= n_samples) {
            return Err(DataError::RowOutOfRange { index, n_samples });
        }

        let features = indices.iter().map(|&i| self.features[i].clone()).collect();
        let labels = self
            .labels
            .as_ref()
            .map(|labels| indices.iter().map(|&i| labels[i].clone()).collect());
        Ok(Self::new(self.feature_names.clone(), features, labels))
    }
}

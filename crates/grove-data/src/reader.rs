//! Delimited-file dataset reader with full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::DataError;
use crate::domain::Dataset;

/// Reads a tabular dataset from a delimited text file.
///
/// Expected format:
/// - Header row required; it names every column
/// - `feature1,feature2,...,featureN,label` when labels are enabled (default)
/// - `feature1,feature2,...,featureN` when labels are disabled
/// - All rows must have the same number of columns as the header
///
/// Surrounding whitespace is trimmed from every cell.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`DataError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`DataError::CsvParse`] | Malformed record |
/// | [`DataError::NoFeatureColumns`] | Header has no feature column |
/// | [`DataError::EmptyDataset`] | Zero data rows after header |
/// | [`DataError::InconsistentRowLength`] | Row has different column count than header |
/// | [`DataError::NonFiniteValue`] | Feature cell is NaN, Inf, or unparseable |
/// | [`DataError::EmptyLabel`] | Label cell is blank |
#[derive(Debug, Clone)]
pub struct DatasetReader {
    path: PathBuf,
    delimiter: u8,
    has_labels: bool,
}

impl DatasetReader {
    /// Create a reader for a comma-separated file whose last column is the label.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            delimiter: b',',
            has_labels: true,
        }
    }

    /// Set the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set whether the last column holds class labels.
    #[must_use]
    pub fn with_labels(mut self, has_labels: bool) -> Self {
        self.has_labels = has_labels;
        self
    }

    /// Read and validate the file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display(), has_labels = self.has_labels))]
    pub fn read(&self) -> Result<Dataset, DataError> {
        let file = std::fs::File::open(&self.path).map_err(|e| DataError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets short or long rows through so the width check
        // below reports them instead of a bare CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        let expected_cols = header.len();
        let n_features = expected_cols.saturating_sub(usize::from(self.has_labels));
        debug!(expected_cols, n_features, "read header");

        if n_features == 0 {
            return Err(DataError::NoFeatureColumns {
                path: self.path.clone(),
                n_columns: expected_cols,
            });
        }
        let feature_names: Vec<String> = header.iter().take(n_features).map(String::from).collect();

        let mut features = Vec::new();
        let mut labels = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            if record.len() != expected_cols {
                return Err(DataError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let mut row = Vec::with_capacity(n_features);
            for (col_index, raw) in record.iter().take(n_features).enumerate() {
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| DataError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        col_index,
                        raw: raw.to_string(),
                    })?;
                row.push(value);
            }
            features.push(row);

            if self.has_labels {
                let label = record.get(n_features).unwrap_or_default();
                if label.is_empty() {
                    return Err(DataError::EmptyLabel {
                        path: self.path.clone(),
                        row_index,
                    });
                }
                labels.push(label.to_string());
            }
        }

        if features.is_empty() {
            return Err(DataError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_samples = features.len(),
            n_features,
            "dataset loaded"
        );

        let labels = self.has_labels.then_some(labels);
        Ok(Dataset::new(feature_names, features, labels))
    }

    fn csv_error(&self, source: csv::Error) -> DataError {
        DataError::CsvParse {
            path: self.path.clone(),
            offset: source.position().map_or(0, |p| p.byte()),
            source,
        }
    }
}

//! JSON artifact writer for training and prediction outputs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::DataError;
use crate::domain::ExperimentName;

/// Summary of one training run.
///
/// Plain primitives keep this crate independent of `grove-forest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    /// Rows used to fit the forest.
    pub n_train: usize,
    /// Rows held out for scoring.
    pub n_test: usize,
    /// Feature columns per row.
    pub n_features: usize,
    /// Trees in the forest.
    pub n_trees: usize,
    /// Split criterion name.
    pub criterion: String,
    /// Master seed used for splitting and fitting.
    pub seed: u64,
    /// Accuracy on the held-out rows.
    pub test_accuracy: f64,
    /// Out-of-bag accuracy, when computed.
    pub oob_accuracy: Option<f64>,
    /// Distinct training labels in first-seen order.
    pub classes: Vec<String>,
}

/// Writes training and prediction results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_train.json` and
/// `{experiment}_predict.json`.
#[derive(Debug)]
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, DataError> {
        fs::create_dir_all(output_dir).map_err(|e| DataError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write a training summary to `{experiment}_train.json`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EncodeArtifact`] or [`DataError::WriteFile`].
    #[instrument(skip_all)]
    pub fn write_training(&self, summary: &TrainingSummary) -> Result<PathBuf, DataError> {
        let path = self.artifact_path("train");
        let artifact = TrainArtifact {
            experiment: self.experiment.as_str(),
            summary,
        };
        write_json(&path, &artifact)?;
        info!(path = %path.display(), "training summary written");
        Ok(path)
    }

    /// Write one predicted label per input row to `{experiment}_predict.json`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::EncodeArtifact`] or [`DataError::WriteFile`].
    #[instrument(skip_all, fields(n_rows = predictions.len()))]
    pub fn write_predictions(&self, predictions: &[String]) -> Result<PathBuf, DataError> {
        let path = self.artifact_path("predict");

        let mut class_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for label in predictions {
            *class_counts.entry(label.as_str()).or_insert(0) += 1;
        }

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_rows: predictions.len(),
            class_counts,
            predictions: predictions
                .iter()
                .enumerate()
                .map(|(row, label)| PredictionEntry {
                    row,
                    label: label.as_str(),
                })
                .collect(),
        };
        write_json(&path, &artifact)?;
        info!(path = %path.display(), "predictions written");
        Ok(path)
    }

    fn artifact_path(&self, kind: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{kind}.json", self.experiment.as_str()))
    }
}

fn write_json(path: &Path, artifact: &impl Serialize) -> Result<(), DataError> {
    let json = serde_json::to_string_pretty(artifact).map_err(|e| DataError::EncodeArtifact {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, &json).map_err(|e| DataError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct TrainArtifact<'a> {
    experiment: &'a str,
    #[serde(flatten)]
    summary: &'a TrainingSummary,
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_rows: usize,
    class_counts: BTreeMap<&'a str, usize>,
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    row: usize,
    label: &'a str,
}

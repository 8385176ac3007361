//! End-to-end integration tests: CSV -> split -> fit -> JSON -> deserialize.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use grove_data::{
    DatasetReader, ExperimentName, ResultWriter, TrainingSummary, train_test_split,
};
use grove_forest::{ForestParams, OobMode, RandomForest, accuracy, unique_labels};
use tempfile::TempDir;

/// Write a 60-row, 2-feature, 3-class CSV separable on the first column.
fn write_fixture(dir: &Path) -> PathBuf {
    let mut csv = String::from("length,width,kind\n");
    for i in 0..60 {
        let (kind, base) = match i % 3 {
            0 => ("small", 1.0),
            1 => ("medium", 5.0),
            _ => ("large", 9.0),
        };
        let jitter = (i % 7) as f64 * 0.1;
        writeln!(csv, "{},{},{kind}", base + jitter, 2.0 + jitter).unwrap();
    }
    let path = dir.join("shapes.csv");
    fs::write(&path, csv).unwrap();
    path
}

#[test]
fn train_round_trip() {
    let dir = TempDir::new().unwrap();

    // 1. Read CSV
    let dataset = DatasetReader::new(&write_fixture(dir.path()))
        .read()
        .expect("fixture should parse");
    assert_eq!(dataset.n_samples(), 60);
    assert_eq!(dataset.feature_names(), &["length", "width"]);

    // 2. Split and fit
    let (train, test) = train_test_split(&dataset, 0.25, 42).unwrap();
    assert_eq!(test.n_samples(), 15);

    let params = ForestParams::new(25)
        .unwrap()
        .with_seed(42)
        .with_oob_mode(OobMode::Enabled);
    let mut forest = RandomForest::new(params);
    forest.fit(train.features(), train.labels().unwrap()).unwrap();

    let predictions = forest.predict(test.features()).unwrap();
    let test_accuracy = accuracy(test.labels().unwrap(), &predictions).unwrap();
    assert!(test_accuracy > 0.9, "test accuracy {test_accuracy}");

    // 3. Write JSON artifact
    let summary = TrainingSummary {
        n_train: train.n_samples(),
        n_test: test.n_samples(),
        n_features: train.n_features(),
        n_trees: forest.n_trees(),
        criterion: "entropy".into(),
        seed: 42,
        test_accuracy,
        oob_accuracy: forest.oob_score().map(|s| s.accuracy),
        classes: unique_labels(train.labels().unwrap()),
    };
    let out = dir.path().join("out");
    let writer = ResultWriter::new(&out, ExperimentName::new("shapes".into()).unwrap()).unwrap();
    writer.write_training(&summary).unwrap();

    // 4. Deserialize back and verify
    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("shapes_train.json")).unwrap()).unwrap();
    assert_eq!(content["experiment"], "shapes");
    assert_eq!(content["n_train"].as_u64().unwrap(), 45);
    assert_eq!(content["n_trees"].as_u64().unwrap(), 25);
    assert!(content["oob_accuracy"].as_f64().is_some());
    assert_eq!(content["classes"].as_array().unwrap().len(), 3);
    assert_eq!(content["classes"][0], train.labels().unwrap()[0].as_str());
    assert!((content["test_accuracy"].as_f64().unwrap() - test_accuracy).abs() < 1e-12);
}

#[test]
fn predict_round_trip_through_saved_model() {
    let dir = TempDir::new().unwrap();
    let dataset = DatasetReader::new(&write_fixture(dir.path())).read().unwrap();

    let mut forest = RandomForest::new(ForestParams::new(10).unwrap().with_seed(3));
    forest
        .fit(dataset.features(), dataset.labels().unwrap())
        .unwrap();
    let model_path = dir.path().join("shapes.bin");
    forest.save(&model_path).unwrap();

    // Unlabeled input uses a different delimiter.
    let unlabeled = dir.path().join("new.tsv");
    fs::write(&unlabeled, "length\twidth\n1.2\t2.2\n9.3\t2.0\n5.1\t2.5\n").unwrap();
    let rows = DatasetReader::new(&unlabeled)
        .with_delimiter(b'\t')
        .with_labels(false)
        .read()
        .unwrap();

    let loaded: RandomForest<String> = RandomForest::load(&model_path).unwrap();
    let predictions = loaded.predict(rows.features()).unwrap();
    assert_eq!(predictions, vec!["small", "large", "medium"]);

    let writer = ResultWriter::new(dir.path(), ExperimentName::new("batch".into()).unwrap()).unwrap();
    let path = writer.write_predictions(&predictions).unwrap();

    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(content["n_rows"].as_u64().unwrap(), 3);
    let entries = content["predictions"].as_array().unwrap();
    assert_eq!(entries[2]["label"], "medium");
}

#[test]
fn width_mismatch_between_model_and_input_is_reported() {
    let dir = TempDir::new().unwrap();
    let dataset = DatasetReader::new(&write_fixture(dir.path())).read().unwrap();
    let mut forest = RandomForest::new(ForestParams::new(3).unwrap());
    forest
        .fit(dataset.features(), dataset.labels().unwrap())
        .unwrap();

    let narrow = dir.path().join("narrow.csv");
    fs::write(&narrow, "length\n1.0\n").unwrap();
    let rows = DatasetReader::new(&narrow).with_labels(false).read().unwrap();
    assert!(forest.predict(rows.features()).is_err());
}

//! Dataset loading, splitting, and JSON artifacts for the grove pipeline.

mod domain;
mod error;
mod reader;
mod split;
mod writer;

pub use domain::{Dataset, ExperimentName};
pub use error::DataError;
pub use reader::DatasetReader;
pub use split::train_test_split;
pub use writer::{ResultWriter, TrainingSummary};

use std::path::PathBuf;
use thiserror::Error;

/// Raw input could not be turned into a feature row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureBuildError {
    #[error("unknown Status {0:?}: expected \"Active\" or \"Completed\"")]
    UnknownStatus(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

/// The model rejected or could not evaluate a feature row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("feature shape mismatch: model expects {expected} columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("model produced a non-finite output ({0})")]
    NonFinite(f64),
}

/// Loading the model artifact failed. Fatal at startup.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("can't read model artifact at {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("can't decode model artifact at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model artifact does not contain a 'model' entry and is not a model itself")]
    MissingModel,
}

/// Failure of the composed feature-build + predict call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CampaignError {
    #[error(transparent)]
    Features(#[from] FeatureBuildError),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

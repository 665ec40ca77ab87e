use crate::error::{ArtifactError, PredictionError};
use crate::features::FeatureRow;
use crate::model::{
    GradientBoostedTrees, LinearRegressor, Predictor, StandardScaler, TargetTransform,
};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Model objects the artifact file can carry, keyed by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear(LinearRegressor),
    GradientBoosted(GradientBoostedTrees),
}

impl ModelSpec {
    fn into_predictor(self) -> Box<dyn Predictor> {
        match self {
            ModelSpec::Linear(m) => Box::new(m),
            ModelSpec::GradientBoosted(m) => Box::new(m),
        }
    }
}

/// `{"model": ..., "scaler": ..., "model_columns": [...]}`
#[derive(Debug, Deserialize)]
struct WrappedArtifact {
    model: Option<ModelSpec>,
    #[serde(default)]
    scaler: Option<StandardScaler>,
    #[serde(default)]
    model_columns: Vec<String>,
    #[serde(default)]
    target_transform: TargetTransform,
}

/// A model object at the top level, optionally carrying its own column list.
#[derive(Debug, Deserialize)]
struct BareArtifact {
    #[serde(flatten)]
    model: ModelSpec,
    #[serde(default)]
    model_columns: Vec<String>,
    #[serde(default)]
    target_transform: TargetTransform,
}

/// The trained regression model plus everything needed to feed it.
///
/// Loaded once at startup and only read afterwards.
#[derive(Debug)]
pub struct ModelArtifact {
    predictor: Box<dyn Predictor>,
    scaler: Option<StandardScaler>,
    model_columns: Vec<String>,
    target_transform: TargetTransform,
}

impl ModelArtifact {
    pub fn new(predictor: impl Predictor + 'static) -> Self {
        Self {
            predictor: Box::new(predictor),
            scaler: None,
            model_columns: Vec::new(),
            target_transform: TargetTransform::default(),
        }
    }

    pub fn with_model_columns(mut self, model_columns: Vec<String>) -> Self {
        self.model_columns = model_columns;
        self
    }

    pub fn with_scaler(mut self, scaler: StandardScaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    pub fn with_target_transform(mut self, target_transform: TargetTransform) -> Self {
        self.target_transform = target_transform;
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ArtifactError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        let artifact = Self::from_json_str(&text, path)?;
        tracing::info!(
            path = %path.display(),
            model = artifact.predictor.kind(),
            columns = artifact.model_columns.len(),
            scaler = artifact.scaler.is_some(),
            target_transform = ?artifact.target_transform,
            "model artifact loaded"
        );
        Ok(artifact)
    }

    /// Resolve either artifact shape. `origin` only labels errors.
    pub fn from_json_str(text: &str, origin: &Path) -> Result<Self, ArtifactError> {
        let parse_err = |source| ArtifactError::Parse {
            path: origin.to_path_buf(),
            source,
        };

        let value: Value = serde_json::from_str(text).map_err(parse_err)?;
        let Some(obj) = value.as_object() else {
            return Err(ArtifactError::MissingModel);
        };

        if obj.contains_key("model") {
            let wrapped: WrappedArtifact = serde_json::from_value(value).map_err(parse_err)?;
            let model = wrapped.model.ok_or(ArtifactError::MissingModel)?;
            return Ok(Self {
                predictor: model.into_predictor(),
                scaler: wrapped.scaler,
                model_columns: wrapped.model_columns,
                target_transform: wrapped.target_transform,
            });
        }

        if obj.contains_key("type") {
            let bare: BareArtifact = serde_json::from_value(value).map_err(parse_err)?;
            return Ok(Self {
                predictor: bare.model.into_predictor(),
                scaler: None,
                model_columns: bare.model_columns,
                target_transform: bare.target_transform,
            });
        }

        Err(ArtifactError::MissingModel)
    }

    pub fn model_columns(&self) -> &[String] {
        &self.model_columns
    }

    pub fn target_transform(&self) -> TargetTransform {
        self.target_transform
    }

    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    pub fn model_kind(&self) -> &'static str {
        self.predictor.kind()
    }

    /// Run the model on one aligned row and map its output back to revenue.
    pub fn predict(&self, features: &FeatureRow) -> Result<f64, PredictionError> {
        let raw = match &self.scaler {
            Some(scaler) => self.predictor.predict(&scaler.transform(features)?)?,
            None => self.predictor.predict(features)?,
        };
        if !raw.is_finite() {
            return Err(PredictionError::NonFinite(raw));
        }

        let revenue = self.target_transform.invert(raw);
        tracing::debug!(raw, revenue, "model prediction");
        Ok(revenue)
    }
}

/// Default artifact location relative to the working directory.
pub fn default_artifact_path() -> PathBuf {
    PathBuf::from("roi_pipeline.json")
}

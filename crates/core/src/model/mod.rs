pub mod artifact;
pub mod linear;
pub mod scaler;
pub mod tree;

pub use artifact::ModelArtifact;
pub use linear::LinearRegressor;
pub use scaler::StandardScaler;
pub use tree::GradientBoostedTrees;

use crate::error::PredictionError;
use crate::features::FeatureRow;
use serde::{Deserialize, Serialize};

/// Anything that turns one aligned feature row into a raw model output.
pub trait Predictor: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> &'static str;

    fn predict(&self, row: &FeatureRow) -> Result<f64, PredictionError>;
}

/// Scale the model emits its target in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetTransform {
    /// Trained on `ln(1 + revenue)`.
    #[default]
    Log1p,
    /// Trained on revenue directly.
    Identity,
}

impl TargetTransform {
    /// Map a raw model output back to revenue.
    ///
    /// `expm1` of a large log-scale output overflows to infinity; the raw output is returned
    /// instead.
    pub fn invert(self, raw: f64) -> f64 {
        match self {
            TargetTransform::Identity => raw,
            TargetTransform::Log1p => {
                let revenue = raw.exp_m1();
                if revenue.is_finite() {
                    revenue
                } else {
                    tracing::warn!(
                        raw,
                        "expm1 of model output is not finite; returning raw output"
                    );
                    raw
                }
            }
        }
    }
}

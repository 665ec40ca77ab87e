use crate::error::PredictionError;
use crate::features::FeatureRow;
use crate::model::Predictor;
use serde::{Deserialize, Serialize};

/// Ordinary linear model over the aligned row, coefficients in column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    #[serde(default)]
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl Predictor for LinearRegressor {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn predict(&self, row: &FeatureRow) -> Result<f64, PredictionError> {
        if row.len() != self.coefficients.len() {
            return Err(PredictionError::ShapeMismatch {
                expected: self.coefficients.len(),
                actual: row.len(),
            });
        }

        let dot: f64 = self
            .coefficients
            .iter()
            .zip(row.values())
            .map(|(w, x)| w * x)
            .sum();
        Ok(self.intercept + dot)
    }
}

use crate::error::PredictionError;
use crate::features::FeatureRow;
use serde::{Deserialize, Serialize};

/// Per-column standardization fitted alongside the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn transform(&self, row: &FeatureRow) -> Result<FeatureRow, PredictionError> {
        if self.mean.len() != self.scale.len() {
            return Err(PredictionError::InvalidModel(format!(
                "scaler has {} means but {} scales",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if row.len() != self.mean.len() {
            return Err(PredictionError::ShapeMismatch {
                expected: self.mean.len(),
                actual: row.len(),
            });
        }

        let scaled = row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|((column, x), (mean, scale))| {
                // Constant columns were fitted with scale 0.
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (column.to_string(), (x - mean) / scale)
            })
            .collect();
        Ok(scaled)
    }
}

use crate::domain::campaign::RawCampaignInput;
use crate::domain::report::CampaignReport;
use crate::error::CampaignError;
use crate::features::{FeatureBuilder, FeatureRow};
use crate::model::ModelArtifact;
use std::sync::Arc;

/// Feature building followed by the model call, over one shared artifact.
#[derive(Debug, Clone)]
pub struct CampaignPredictor {
    artifact: Arc<ModelArtifact>,
    builder: FeatureBuilder,
}

impl CampaignPredictor {
    pub fn new(artifact: Arc<ModelArtifact>) -> Self {
        let builder = FeatureBuilder::for_model_columns(artifact.model_columns());
        Self { artifact, builder }
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn build_features(&self, input: &RawCampaignInput) -> Result<FeatureRow, CampaignError> {
        Ok(self.builder.build(input, self.artifact.model_columns())?)
    }

    pub fn predict_campaign_revenue(&self, input: &RawCampaignInput) -> Result<f64, CampaignError> {
        let features = self.build_features(input)?;
        let revenue = self.artifact.predict(&features)?;
        tracing::info!(
            status = %input.status,
            channel = %input.channel,
            width = features.len(),
            revenue,
            "campaign revenue predicted"
        );
        Ok(revenue)
    }

    /// Predict and wrap the result with ROI into a summary row.
    pub fn report(&self, input: RawCampaignInput) -> Result<CampaignReport, CampaignError> {
        let revenue = self.predict_campaign_revenue(&input)?;
        Ok(CampaignReport::new(input, revenue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::campaign::fixtures;
    use crate::error::{FeatureBuildError, PredictionError};
    use crate::model::{LinearRegressor, Predictor, TargetTransform};
    use std::sync::Mutex;

    /// Returns a fixed output and remembers the row it was called with.
    #[derive(Debug, Default)]
    struct FakePredictor {
        output: f64,
        seen: Mutex<Option<FeatureRow>>,
    }

    impl Predictor for FakePredictor {
        fn kind(&self) -> &'static str {
            "fake"
        }

        fn predict(&self, row: &FeatureRow) -> Result<f64, PredictionError> {
            *self.seen.lock().unwrap() = Some(row.clone());
            Ok(self.output)
        }
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn log_scale_output_is_inverted() {
        let artifact = ModelArtifact::new(FakePredictor {
            output: 5.0,
            ..Default::default()
        });
        let predictor = CampaignPredictor::new(Arc::new(artifact));

        let revenue = predictor
            .predict_campaign_revenue(&fixtures::completed_campaign())
            .unwrap();
        assert!((revenue - 147.41).abs() < 0.01);
    }

    #[test]
    fn linear_scale_output_is_returned_as_is() {
        let artifact = ModelArtifact::new(FakePredictor {
            output: 1234.5,
            ..Default::default()
        })
        .with_target_transform(TargetTransform::Identity);
        let predictor = CampaignPredictor::new(Arc::new(artifact));

        let revenue = predictor
            .predict_campaign_revenue(&fixtures::fresh_campaign())
            .unwrap();
        assert_eq!(revenue, 1234.5);
    }

    #[test]
    fn model_sees_exactly_the_declared_columns() {
        let fake = Arc::new(FakePredictor::default());
        let artifact = ModelArtifact::new(SharedFake(fake.clone()))
            .with_model_columns(columns(&["CTR", "Channel_Google", "Status", "Geo_SEA"]));
        let predictor = CampaignPredictor::new(Arc::new(artifact));

        predictor
            .predict_campaign_revenue(&fixtures::completed_campaign())
            .unwrap();

        let seen = fake.seen.lock().unwrap().clone().unwrap();
        assert_eq!(
            seen.columns(),
            &columns(&["CTR", "Channel_Google", "Status", "Geo_SEA"])[..]
        );
        assert_eq!(seen.values(), &[0.05, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn feature_errors_stop_before_the_model() {
        let fake = Arc::new(FakePredictor::default());
        let predictor = CampaignPredictor::new(Arc::new(ModelArtifact::new(SharedFake(
            fake.clone(),
        ))));

        let mut input = fixtures::fresh_campaign();
        input.status = "Draft".to_string();
        let err = predictor.predict_campaign_revenue(&input).unwrap_err();

        assert_eq!(
            err,
            CampaignError::Features(FeatureBuildError::UnknownStatus("Draft".to_string()))
        );
        assert!(fake.seen.lock().unwrap().is_none());
    }

    #[test]
    fn model_errors_propagate() {
        let artifact = ModelArtifact::new(LinearRegressor {
            intercept: 0.0,
            coefficients: vec![1.0; 3],
        })
        .with_model_columns(columns(&["CTR"]));
        let predictor = CampaignPredictor::new(Arc::new(artifact));

        let err = predictor
            .predict_campaign_revenue(&fixtures::fresh_campaign())
            .unwrap_err();
        assert!(matches!(
            err,
            CampaignError::Prediction(PredictionError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn report_carries_roi() {
        let artifact = ModelArtifact::new(FakePredictor {
            output: 7500.0,
            ..Default::default()
        })
        .with_target_transform(TargetTransform::Identity);
        let predictor = CampaignPredictor::new(Arc::new(artifact));

        let report = predictor.report(fixtures::fresh_campaign()).unwrap();
        assert_eq!(report.predicted_revenue, 7500.0);
        assert_eq!(report.roi_percent, 50.0);
    }

    #[test]
    fn demo_artifact_matches_encoded_layout() {
        let artifact = ModelArtifact::from_json_str(
            include_str!("../../../demos/roi_pipeline.json"),
            std::path::Path::new("demos/roi_pipeline.json"),
        )
        .unwrap();
        let encoded = FeatureBuilder::default()
            .encode(&fixtures::fresh_campaign())
            .unwrap();
        assert_eq!(artifact.model_columns(), encoded.columns());

        let predictor = CampaignPredictor::new(Arc::new(artifact));
        let campaigns: Vec<RawCampaignInput> =
            serde_json::from_str(include_str!("../../../demos/campaigns.json")).unwrap();
        for input in &campaigns {
            let revenue = predictor.predict_campaign_revenue(input).unwrap();
            assert!(revenue.is_finite() && revenue > 0.0, "{revenue}");
        }
    }

    #[derive(Debug)]
    struct SharedFake(Arc<FakePredictor>);

    impl Predictor for SharedFake {
        fn kind(&self) -> &'static str {
            self.0.kind()
        }

        fn predict(&self, row: &FeatureRow) -> Result<f64, PredictionError> {
            self.0.predict(row)
        }
    }
}

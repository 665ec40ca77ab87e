use crate::domain::campaign::{FieldValue, RawCampaignInput};
use crate::error::FeatureBuildError;
use crate::features::encoding::OneHotEncoder;
use crate::features::row::FeatureRow;

/// Click/cost ratios derived from the running counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedRatios {
    pub ctr: f64,
    pub cpc: f64,
    pub cpa: f64,
}

impl DerivedRatios {
    /// A ratio whose denominator is not positive is 0, never a division fault.
    pub fn compute(spend: f64, impressions: f64, clicks: f64, conversions: f64) -> Self {
        Self {
            ctr: guarded_ratio(clicks, impressions),
            cpc: guarded_ratio(spend, clicks),
            cpa: guarded_ratio(spend, conversions),
        }
    }
}

fn guarded_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Status -> 1 for "Completed", 0 for "Active". Anything else is rejected.
pub fn status_flag(status: &str) -> Result<f64, FeatureBuildError> {
    match status {
        "Completed" => Ok(1.0),
        "Active" => Ok(0.0),
        other => Err(FeatureBuildError::UnknownStatus(other.to_string())),
    }
}

fn validate_numeric(input: &RawCampaignInput) -> Result<(), FeatureBuildError> {
    for (field, value) in input.fields() {
        let FieldValue::Number(n) = value else {
            continue;
        };
        if !n.is_finite() {
            return Err(FeatureBuildError::InvalidField {
                field,
                reason: format!("must be a finite number (got {n})"),
            });
        }
        if n < 0.0 {
            return Err(FeatureBuildError::InvalidField {
                field,
                reason: format!("must be non-negative (got {n})"),
            });
        }
    }
    Ok(())
}

/// Maps raw form input onto the feature layout the regression model was trained on.
#[derive(Debug, Clone, Default)]
pub struct FeatureBuilder {
    encoder: OneHotEncoder,
}

impl FeatureBuilder {
    pub fn new(encoder: OneHotEncoder) -> Self {
        Self { encoder }
    }

    /// Builder whose vocabulary also covers levels the model declares.
    pub fn for_model_columns(model_columns: &[String]) -> Self {
        let mut encoder = OneHotEncoder::campaign_form();
        encoder.extend_from_model_columns(model_columns);
        Self { encoder }
    }

    /// Encoded row before alignment.
    ///
    /// Raw spend, CPC and CPA are replaced by their `ln(1 + x)` forms; the model never saw the
    /// untransformed values.
    pub fn encode(&self, input: &RawCampaignInput) -> Result<FeatureRow, FeatureBuildError> {
        validate_numeric(input)?;
        let status = status_flag(&input.status)?;

        let ratios = DerivedRatios::compute(
            input.spend_till_date,
            input.impressions_till_date,
            input.clicks_till_date,
            input.conversions_till_date,
        );

        let mut row = FeatureRow::new();
        row.push("Status", status);
        row.push("Budget", input.budget);
        row.push("Impressions_Till_Date", input.impressions_till_date);
        row.push("Clicks_Till_Date", input.clicks_till_date);
        row.push("Conversions_Till_Date", input.conversions_till_date);
        row.push("Campaign_Duration", input.campaign_duration);
        row.push("Duration_Till_Date", input.duration_till_date);
        row.push("CTR", ratios.ctr);
        row.push("Spend_Till_Date_log", input.spend_till_date.ln_1p());
        row.push("CPC_log", ratios.cpc.ln_1p());
        row.push("CPA_log", ratios.cpa.ln_1p());

        self.encoder.encode_into(input, &mut row);
        Ok(row)
    }

    pub fn build(
        &self,
        input: &RawCampaignInput,
        model_columns: &[String],
    ) -> Result<FeatureRow, FeatureBuildError> {
        Ok(self.encode(input)?.align(model_columns))
    }
}

/// One-shot build with the form vocabulary.
pub fn build_features(
    input: &RawCampaignInput,
    model_columns: &[String],
) -> Result<FeatureRow, FeatureBuildError> {
    FeatureBuilder::for_model_columns(model_columns).build(input, model_columns)
}

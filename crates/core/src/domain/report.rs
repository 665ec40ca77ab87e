use crate::domain::campaign::RawCampaignInput;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summary row: the submitted input plus what the model made of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignReport {
    #[serde(flatten)]
    pub input: RawCampaignInput,
    #[serde(rename = "Predicted_Revenue")]
    pub predicted_revenue: f64,
    #[serde(rename = "Predicted_ROI_%")]
    pub roi_percent: f64,
    #[serde(rename = "AI_Suggestions", skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl CampaignReport {
    pub fn new(input: RawCampaignInput, predicted_revenue: f64) -> Self {
        let roi_percent = roi_percent(predicted_revenue, input.budget);
        Self {
            input,
            predicted_revenue,
            roi_percent,
            narrative: None,
            generated_at: Utc::now(),
        }
    }

    pub fn with_narrative(mut self, narrative: impl Into<String>) -> Self {
        self.narrative = Some(narrative.into());
        self
    }

    pub fn ctr_percent(&self) -> f64 {
        ctr_percent(
            self.input.clicks_till_date,
            self.input.impressions_till_date,
        )
    }
}

/// Return on the full budget, in percent. Zero when there is no budget.
pub fn roi_percent(predicted_revenue: f64, budget: f64) -> f64 {
    if budget > 0.0 {
        (predicted_revenue - budget) / budget * 100.0
    } else {
        0.0
    }
}

pub fn ctr_percent(clicks: f64, impressions: f64) -> f64 {
    if impressions > 0.0 {
        clicks / impressions * 100.0
    } else {
        0.0
    }
}

/// `1234567.891` -> `"1,234,567.89"`.
pub fn format_currency(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

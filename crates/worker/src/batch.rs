use anyhow::Context;
use roi_core::llm::{NarrativeClient, NarrativeInput};
use roi_core::{CampaignPredictor, CampaignReport, RawCampaignInput};
use std::path::Path;

/// Accepts either a JSON array of campaigns or a single campaign object.
pub fn parse_campaigns(text: &str) -> anyhow::Result<Vec<RawCampaignInput>> {
    let value: serde_json::Value =
        serde_json::from_str(text).context("campaign input is not valid JSON")?;

    let campaigns = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                serde_json::from_value::<RawCampaignInput>(item)
                    .with_context(|| format!("campaign #{idx} is malformed"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?,
        other => vec![serde_json::from_value::<RawCampaignInput>(other)
            .context("campaign object is malformed")?],
    };

    anyhow::ensure!(!campaigns.is_empty(), "campaign input is empty");
    Ok(campaigns)
}

pub fn read_campaigns(path: &Path) -> anyhow::Result<Vec<RawCampaignInput>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read campaigns from {}", path.display()))?;
    parse_campaigns(&text)
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub reports: Vec<CampaignReport>,
    pub failed: usize,
}

/// Score every campaign. A bad campaign is logged and skipped; the rest still run.
pub fn score_all(predictor: &CampaignPredictor, campaigns: Vec<RawCampaignInput>) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for (idx, input) in campaigns.into_iter().enumerate() {
        match predictor.report(input) {
            Ok(report) => {
                tracing::info!(
                    idx,
                    revenue = report.predicted_revenue,
                    roi_percent = report.roi_percent,
                    "campaign scored"
                );
                outcome.reports.push(report);
            }
            Err(err) => {
                let err = anyhow::Error::new(err);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(idx, error = %err, "campaign scoring failed");
                outcome.failed += 1;
            }
        }
    }
    outcome
}

pub async fn attach_narratives(client: &dyn NarrativeClient, reports: &mut [CampaignReport]) {
    for report in reports.iter_mut() {
        let input = NarrativeInput::new(report.input.clone(), report.predicted_revenue);
        let text = roi_core::llm::narrative_or_placeholder(client, &input).await;
        report.narrative = Some(text);
    }
}

pub mod anthropic;
pub mod error;
pub mod gemini;

use crate::config::Settings;
use crate::domain::campaign::RawCampaignInput;
use crate::domain::report::format_currency;
use std::sync::Arc;

/// What the language model is told about one campaign.
#[derive(Debug, Clone)]
pub struct NarrativeInput {
    pub campaign: RawCampaignInput,
    pub predicted_revenue: f64,
}

impl NarrativeInput {
    pub fn new(campaign: RawCampaignInput, predicted_revenue: f64) -> Self {
        Self {
            campaign,
            predicted_revenue,
        }
    }

    pub fn prompt(&self) -> String {
        let fields = self.campaign.fields();
        let width = fields.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

        let mut data = String::new();
        for (name, value) in fields {
            data.push_str(&format!("{name:<width$}    {value}\n"));
        }

        format!(
            "Campaign Data:\n{data}\
Predicted Final Revenue: ${}\n\
Provide:\n\
- Executive Summary\n\
- 3 Actionable Suggestions\n\
- Issues & Improvements Table\n",
            format_currency(self.predicted_revenue)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
        }
    }
}

#[async_trait::async_trait]
pub trait NarrativeClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate_narrative(&self, input: &NarrativeInput) -> anyhow::Result<String>;
}

pub const PLACEHOLDER_PREFIX: &str = "AI suggestion unavailable";

/// Suggestions are optional decoration: any failure becomes a placeholder string.
pub async fn narrative_or_placeholder(
    client: &dyn NarrativeClient,
    input: &NarrativeInput,
) -> String {
    match client.generate_narrative(input).await {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(
                provider = client.provider().as_str(),
                error = %err,
                "narrative generation failed; using placeholder"
            );
            format!("{PLACEHOLDER_PREFIX}: {err}")
        }
    }
}

/// Build the configured narrative client, if any.
pub fn client_from_settings(
    settings: &Settings,
) -> anyhow::Result<Option<Arc<dyn NarrativeClient>>> {
    let client: Arc<dyn NarrativeClient> = match settings.narrative_provider()? {
        None => return Ok(None),
        Some(Provider::Gemini) => Arc::new(gemini::GeminiClient::from_settings(settings)?),
        Some(Provider::Anthropic) => Arc::new(anthropic::AnthropicClient::from_settings(settings)?),
    };
    Ok(Some(client))
}

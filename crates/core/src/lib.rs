pub mod domain;
pub mod error;
pub mod export;
pub mod features;
pub mod llm;
pub mod model;
pub mod predict;

pub use domain::campaign::RawCampaignInput;
pub use domain::report::CampaignReport;
pub use error::{ArtifactError, CampaignError, FeatureBuildError, PredictionError};
pub use features::{build_features, FeatureRow};
pub use model::ModelArtifact;
pub use predict::CampaignPredictor;

pub mod config {
    use crate::llm::Provider;
    use anyhow::Context;
    use std::path::PathBuf;

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub model_path: Option<String>,
        pub narrative_provider: Option<String>,
        pub gemini_api_key: Option<String>,
        pub anthropic_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                model_path: std::env::var("MODEL_PATH").ok(),
                narrative_provider: std::env::var("NARRATIVE_PROVIDER").ok(),
                gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
                anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn model_path(&self) -> PathBuf {
            self.model_path
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(crate::model::artifact::default_artifact_path)
        }

        pub fn require_anthropic_api_key(&self) -> anyhow::Result<&str> {
            self.anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required")
        }

        pub fn require_gemini_api_key(&self) -> anyhow::Result<&str> {
            self.gemini_api_key
                .as_deref()
                .context("GEMINI_API_KEY is required")
        }

        /// Explicit `NARRATIVE_PROVIDER` wins; otherwise whichever API key is present.
        pub fn narrative_provider(&self) -> anyhow::Result<Option<Provider>> {
            if let Some(raw) = self.narrative_provider.as_deref() {
                return match raw.trim().to_ascii_lowercase().as_str() {
                    "gemini" => Ok(Some(Provider::Gemini)),
                    "anthropic" => Ok(Some(Provider::Anthropic)),
                    "none" | "" => Ok(None),
                    other => anyhow::bail!(
                        "NARRATIVE_PROVIDER must be gemini, anthropic or none (got {other:?})"
                    ),
                };
            }

            if self.gemini_api_key.is_some() {
                Ok(Some(Provider::Gemini))
            } else if self.anthropic_api_key.is_some() {
                Ok(Some(Provider::Anthropic))
            } else {
                Ok(None)
            }
        }
    }

}

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod batch;

#[derive(Debug, Parser)]
#[command(name = "roi_worker")]
struct Args {
    /// JSON file with one campaign object or an array of them.
    #[arg(long)]
    input: PathBuf,

    /// Model artifact. Defaults to MODEL_PATH, then ./roi_pipeline.json.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Where to write the spreadsheet.
    #[arg(long, default_value = roi_core::export::EXPORT_FILE_NAME)]
    output: PathBuf,

    /// Ask the configured language model for optimization suggestions.
    #[arg(long)]
    narrative: bool,

    /// Score everything but write nothing.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = roi_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let model_path = args.model.clone().unwrap_or_else(|| settings.model_path());
    let artifact = roi_core::ModelArtifact::load(&model_path)
        .with_context(|| format!("cannot start without a model ({})", model_path.display()))?;
    let predictor = roi_core::CampaignPredictor::new(Arc::new(artifact));

    let campaigns = batch::read_campaigns(&args.input)?;
    let total = campaigns.len();
    let mut outcome = batch::score_all(&predictor, campaigns);

    anyhow::ensure!(
        !outcome.reports.is_empty(),
        "all {total} campaigns failed to score"
    );

    if args.narrative {
        match roi_core::llm::client_from_settings(&settings)? {
            Some(client) => batch::attach_narratives(client.as_ref(), &mut outcome.reports).await,
            None => tracing::warn!("--narrative given but no narrative provider is configured"),
        }
    }

    if args.dry_run {
        tracing::info!(
            total,
            scored = outcome.reports.len(),
            failed = outcome.failed,
            dry_run = true,
            "batch scored (dry-run)"
        );
        return Ok(());
    }

    let bytes = roi_core::export::to_xlsx(&outcome.reports)?;
    std::fs::write(&args.output, bytes)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    tracing::info!(
        total,
        scored = outcome.reports.len(),
        failed = outcome.failed,
        output = %args.output.display(),
        "batch scored and exported"
    );
    Ok(())
}

fn init_sentry(settings: &roi_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use roi_core::llm::{NarrativeClient, NarrativeInput};
use roi_core::model::TargetTransform;
use roi_core::{CampaignError, CampaignPredictor, CampaignReport, ModelArtifact, RawCampaignInput};

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

    let model_path = settings.model_path();
    let artifact = match ModelArtifact::load(&model_path) {
        Ok(artifact) => artifact,
        Err(e) => {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(
                path = %model_path.display(),
                error = %err,
                "model artifact load failed"
            );
            return Err(err);
        }
    };

    let narrator = match roi_core::llm::client_from_settings(&settings) {
        Ok(client) => client,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "narrative client unavailable; suggestions disabled");
            None
        }
    };

    let state = AppState {
        predictor: Arc::new(CampaignPredictor::new(Arc::new(artifact))),
        narrator,
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/model", get(get_model))
        .route("/predict", post(predict))
        .route("/export", post(export))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    predictor: Arc<CampaignPredictor>,
    narrator: Option<Arc<dyn NarrativeClient>>,
}

#[derive(Debug, Default, Deserialize)]
struct NarrativeParams {
    #[serde(default)]
    narrative: bool,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    model_kind: &'static str,
    model_columns: Vec<String>,
    target_transform: TargetTransform,
    has_scaler: bool,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    prediction_id: Uuid,
    predicted_revenue: f64,
    roi_percent: f64,
    ctr_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    narrative: Option<String>,
    generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, err: impl std::fmt::Display) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

/// Malformed or mistyped campaign fields answer like any other input error.
fn campaign_input(
    payload: Result<Json<RawCampaignInput>, JsonRejection>,
) -> Result<RawCampaignInput, ApiError> {
    match payload {
        Ok(Json(input)) => Ok(input),
        Err(rejection) => {
            tracing::info!(error = %rejection.body_text(), "rejected campaign body");
            Err(api_error(rejection.status(), rejection.body_text()))
        }
    }
}

fn campaign_error(err: CampaignError) -> ApiError {
    match err {
        CampaignError::Features(e) => {
            tracing::info!(error = %e, "rejected campaign input");
            api_error(StatusCode::UNPROCESSABLE_ENTITY, e)
        }
        CampaignError::Prediction(e) => {
            let err = anyhow::Error::new(e);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "prediction failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Prediction failed: {err}"))
        }
    }
}

async fn get_model(State(state): State<AppState>) -> Json<ModelInfo> {
    let artifact = state.predictor.artifact();
    Json(ModelInfo {
        model_kind: artifact.model_kind(),
        model_columns: artifact.model_columns().to_vec(),
        target_transform: artifact.target_transform(),
        has_scaler: artifact.has_scaler(),
    })
}

async fn build_report(
    state: &AppState,
    params: &NarrativeParams,
    input: RawCampaignInput,
) -> Result<CampaignReport, ApiError> {
    let report = state.predictor.report(input).map_err(campaign_error)?;
    if !params.narrative {
        return Ok(report);
    }

    let narrative = match &state.narrator {
        Some(client) => {
            let input = NarrativeInput::new(report.input.clone(), report.predicted_revenue);
            roi_core::llm::narrative_or_placeholder(client.as_ref(), &input).await
        }
        None => format!(
            "{}: no narrative provider configured",
            roi_core::llm::PLACEHOLDER_PREFIX
        ),
    };
    Ok(report.with_narrative(narrative))
}

async fn predict(
    State(state): State<AppState>,
    Query(params): Query<NarrativeParams>,
    payload: Result<Json<RawCampaignInput>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let input = campaign_input(payload)?;
    let report = build_report(&state, &params, input).await?;

    Ok(Json(PredictResponse {
        prediction_id: Uuid::new_v4(),
        predicted_revenue: report.predicted_revenue,
        roi_percent: report.roi_percent,
        ctr_percent: report.ctr_percent(),
        narrative: report.narrative,
        generated_at: report.generated_at,
    }))
}

async fn export(
    State(state): State<AppState>,
    Query(params): Query<NarrativeParams>,
    payload: Result<Json<RawCampaignInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = campaign_input(payload)?;
    let report = build_report(&state, &params, input).await?;

    let bytes = roi_core::export::to_xlsx(&[report]).map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(error = %e, "xlsx export failed");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))
    })?;

    let headers = [
        (
            header::CONTENT_TYPE,
            roi_core::export::XLSX_CONTENT_TYPE.to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                roi_core::export::EXPORT_FILE_NAME
            ),
        ),
    ];
    Ok((headers, bytes))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use roi_core::llm::Provider;
    use roi_core::model::Predictor;
    use roi_core::{FeatureRow, PredictionError};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    #[derive(Debug)]
    struct FixedOutput(f64);

    impl Predictor for FixedOutput {
        fn kind(&self) -> &'static str {
            "fixed"
        }

        fn predict(&self, _row: &FeatureRow) -> Result<f64, PredictionError> {
            Ok(self.0)
        }
    }

    struct EchoNarrator;

    #[async_trait::async_trait]
    impl NarrativeClient for EchoNarrator {
        fn provider(&self) -> Provider {
            Provider::Gemini
        }

        async fn generate_narrative(&self, input: &NarrativeInput) -> anyhow::Result<String> {
            Ok(format!("Channel {} looks healthy", input.campaign.channel))
        }
    }

    fn state(output: f64, narrator: Option<Arc<dyn NarrativeClient>>) -> AppState {
        let artifact = ModelArtifact::new(FixedOutput(output))
            .with_model_columns(vec!["CTR".to_string(), "Channel_Google".to_string()])
            .with_target_transform(TargetTransform::Identity);
        AppState {
            predictor: Arc::new(CampaignPredictor::new(Arc::new(artifact))),
            narrator,
        }
    }

    fn campaign(status: &str) -> Value {
        json!({
            "Status": status,
            "Channel": "Google",
            "Objective": "Sales",
            "Audience": "Adults",
            "Geo": "US",
            "Creative_Type": "Video",
            "Budget": 5000.0,
            "Spend_Till_Date": 1000.0,
            "Impressions_Till_Date": 5000,
            "Clicks_Till_Date": 100,
            "Conversions_Till_Date": 10,
            "Campaign_Duration": 30,
            "Duration_Till_Date": 10
        })
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn predict_returns_revenue_and_roi() {
        let app = router(state(7500.0, None));
        let res = app
            .oneshot(post_json("/predict", &campaign("Active")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let v = body_json(res).await;
        assert_eq!(v["predicted_revenue"], 7500.0);
        assert_eq!(v["roi_percent"], 50.0);
        assert_eq!(v["ctr_percent"], 2.0);
        assert!(v.get("narrative").is_none());
        assert!(v["prediction_id"].is_string());
    }

    #[tokio::test]
    async fn unknown_status_is_unprocessable() {
        let app = router(state(1.0, None));
        let res = app
            .oneshot(post_json("/predict", &campaign("Paused")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let v = body_json(res).await;
        assert!(v["error"].as_str().unwrap().contains("Paused"));
    }

    #[tokio::test]
    async fn mistyped_field_is_unprocessable_json() {
        let mut body = campaign("Active");
        body["Spend_Till_Date"] = json!("lots");

        let app = router(state(1.0, None));
        let res = app.oneshot(post_json("/predict", &body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let v = body_json(res).await;
        assert!(v["error"].as_str().unwrap().contains("Spend_Till_Date"));
    }

    #[tokio::test]
    async fn missing_field_is_unprocessable_json() {
        let mut body = campaign("Active");
        body.as_object_mut().unwrap().remove("Status");

        let app = router(state(1.0, None));
        let res = app.oneshot(post_json("/export", &body)).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let v = body_json(res).await;
        assert!(v["error"].as_str().unwrap().contains("Status"));
    }

    #[tokio::test]
    async fn narrative_is_attached_on_request() {
        let app = router(state(7500.0, Some(Arc::new(EchoNarrator))));
        let res = app
            .oneshot(post_json("/predict?narrative=true", &campaign("Completed")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let v = body_json(res).await;
        assert_eq!(v["narrative"], "Channel Google looks healthy");
    }

    #[tokio::test]
    async fn narrative_without_provider_is_placeholder() {
        let app = router(state(7500.0, None));
        let res = app
            .oneshot(post_json("/predict?narrative=true", &campaign("Active")))
            .await
            .unwrap();

        let v = body_json(res).await;
        assert!(v["narrative"]
            .as_str()
            .unwrap()
            .starts_with("AI suggestion unavailable"));
    }

    #[tokio::test]
    async fn export_returns_xlsx_attachment() {
        let app = router(state(7500.0, None));
        let res = app
            .oneshot(post_json("/export", &campaign("Active")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"campaign_prediction.xlsx\""
        );

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        // Zip local file header magic.
        assert_eq!(&bytes[..4], b"PK\x03\x04");
    }

    #[tokio::test]
    async fn model_endpoint_describes_artifact() {
        let app = router(state(1.0, None));
        let res = app
            .oneshot(Request::builder().uri("/model").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let v = body_json(res).await;
        assert_eq!(v["model_kind"], "fixed");
        assert_eq!(v["model_columns"], json!(["CTR", "Channel_Google"]));
        assert_eq!(v["target_transform"], "identity");
        assert_eq!(v["has_scaler"], false);
    }
}

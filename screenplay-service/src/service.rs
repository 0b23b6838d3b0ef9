use std::sync::Arc;

use axum::{
    Extension, Router,
    extract::State,
    middleware::{from_fn, from_fn_with_state},
    response::Json,
    routing::{get, post},
};
use screenplay_core::{
    Credentials, FormatStore, GenerationRequest, OpenRouterClient, ScreenplayGenerator,
};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::errors::{ApiResult, internal_error};
use crate::middleware::{DebugMode, correlation_id_middleware, debug_mode_middleware};
use crate::settings::ServiceSettings;

#[derive(Clone)]
pub struct AppState {
    pub generator: ScreenplayGenerator,
    pub debug_default: bool,
}

pub async fn create_app(settings: &ServiceSettings) -> anyhow::Result<Router> {
    let app_state = create_app_state(settings).await?;
    Ok(build_router(app_state))
}

async fn create_app_state(settings: &ServiceSettings) -> anyhow::Result<AppState> {
    let credentials = Credentials::load_or_empty(&settings.config_path).await;
    let formats = FormatStore::new(&settings.format_path);
    let client = OpenRouterClient::new(settings.openrouter.clone())?;
    info!(base_url = %client.base_url(), "OpenRouter client ready");

    Ok(AppState {
        generator: ScreenplayGenerator::new(credentials, formats, Arc::new(client)),
        debug_default: settings.debug,
    })
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/screenplay/generate", post(generate_screenplay))
        .route("/api/screenplay/format", get(get_screenplay_format))
        .layer(from_fn_with_state(app_state.clone(), debug_mode_middleware))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Screenplay Generation Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Generates structured screenplays from a story pitch using OpenRouter",
        "endpoints": {
            "POST /api/screenplay/generate": "Generate a screenplay",
            "GET /api/screenplay/format": "Get the screenplay format schema",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn generate_screenplay(
    State(state): State<AppState>,
    Extension(DebugMode(debug)): Extension<DebugMode>,
    request: Option<Json<GenerationRequest>>,
) -> ApiResult<Value> {
    // A request without a JSON body gets all defaults.
    let request = request.map(|Json(r)| r).unwrap_or_default();

    state.generator.generate(&request).await.map(Json).map_err(|e| {
        error!(error = %e, kind = e.kind(), "Error generating screenplay");
        internal_error(&e, debug)
    })
}

async fn get_screenplay_format(
    State(state): State<AppState>,
    Extension(DebugMode(debug)): Extension<DebugMode>,
) -> ApiResult<Value> {
    match state.generator.format().await {
        Ok(format) => Ok(Json(format.as_ref().clone())),
        Err(e) => {
            error!(error = %e, kind = e.kind(), "Error loading screenplay format");
            Err(internal_error(&e, debug))
        }
    }
}

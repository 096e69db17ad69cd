//! Axum HTTP server for the trainer.
//!
//! Handlers are thin: they validate what the extractors cannot, hand the
//! blocking provider work to `spawn_blocking`, and shape the result as JSON.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/` | Service name, version and endpoint list |
//! | GET | `/health` | Upstream reachability check |
//! | POST | `/train` | Run one training simulation |
//! | GET | `/pokemon` | Paginated species index (`offset`, `limit`) |
//! | GET | `/pokemon/:name/image` | Base64 sprite of one creature |

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::errors::{ProviderError, TrainingError};
use crate::provider::{ReferenceProvider, SharedProvider};
use crate::sprites;
use crate::training::validation::validate_page_limit;
use crate::training::Trainer;
use schema::{SpeciesPage, TrainingRequest, TrainingResult};

pub const NOT_FOUND_MESSAGE: &str = "Pokémon not found.";
pub const IMAGE_NOT_FOUND_MESSAGE: &str = "Image not found.";

pub struct AppState {
    pub trainer: Trainer<SharedProvider>,
}

impl AppState {
    pub fn new(trainer: Trainer<SharedProvider>) -> Self {
        Self { trainer }
    }

    fn provider(&self) -> &SharedProvider {
        self.trainer.provider()
    }
}

pub type SharedState = Arc<AppState>;

type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health_check))
        .route("/train", post(handle_train))
        .route("/train/", post(handle_train))
        .route("/pokemon", get(handle_list_species))
        .route("/pokemon/:name/image", get(handle_image))
        .layer(cors)
        .with_state(state)
}

// ── Request types ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default)]
    offset: u32,
    #[serde(default = "default_page_limit")]
    limit: u32,
}

fn default_page_limit() -> u32 {
    20
}

fn error_response(status: StatusCode, msg: &str) -> ApiError {
    (status, Json(serde_json::json!({ "error": msg })))
}

fn internal_error(err: tokio::task::JoinError) -> ApiError {
    log::error!("blocking task failed: {}", err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

fn provider_error_response(err: ProviderError, not_found: &str) -> ApiError {
    match err {
        ProviderError::NotFound(_) => error_response(StatusCode::NOT_FOUND, not_found),
        other => {
            log::warn!("reference data request failed: {}", other);
            error_response(StatusCode::BAD_GATEWAY, &other.to_string())
        }
    }
}

// ── GET handlers ────────────────────────────────────────────────────

async fn handle_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/health", "/train", "/pokemon", "/pokemon/{name}/image"],
    }))
}

async fn handle_health_check(
    State(state): State<SharedState>,
) -> (StatusCode, Json<serde_json::Value>) {
    let provider = state.provider().clone();
    let outcome = tokio::task::spawn_blocking(move || provider.probe()).await;
    let details = match outcome {
        Ok(Ok(())) => return (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))),
        Ok(Err(err)) => err.to_string(),
        Err(err) => err.to_string(),
    };
    log::warn!("health check failed: {}", details);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({ "status": "unhealthy", "details": details })),
    )
}

async fn handle_list_species(
    State(state): State<SharedState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<SpeciesPage>, ApiError> {
    validate_page_limit(params.limit)
        .map_err(|err| error_response(StatusCode::UNPROCESSABLE_ENTITY, &err.to_string()))?;

    let provider = state.provider().clone();
    let page = tokio::task::spawn_blocking(move || {
        provider.list_species(params.offset, params.limit)
    })
    .await
    .map_err(internal_error)?
    .map_err(|err| provider_error_response(err, NOT_FOUND_MESSAGE))?;
    Ok(Json(page))
}

async fn handle_image(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let provider = state.provider().clone();
    let lookup = name.clone();
    let image = tokio::task::spawn_blocking(move || {
        let profile = provider
            .resolve(&lookup)
            .map_err(|err| provider_error_response(err, NOT_FOUND_MESSAGE))?;
        sprites::sprite_base64(&provider, profile.sprite_id)
            .map_err(|err| provider_error_response(err, IMAGE_NOT_FOUND_MESSAGE))
    })
    .await
    .map_err(internal_error)??;

    Ok(Json(serde_json::json!({
        "pokemon": name,
        "image_base64": image,
    })))
}

// ── POST handlers ───────────────────────────────────────────────────

async fn handle_train(
    State(state): State<SharedState>,
    Json(request): Json<TrainingRequest>,
) -> Result<Json<TrainingResult>, ApiError> {
    let outcome = tokio::task::spawn_blocking(move || state.trainer.run(&request))
        .await
        .map_err(internal_error)?;

    match outcome {
        Ok(result) => Ok(Json(result)),
        Err(TrainingError::NotFound(_)) => {
            Err(error_response(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE))
        }
        Err(TrainingError::InvalidParameter(err)) => Err(error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            &err.to_string(),
        )),
    }
}

//! Request handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use tower::BoxError;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::api::models::{HealthResponse, ModelInfo, ModelsResponse};
use crate::error::{AppError, Result};
use crate::model::request::Text2ImgRequest;
use crate::model::result::GenerationResult;
use crate::AppState;

/// `POST /api/v6/images/text2img`
pub async fn text2img(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<Text2ImgRequest>, JsonRejection>,
) -> Result<Json<GenerationResult>> {
    let Json(request) = payload.map_err(|rejection| {
        AppError::InvalidRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let span = info_span!(
        "text2img",
        request_id = %Uuid::new_v4(),
        model_id = %request.model_id
    );

    // Shutdown cancels every in-flight poll through the parent token.
    let cancel = state.shutdown.child_token();
    let result = state
        .orchestrator
        .generate(request, &cancel)
        .instrument(span)
        .await?;

    Ok(Json(result))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// `GET /models`
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    let models = state
        .registry
        .list()
        .iter()
        .map(|descriptor| ModelInfo::from(descriptor.as_ref()))
        .collect();

    Json(ModelsResponse { models })
}

/// Map failures of the request timeout layer onto the error envelope
pub async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        AppError::Timeout("Request took too long to complete".to_string())
    } else {
        AppError::Internal(format!("Unhandled middleware error: {}", err))
    }
}

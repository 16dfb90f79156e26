use axum::{
    routing::{get, post},
    Router,
    extract::{rejection::JsonRejection, Json, State},
    response::{IntoResponse, Response},
};
use tower_http::cors::{CorsLayer, Any};
use tracing::info;

use crate::error::AppError;
use crate::api::models::{ClassifyRequest, HealthResponse, UrlPayload};
use crate::api::response;
use crate::pipeline::{self, Stage, StageError};
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/classify", post(classify_handler))
        .route("/api/health", get(health_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn classify_handler(
    State(state): State<AppState>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Response {
    let start_time = std::time::Instant::now();

    let payload = match validate(payload) {
        Ok(payload) => payload,
        Err(err) => return response::failure(StageError::new(Stage::Validating, err)),
    };
    info!("Processing request for URL: {}", payload.url);

    let result = pipeline::classify_product(
        state.provider.as_ref(),
        state.classifier.as_ref(),
        &payload,
    )
    .await;

    info!("Request processing took: {:?}", start_time.elapsed());

    match result {
        Ok(body) => response::success(body).into_response(),
        Err(err) => response::failure(err),
    }
}

fn validate(payload: Result<Json<ClassifyRequest>, JsonRejection>) -> crate::error::Result<UrlPayload> {
    let Json(req) = payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    UrlPayload::try_from(req)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        provider: state.provider.name().to_string(),
        model: state.classifier.model_name().to_string(),
    })
}

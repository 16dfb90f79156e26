use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};
use crate::pipeline::StageError;

pub fn success<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

/// Logs a failed request at a level matching its class and renders it.
pub fn failure(err: StageError) -> Response {
    let StageError { stage, error } = err;
    if error.is_client_error() {
        warn!(stage = %stage, "Request rejected: {}", error);
    } else {
        error!(stage = %stage, "Request failed: {}", error);
    }
    error.into_response()
}

use axum::{
    response::{IntoResponse, Response},
    Json,
    http::StatusCode,
};
use chrono::Utc;
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorBody {
    pub detail: String,
    pub status: u16,
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Retrieval(_) | AppError::Classification(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to the caller.
    pub fn detail(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Unprocessable(msg) => msg.clone(),
            AppError::Retrieval(msg) => {
                format!("An internal error occurred during scraping: {}", msg)
            }
            AppError::Classification(msg) => {
                format!("An internal error occurred during classification: {}", msg)
            }
            AppError::Config(msg) => format!("Server misconfigured: {}", msg),
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            detail: self.detail(),
            status: status.as_u16(),
            timestamp: Utc::now().to_rfc3339(),
        });

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Retrieval(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

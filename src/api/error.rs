//! HTTP error mapping

use crate::error::ScoringError;
use axum::{
    extract::rejection::JsonRejection,
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use validator::ValidationErrors;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Auth errors
    MissingApiKey,
    InvalidApiKey,

    // Request errors
    ValidationError(String),
    MalformedBody(StatusCode, String),

    // Scoring errors
    Scoring(ScoringError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MissingApiKey => (StatusCode::UNAUTHORIZED, "API key required"),
            AppError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "Invalid API key"),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::MalformedBody(status, msg) => (*status, msg.as_str()),
            AppError::Scoring(ScoringError::ModelUnavailable) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Model not loaded")
            }
            AppError::Scoring(e) => {
                tracing::error!(error = %e, "Scoring failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Error processing transaction")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("API-Key"));
        }
        response
    }
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        AppError::Scoring(err)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedBody(rejection.status(), rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = AppError::InvalidApiKey.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "API-Key");
    }

    #[test]
    fn test_scoring_error_is_generic_500() {
        let response = AppError::from(ScoringError::Inference("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn test_missing_model_is_unavailable() {
        let response = AppError::from(ScoringError::ModelUnavailable).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_validation_is_bad_request() {
        let response = AppError::ValidationError("hour: out of range".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

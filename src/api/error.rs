use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::error::QueryError;

/// API error types that can be returned from handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// Error response that gets serialized to JSON
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::NotFound(_) => "NotFound",
            ApiError::Unprocessable(_) => "Unprocessable",
            ApiError::ServiceUnavailable(_) => "ServiceUnavailable",
            ApiError::InternalError(_) => "InternalServerError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error = self.error_type();

        let message = match &self {
            ApiError::InternalError(_) => {
                tracing::error!(error = %self, "API error occurred");
                "An internal error occurred".to_string()
            }
            ApiError::ServiceUnavailable(_) => {
                tracing::warn!(error = %self, "Service unavailable");
                self.to_string()
            }
            _ => {
                tracing::debug!(error = %self, "Client error");
                self.to_string()
            }
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        let message = error.to_string();
        match error {
            QueryError::InvalidPlant(_) | QueryError::InvalidTimestamp(_) => ApiError::BadRequest(message),
            QueryError::UnknownInverter { .. } => ApiError::NotFound(message),
            QueryError::IncompleteWindow { .. } => ApiError::Unprocessable(message),
            QueryError::ForecasterUnavailable(_) => ApiError::ServiceUnavailable(message),
            QueryError::DataIntegrity(_) | QueryError::Store(_) => ApiError::InternalError(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(QueryError::InvalidPlant("9".into()), StatusCode::BAD_REQUEST)]
    #[case(QueryError::InvalidTimestamp("x".into()), StatusCode::BAD_REQUEST)]
    #[case(QueryError::UnknownInverter { plant: "Plant1".into(), inverter: "Z".into() }, StatusCode::NOT_FOUND)]
    #[case(QueryError::IncompleteWindow { inverter: "X".into(), anchor: "a".into(), missing: "m".into() }, StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(QueryError::ForecasterUnavailable("down".into()), StatusCode::SERVICE_UNAVAILABLE)]
    #[case(QueryError::DataIntegrity("dup".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(QueryError::Store("io".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_query_error_status(#[case] error: QueryError, #[case] expected: StatusCode) {
        assert_eq!(ApiError::from(error).status_code(), expected);
    }

    #[test]
    fn test_error_types() {
        assert_eq!(ApiError::NotFound("x".into()).error_type(), "NotFound");
        assert_eq!(ApiError::Unprocessable("x".into()).error_type(), "Unprocessable");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let response = ApiError::InternalError("secret path".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

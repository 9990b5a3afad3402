//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::application::RunServiceError;
use crate::domain::guidelines::GuidelineError;
use crate::ports::FactsError;

/// API-level error with a stable code and HTTP status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    StreamConsumed(String),

    #[error("{0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::StreamConsumed(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Validation(_) => "VALIDATION_FAILED",
            ApiError::StreamConsumed(_) => "STREAM_CONSUMED",
            ApiError::Upstream(_) => "UPSTREAM_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<RunServiceError> for ApiError {
    fn from(err: RunServiceError) -> Self {
        match err {
            RunServiceError::NotFound(_) => ApiError::NotFound(err.to_string()),
            RunServiceError::StreamConsumed(_) => ApiError::StreamConsumed(err.to_string()),
            RunServiceError::NoFactsProvider => ApiError::Validation(err.to_string()),
            RunServiceError::Facts(inner) => inner.into(),
            RunServiceError::Guidelines(inner) => inner.into(),
        }
    }
}

impl From<FactsError> for ApiError {
    fn from(err: FactsError) -> Self {
        match err {
            FactsError::NotFound(_) => ApiError::NotFound(err.to_string()),
            FactsError::Malformed(_) => ApiError::Upstream(err.to_string()),
            FactsError::Transport(_) => ApiError::Upstream(err.to_string()),
        }
    }
}

impl From<GuidelineError> for ApiError {
    fn from(err: GuidelineError) -> Self {
        match err {
            GuidelineError::VersionNotFound(_) => ApiError::NotFound(err.to_string()),
            // Every other variant names the violated constraint.
            _ => ApiError::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RunId;

    #[test]
    fn not_found_maps_to_404() {
        let err: ApiError = RunServiceError::NotFound(RunId::new()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn stream_consumed_maps_to_409() {
        let err: ApiError = RunServiceError::StreamConsumed(RunId::new()).into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn guideline_validation_maps_to_422_with_constraint() {
        let err: ApiError = GuidelineError::NonPositiveInterval.into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.to_string().contains("intervalMonths"));
    }

    #[test]
    fn unknown_guideline_version_maps_to_404() {
        let err: ApiError = GuidelineError::VersionNotFound("v9".to_string()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn facts_errors_map_by_kind() {
        let err: ApiError = FactsError::NotFound("pat-1".to_string()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = FactsError::Transport("refused".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.code(), "UPSTREAM_ERROR");
    }
}

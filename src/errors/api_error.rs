//! Errores de la capa HTTP y su mapeo a status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use clip_core::PipelineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Cuerpo mal formado o acción desconocida.
    #[error("{message}")]
    Validation { message: String },

    /// Etapa en curso o cambio concurrente del throttle.
    #[error("{message}")]
    Conflict { message: String },

    #[error("{message}")]
    Internal { message: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Cuerpo de error: `{ "error": "...", "code": "..." }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Conflict { .. } => "CONFLICT",
            ApiError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal { message: message.into() }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let message = err.to_string();
        match err {
            PipelineError::UnknownAction(_) => ApiError::Validation { message },
            PipelineError::StageLocked { .. } | PipelineError::ThrottleConflict { .. } => ApiError::Conflict { message },
            PipelineError::Domain(_) | PipelineError::Store(_) => ApiError::Internal { message },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse { error: self.to_string(),
                                   code: self.error_code().to_string() };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clip_core::{Action, StoreError};

    #[test]
    fn pipeline_errors_map_to_status() {
        let unknown: ApiError = PipelineError::UnknownAction("refund".into()).into();
        assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);
        assert!(unknown.to_string().contains("freeze, review, payout, check_throttle"));

        let locked: ApiError = PipelineError::StageLocked { action: Action::Payout,
                                                            scope: "2026-W41".into() }.into();
        assert_eq!(locked.status_code(), StatusCode::CONFLICT);

        let store: ApiError = PipelineError::Store(StoreError::Backend("connection reset".into())).into();
        assert_eq!(store.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.error_code(), "INTERNAL_ERROR");
    }
}

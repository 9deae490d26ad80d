use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, info};

use super::models::ErrorResponse;
use crate::error::PipelineError;

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ServerError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<PipelineError> for ServerError {
    fn from(err: PipelineError) -> Self {
        let status = match &err {
            PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            PipelineError::TooLong { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            PipelineError::ExtractionFailed(_) | PipelineError::NoSpeechDetected => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PipelineError::AllModelsExhausted { .. } => StatusCode::BAD_GATEWAY,
            PipelineError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("server: {} {}", self.status.as_u16(), self.message);
        } else {
            info!("server: {} {}", self.status.as_u16(), self.message);
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
                success: false,
            }),
        )
            .into_response()
    }
}

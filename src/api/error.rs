//! Transport errors and their HTTP status codes.

use axum::http::header::InvalidHeaderValue;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{info, warn};

use crate::application::ApplicationError;
use crate::domain::DomainError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("response encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Application(err.into())
    }
}

impl ApiError {
    /// Malformed input is the client's fault, structural and storage
    /// failures are ours.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Application(
                ApplicationError::Domain(DomainError::MalformedIdentifier { .. })
                | ApplicationError::UploadFormat { .. },
            ) => StatusCode::BAD_REQUEST,
            ApiError::Application(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::NOT_FOUND {
            info!("request rejected ({status}): {self}");
        } else {
            warn!("request rejected ({status}): {self}");
        }
        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}

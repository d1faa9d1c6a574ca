use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ErrorBody;
use service::{errors::ServiceError, storage::StoreError};
use thiserror::Error;
use tracing::{error, warn};

/// Handler error, rendered as a status code with a JSON `{"error": ...}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The path has an empty segment; treated like an unmatched route.
    #[error("not found")]
    NotFound,
    /// A path segment or payload key is not a usable name.
    #[error("{0}")]
    BadRequest(String),
    /// The backend failed; the request may have been partially applied.
    #[error("{0}")]
    Backend(String),
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Model(e) => ApiError::BadRequest(e.to_string()),
            ServiceError::Store(e) => ApiError::Backend(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Backend(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            // same empty 404 as an unmatched route
            ApiError::NotFound => return status.into_response(),
            ApiError::BadRequest(msg) => warn!(error = %msg, "rejected request"),
            ApiError::Backend(msg) => error!(error = %msg, "backend failure"),
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("storage setup failed: {0}")]
    Storage(#[from] StoreError),
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

//! JSON in and out of handlers.
//!
//! `JsonPayload` is a forgiving body extractor: a request without a JSON
//! content type does not match the route at all (empty 404), and a body that
//! fails to decode is logged and handed to the handler as `None`.
//! `JsonUtf8` writes `application/json; charset=utf-8` responses.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, warn};

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// True when the media type is `application/json`, ignoring case and parameters.
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false)
}

#[derive(Debug)]
pub struct JsonPayload<T>(pub Option<T>);

#[async_trait]
impl<S, T> FromRequest<S> for JsonPayload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json_content_type(req.headers()) {
            return Err(StatusCode::NOT_FOUND.into_response());
        }
        let path = req.uri().path().to_string();
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => Ok(Self(Some(value))),
            Err(e) => {
                warn!(%path, error = %e, "ignoring undecodable JSON body");
                Ok(Self(None))
            }
        }
    }
}

/// JSON response with an explicit UTF-8 charset.
#[derive(Debug, Clone)]
pub struct JsonUtf8<T>(pub T);

impl<T: Serialize> IntoResponse for JsonUtf8<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self.0) {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8))],
                body,
            )
                .into_response(),
            Err(e) => {
                error!(error = %e, "response serialization failed");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

//! Callable-function protocol: request validation and response envelopes.
//!
//! Requests are `POST` with a JSON body `{"data": ...}`. Successful calls
//! answer `{"result": ...}`, failures `{"error": {"status", "message"}}`.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use house_worker_auth::{verifier::GATEWAY_USERINFO_HEADER, AuthError, RequestCredentials};
use house_worker_core::{metrics::MetricTimer, FunctionError, FunctionsErrorCode};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::bootstrap::AppState;

pub const GENERATE_MY_HOUSE: &str = "generate_my_house";

/// A [`FunctionError`] rendered as a callable error response.
pub struct CallableError(pub FunctionError);

impl From<FunctionError> for CallableError {
    fn from(err: FunctionError) -> Self {
        Self(err)
    }
}

impl IntoResponse for CallableError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = json!({
            "error": {
                "status": self.0.code.as_str(),
                "message": self.0.message,
            }
        });
        (status, Json(body)).into_response()
    }
}

/// Wraps a handler result as `{"result": ...}`.
pub fn success<T: Serialize>(result: T) -> Response {
    (StatusCode::OK, Json(json!({ "result": result }))).into_response()
}

/// Checks content type and body shape, returning the `data` payload.
pub fn parse_request(headers: &HeaderMap, body: &[u8]) -> Result<Value, FunctionError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let mime = content_type.split(';').next().unwrap_or_default().trim();
    if !mime.eq_ignore_ascii_case("application/json") {
        tracing::debug!("Request has invalid content type: {:?}", content_type);
        return Err(FunctionError::invalid_argument("Bad Request"));
    }

    let mut parsed: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Request body is not JSON: {}", e);
        FunctionError::invalid_argument("Bad Request")
    })?;

    parsed
        .as_object_mut()
        .and_then(|obj| obj.remove("data"))
        .ok_or_else(|| {
            tracing::debug!("Request body is missing data field");
            FunctionError::invalid_argument("Bad Request")
        })
}

pub fn credentials_from_headers(headers: &HeaderMap) -> RequestCredentials {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    RequestCredentials {
        authorization: read(header::AUTHORIZATION.as_str()),
        gateway_userinfo: read(GATEWAY_USERINFO_HEADER),
    }
}

/// Logs a failure the way the hosting platform would, keeping details server-side.
fn log_failure(function: &str, err: &FunctionError) {
    match (&err.code, &err.cause) {
        (FunctionsErrorCode::Internal, Some(cause)) => {
            tracing::error!(function, error = %cause, "Unhandled error");
        }
        _ => tracing::debug!(function, code = %err.code, "{}", err.message),
    }
}

/// `POST /generate_my_house`
pub async fn generate_my_house(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, CallableError> {
    let _timer = MetricTimer::new(GENERATE_MY_HOUSE);

    parse_request(&headers, &body)?;

    let credentials = credentials_from_headers(&headers);
    let auth = state
        .verifier
        .verify(&credentials)
        .await
        .map_err(|e| match e {
            AuthError::KeyFetch(_) => {
                tracing::error!(function = GENERATE_MY_HOUSE, error = %e, "Unhandled error");
                FunctionError::internal()
            }
            _ => {
                tracing::warn!("Rejected credential: {}", e);
                FunctionError::unauthenticated("Unauthenticated")
            }
        })?;

    match state.handler.generate_my_house(&auth).await {
        Ok(created) => Ok(success(created)),
        Err(err) => {
            log_failure(GENERATE_MY_HOUSE, &err);
            Err(err.into())
        }
    }
}

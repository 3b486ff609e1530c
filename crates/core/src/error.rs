use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Canonical error codes of the callable-function protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionsErrorCode {
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl FunctionsErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionsErrorCode::Ok => "OK",
            FunctionsErrorCode::Cancelled => "CANCELLED",
            FunctionsErrorCode::Unknown => "UNKNOWN",
            FunctionsErrorCode::InvalidArgument => "INVALID_ARGUMENT",
            FunctionsErrorCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            FunctionsErrorCode::NotFound => "NOT_FOUND",
            FunctionsErrorCode::AlreadyExists => "ALREADY_EXISTS",
            FunctionsErrorCode::PermissionDenied => "PERMISSION_DENIED",
            FunctionsErrorCode::ResourceExhausted => "RESOURCE_EXHAUSTED",
            FunctionsErrorCode::FailedPrecondition => "FAILED_PRECONDITION",
            FunctionsErrorCode::Aborted => "ABORTED",
            FunctionsErrorCode::OutOfRange => "OUT_OF_RANGE",
            FunctionsErrorCode::Unimplemented => "UNIMPLEMENTED",
            FunctionsErrorCode::Internal => "INTERNAL",
            FunctionsErrorCode::Unavailable => "UNAVAILABLE",
            FunctionsErrorCode::DataLoss => "DATA_LOSS",
            FunctionsErrorCode::Unauthenticated => "UNAUTHENTICATED",
        }
    }

    /// HTTP status the callable protocol pairs with this code.
    pub fn http_status(&self) -> u16 {
        match self {
            FunctionsErrorCode::Ok => 200,
            FunctionsErrorCode::Cancelled => 499,
            FunctionsErrorCode::Unknown => 500,
            FunctionsErrorCode::InvalidArgument => 400,
            FunctionsErrorCode::DeadlineExceeded => 504,
            FunctionsErrorCode::NotFound => 404,
            FunctionsErrorCode::AlreadyExists => 409,
            FunctionsErrorCode::PermissionDenied => 403,
            FunctionsErrorCode::ResourceExhausted => 429,
            FunctionsErrorCode::FailedPrecondition => 400,
            FunctionsErrorCode::Aborted => 409,
            FunctionsErrorCode::OutOfRange => 400,
            FunctionsErrorCode::Unimplemented => 501,
            FunctionsErrorCode::Internal => 500,
            FunctionsErrorCode::Unavailable => 503,
            FunctionsErrorCode::DataLoss => 500,
            FunctionsErrorCode::Unauthenticated => 401,
        }
    }
}

impl fmt::Display for FunctionsErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error surfaced to the caller of a callable function.
///
/// `message` is sent to the client verbatim. The underlying store error, if
/// any, stays server-side.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct FunctionError {
    pub code: FunctionsErrorCode,
    pub message: String,
    #[source]
    pub cause: Option<StoreError>,
}

impl FunctionError {
    pub fn new(code: FunctionsErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(FunctionsErrorCode::Unauthenticated, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(FunctionsErrorCode::InvalidArgument, message)
    }

    /// Opaque internal failure. The message never carries details.
    pub fn internal() -> Self {
        Self::new(FunctionsErrorCode::Internal, "INTERNAL")
    }
}

impl From<StoreError> for FunctionError {
    fn from(err: StoreError) -> Self {
        Self {
            cause: Some(err),
            ..Self::internal()
        }
    }
}

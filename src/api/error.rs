//! API error handling for consistent JSON error responses.

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::error;

use crate::error::{FieldErrors, MeetError};

/// API error type that converts to `{"status": false, "error": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "status": false,
            "error": self.message,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

fn validation_details(errors: &FieldErrors) -> Value {
    serde_json::to_value(errors).unwrap_or(Value::Null)
}

impl From<MeetError> for ApiError {
    fn from(err: MeetError) -> Self {
        match &err {
            MeetError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, err.to_string()),
            MeetError::Validation(errors) => {
                Self::bad_request(err.to_string()).with_details(validation_details(errors))
            }
            MeetError::InvalidOtp | MeetError::OtpLocked | MeetError::InvalidTransition { .. } => {
                Self::bad_request(err.to_string())
            }
            MeetError::Conflict => Self::new(StatusCode::CONFLICT, err.to_string()),
            MeetError::Unauthorized(message) => Self::new(StatusCode::UNAUTHORIZED, message.clone()),
            MeetError::Internal(e) => {
                error!("Internal error: {:#}", e);
                Self::internal()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        MeetError::Internal(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::new(err.status(), err.body_text())
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::errors::{AuthErrorType, Error};

const TOKEN_REJECTED: &str = "Invalid or expired token";

#[derive(Debug)]
pub enum ApiError {
    BadRequest { message: String, fields: Vec<String> },
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn bad_request<S: Into<String>>(msg: S) -> Self {
        ApiError::BadRequest { message: msg.into(), fields: Vec::new() }
    }

    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn forbidden<S: Into<String>>(msg: S) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        ApiError::Internal(msg.into())
    }
}

/// Error envelope. `data` is always null, `success` always false.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    data: Option<()>,
    message: String,
    success: bool,
    errors: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let (message, errors) = match self {
            ApiError::BadRequest { message, fields } => (message, fields),
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => (msg, Vec::new()),
        };

        let body = ErrorBody { status_code: status.as_u16(), data: None, message, success: false, errors };
        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation { message, field } => {
                ApiError::BadRequest { message, fields: field.into_iter().collect() }
            }
            Error::NotFound { resource_type, .. } => {
                ApiError::NotFound(format!("{} does not exist", resource_type))
            }
            Error::Auth { message, error_type } => match error_type {
                AuthErrorType::InvalidToken | AuthErrorType::ExpiredToken => {
                    ApiError::Unauthorized(TOKEN_REJECTED.to_string())
                }
                AuthErrorType::MissingToken => ApiError::Unauthorized("Unauthorized request".to_string()),
                AuthErrorType::InvalidCredentials => ApiError::Unauthorized(message),
            },
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::Conflict { message, .. } => ApiError::Conflict(message),
            Error::Upstream(msg) => {
                tracing::error!(error = %msg, "upstream failure");
                ApiError::BadGateway("Media service request failed".to_string())
            }
            err @ Error::Database { .. } if err.is_unique_violation() => {
                ApiError::Conflict("Resource already exists".to_string())
            }
            other => {
                tracing::error!(error = %other, "request failed with internal error");
                ApiError::Internal("Internal server error".to_string())
            }
        }
    }
}

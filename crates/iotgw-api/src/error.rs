//! API error types and conversions

use std::any::Any;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use iotgw_core::ServiceError;
use serde::Serialize;

/// API error type that converts to HTTP responses
#[derive(Debug)]
pub enum ApiError {
    /// Failure reported by a gateway or device service
    Service(ServiceError),
    /// 400 Bad Request - body could not be decoded
    BadRequest(String),
    /// 500 Internal Server Error - a handler panicked
    Internal(String),
}

/// Standard error response format
#[derive(Serialize)]
struct ErrorResponse {
    kind: &'static str,
    error: String,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Service(err) => (
                StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                err.kind(),
            ),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.parts();
        let message = match self {
            ApiError::Service(err) => err.to_string(),
            ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg,
        };

        if status.is_server_error() {
            tracing::error!(error = kind, %message, "API error");
        } else if status.is_client_error() {
            tracing::debug!(error = kind, %message, "API client error");
        }

        let body = Json(ErrorResponse {
            kind,
            error: message,
        });

        (status, body).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Render a handler panic as a 500 with the usual error body
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Internal(format!("Unexpected failure: {}", detail)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use iotgw_core::RecordId;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn service_errors_keep_their_status() {
        assert_eq!(
            status_of(ServiceError::MissingGateway.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                ServiceError::NotFound {
                    entity: "Gateway",
                    id: RecordId::new(),
                }
                .into()
            ),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ServiceError::Unavailable("down".into()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn bad_body_is_a_validation_error() {
        let err = ApiError::BadRequest("expected value".into());
        assert_eq!(err.parts(), (StatusCode::BAD_REQUEST, "validation_error"));
    }

    #[test]
    fn internal_is_server_error() {
        assert_eq!(
            status_of(ApiError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn panic_payloads_become_internal_errors() {
        let response = panic_response(Box::new("lock poisoned"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = panic_response(Box::new(String::from("index out of range")));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = panic_response(Box::new(42u8));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

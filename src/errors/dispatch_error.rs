//! Request-time error types
//!
//! A [`DispatchError`] raised anywhere in a route's hook chain is converted into
//! a JSON error response. The response carries a [`ForwardedError`] extension so
//! outer layers (the host's error handling) can observe what failed.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Result type for route actions and controller hooks
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors raised inside a route's permission/hook/action chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The action or a hook failed
    #[error("Handler error: {0}")]
    Handler(String),

    /// The request could not be read or parsed
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Access refused by a hook
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The action panicked; the panic was contained
    #[error("Handler panicked: {0}")]
    Panic(String),

    /// Failure with an explicit status code
    #[error("{message}")]
    Status { status: StatusCode, message: String },
}

impl DispatchError {
    /// Wrap any displayable error as a handler failure
    pub fn handler(error: impl std::fmt::Display) -> Self {
        DispatchError::Handler(error.to_string())
    }

    /// Failure with an explicit status code
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        DispatchError::Status {
            status,
            message: message.into(),
        }
    }

    /// HTTP status used when the error reaches the client
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::Handler(_) | DispatchError::Panic(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            DispatchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::Forbidden(_) => StatusCode::FORBIDDEN,
            DispatchError::Status { status, .. } => *status,
        }
    }

    /// Convert into a response tagged with the route the error came from
    pub fn into_forwarded_response(self, route: Option<String>) -> Response {
        let status = self.status_code();
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));
        let mut response = (status, body).into_response();
        response
            .extensions_mut()
            .insert(ForwardedError { route, error: self });
        response
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(error: serde_json::Error) -> Self {
        DispatchError::BadRequest(error.to_string())
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        self.into_forwarded_response(None)
    }
}

/// Response extension describing an error forwarded by the dispatch pipeline
#[derive(Debug, Clone)]
pub struct ForwardedError {
    /// Declared path of the route that failed, when known
    pub route: Option<String>,
    /// The error itself
    pub error: DispatchError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            DispatchError::handler("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DispatchError::Forbidden("nope".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            DispatchError::status(StatusCode::CONFLICT, "taken").status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_forwarded_response_carries_extension() {
        let response = DispatchError::handler("boom").into_forwarded_response(Some("/a".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let forwarded = response.extensions().get::<ForwardedError>().unwrap();
        assert_eq!(forwarded.route.as_deref(), Some("/a"));
        assert_eq!(forwarded.error, DispatchError::Handler("boom".to_string()));
    }
}

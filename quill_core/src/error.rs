//! API error values and their boundary translation into responses.

use serde_json::json;
use tracing::warn;

use crate::http::response::{Response, response_templates::json_response};
use crate::http::status::StatusCode;

/// A typed API error carrying an HTTP status for boundary translation.
///
/// User-visible failure is a JSON array of `{code, message}` objects with the
/// HTTP status drawn from the error itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    code: String,
    message: String,
    status: StatusCode,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        ApiError {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    /// No registered route matched the request path and method.
    pub fn no_route() -> Self {
        ApiError::new(
            "json_no_route",
            "No route was found matching the URL and request method",
            StatusCode::NOT_FOUND,
        )
    }

    /// A matched endpoint has no callback attached.
    pub fn handler_not_callable() -> Self {
        ApiError::new(
            "json_handler_invalid",
            "The handler for the route is invalid",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Converts this error into the JSON error response.
    pub fn into_response(self) -> Response {
        warn!(
            error_code = %self.code,
            http_status = %self.status,
            "request failed: {}",
            self.message
        );
        let body = json!([{ "code": self.code, "message": self.message }]);
        json_response(self.status, body)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

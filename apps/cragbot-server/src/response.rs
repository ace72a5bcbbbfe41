//! HTTP boundary response envelope.
//!
//! Every outcome of an inbound request, including rejections produced before
//! routing, is an [`ApiResponse`]: a status code plus a string body. It is
//! forwarded verbatim as the HTTP response.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::config::Environment;
use crate::error::ServerError;

/// Generic body for internal errors outside development.
pub const UNHANDLED_ERROR_BODY: &str = "Unhandled Error";

/// `{status_code, body}` pair returned to the HTTP caller.
///
/// # Examples
///
/// ```
/// use axum::http::StatusCode;
/// use cragbot_server::response::ApiResponse;
///
/// let resp = ApiResponse::unauthorized("Body Missing");
/// assert_eq!(resp.status_code, StatusCode::UNAUTHORIZED);
/// assert_eq!(resp.body, "Body Missing");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status_code: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status_code: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
        }
    }

    /// 200 with a plain body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, reason)
    }

    /// 200 with `value` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Json` if `value` cannot be serialized.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ServerError> {
        Ok(Self::ok(serde_json::to_string(value)?))
    }

    /// 500 for an error that escaped dispatch. The error text is only
    /// exposed in development.
    pub fn internal_error(error: &ServerError, environment: Environment) -> Self {
        let body = match environment {
            Environment::Development => error.to_string(),
            Environment::Production => UNHANDLED_ERROR_BODY.to_string(),
        };
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, body)
    }

    fn is_json(&self) -> bool {
        self.body.starts_with('{') || self.body.starts_with('[')
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let content_type = if self.is_json() {
            "application/json"
        } else {
            "text/plain; charset=utf-8"
        };
        (
            self.status_code,
            [(header::CONTENT_TYPE, content_type)],
            self.body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_hide_error_detail_in_production() {
        let err = ServerError::CommandNotFound("boulder".into());
        let resp = ApiResponse::internal_error(&err, Environment::Production);
        assert_eq!(resp.status_code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.body, "Unhandled Error");
    }

    #[test]
    fn test_should_expose_error_detail_in_development() {
        let err = ServerError::CommandNotFound("boulder".into());
        let resp = ApiResponse::internal_error(&err, Environment::Development);
        assert_eq!(resp.body, "Command not found: boulder");
    }

    #[test]
    fn test_should_serialize_json_body() {
        let resp = ApiResponse::json(&serde_json::json!({ "type": 1 })).unwrap();
        assert_eq!(resp, ApiResponse::ok(r#"{"type":1}"#));
    }

    #[test]
    fn test_should_set_json_content_type() {
        let resp = ApiResponse::ok(r#"{"type":5}"#).into_response();
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        let resp = ApiResponse::ok("OK").into_response();
        assert_eq!(
            resp.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
    }
}

//! HTTP response handling
//!
//! Unified builders for the JSON responses the proxy and health endpoints
//! return. Error bodies always have the shape `{ "error": "<message>" }`, with
//! an optional `details` field carrying the underlying cause.

use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;
use serde_json::{json, Value};

/// Error body returned when no upstream API base is configured
pub const API_BASE_MISSING: &str = "API_BASE is not defined in env";

/// Error body returned when the upstream request could not be made
pub const UPSTREAM_FAILED: &str = "Upstream request failed";

/// Unified response builder
pub struct ResponseBuilder;

impl ResponseBuilder {
    // ===============================
    // ERROR RESPONSE METHODS
    // ===============================

    /// `BadRequest` (400) error response
    #[must_use]
    pub fn bad_request() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(StatusCode::BAD_REQUEST, "Bad request")
    }

    /// `InternalServerError` (500) error response
    #[must_use]
    pub fn internal_server_error() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    /// `BadGateway` (502) error response
    #[must_use]
    pub fn bad_gateway() -> ErrorResponseBuilder {
        ErrorResponseBuilder::new(StatusCode::BAD_GATEWAY, UPSTREAM_FAILED)
    }

    // ===============================
    // SUCCESS RESPONSE METHODS
    // ===============================

    /// JSON response with an arbitrary status, as relayed from upstream
    #[must_use]
    pub fn with_status(status: u16) -> JsonResponseBuilder {
        JsonResponseBuilder::new(
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
        )
    }

    /// Plain body with an arbitrary status and content type
    #[must_use]
    pub fn text(status: u16, content_type: &str, body: String) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY))
            .insert_header((header::CONTENT_TYPE, content_type))
            .body(body)
    }

    // ===============================
    // CONVENIENCE METHODS
    // ===============================

    /// The proxy has nowhere to forward to
    #[must_use]
    pub fn api_base_missing() -> HttpResponse {
        Self::internal_server_error().with_message(API_BASE_MISSING).build()
    }

    /// The upstream request failed before a response arrived
    #[must_use]
    pub fn upstream_failed(details: &str) -> HttpResponse {
        Self::bad_gateway().with_details(details).build()
    }
}

// ===============================
// BUILDER TYPES
// ===============================

/// Builder for error responses with fluent interface
pub struct ErrorResponseBuilder {
    status: StatusCode,
    message: String,
    details: Option<String>,
}

impl ErrorResponseBuilder {
    fn new(status: StatusCode, default_message: &str) -> Self {
        Self {
            status,
            message: default_message.to_string(),
            details: None,
        }
    }

    /// Set the `error` message
    #[must_use]
    pub fn with_message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    /// Set the `details` field
    #[must_use]
    pub fn with_details(mut self, details: &str) -> Self {
        self.details = Some(details.to_string());
        self
    }

    /// Build the final `HttpResponse`
    #[must_use]
    pub fn build(self) -> HttpResponse {
        let mut body = json!({ "error": self.message });
        if let Some(details) = self.details {
            body["details"] = Value::String(details);
        }

        HttpResponse::build(self.status)
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .json(body)
    }
}

/// Builder for JSON responses
pub struct JsonResponseBuilder {
    status: StatusCode,
}

impl JsonResponseBuilder {
    fn new(status: StatusCode) -> Self {
        Self { status }
    }

    /// Build the response with JSON content
    #[must_use]
    pub fn json<T: serde::Serialize>(self, data: &T) -> HttpResponse {
        HttpResponse::build(self.status).json(data)
    }
}

// ===============================
// UTILITY FUNCTIONS
// ===============================

/// Convert an actix HTTP method to a reqwest one
///
/// Any method, extension methods included, is passed through unchanged.
///
/// # Errors
///
/// Returns a 400 response if the method token cannot be represented
pub fn convert_http_method(
    method: &actix_web::http::Method,
) -> Result<reqwest::Method, HttpResponse> {
    reqwest::Method::from_bytes(method.as_str().as_bytes()).map_err(|_| {
        ResponseBuilder::bad_request()
            .with_message(&format!("HTTP method '{method}' is not supported"))
            .build()
    })
}

/// Build the upstream URL from the API base, the upstream path and the
/// original query string
///
/// The base is configured by the operator and is concatenated as-is.
#[must_use]
pub fn build_upstream_url(api_base: &str, upstream_path: &str, query: &str) -> String {
    let mut url = String::with_capacity(api_base.len() + upstream_path.len() + query.len() + 2);
    url.push_str(api_base);
    if !upstream_path.is_empty() && !upstream_path.starts_with('/') {
        url.push('/');
    }
    url.push_str(upstream_path);
    if !query.is_empty() {
        url.push('?');
        url.push_str(query);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(response: HttpResponse) -> Value {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn test_api_base_missing_shape() {
        let response = ResponseBuilder::api_base_missing();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "API_BASE is not defined in env" })
        );
    }

    #[actix_web::test]
    async fn test_upstream_failed_carries_details() {
        let response = ResponseBuilder::upstream_failed("connection refused");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Upstream request failed", "details": "connection refused" })
        );
    }

    #[actix_web::test]
    async fn test_with_status_relays_upstream_status() {
        let response = ResponseBuilder::with_status(404).json(&json!({ "detail": "nope" }));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ResponseBuilder::with_status(42).json(&json!({}));
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_convert_http_method() {
        use actix_web::http::Method;

        assert_eq!(convert_http_method(&Method::PATCH).unwrap(), reqwest::Method::PATCH);
        let custom = Method::from_bytes(b"PROPFIND").unwrap();
        assert_eq!(convert_http_method(&custom).unwrap().as_str(), "PROPFIND");
    }

    #[test]
    fn test_build_upstream_url() {
        assert_eq!(
            build_upstream_url("https://api.example.com", "/recruiter/profile", ""),
            "https://api.example.com/recruiter/profile"
        );
        assert_eq!(
            build_upstream_url("https://api.example.com", "jobs", "page=2&q=rust"),
            "https://api.example.com/jobs?page=2&q=rust"
        );
    }
}

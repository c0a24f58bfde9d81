use actix_web::{web, HttpRequest, HttpResponse};
use reqwest::Client;
use serde_json::Value;

use crate::utils::headers::RequestHeaderProcessor;
use crate::utils::logging::LoggingHelper;
use crate::utils::responses::{build_upstream_url, convert_http_method, ResponseBuilder};

/// HTTP client for making upstream requests
///
/// Idle connections are not pooled: a pooled connection stays tied to the
/// runtime that opened it, and every actix worker runs its own.
static CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap_or_default()
});

/// Content type used when the upstream does not send one
const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// Forward a browser request to the upstream API and relay the answer
///
/// The target is `api_base + upstream_path + original query string`. Only the
/// authorization, accept and content-type headers are passed along, and the
/// body is sent for every method except GET and HEAD. Errors never escape:
/// they become JSON error responses.
pub async fn forward_request(
    req: &HttpRequest,
    body: web::Bytes,
    api_base: &str,
    upstream_path: &str,
) -> HttpResponse {
    if api_base.is_empty() {
        return ResponseBuilder::api_base_missing();
    }

    let method = match convert_http_method(req.method()) {
        Ok(method) => method,
        Err(response) => return response,
    };
    let upstream_url = build_upstream_url(api_base, upstream_path, req.query_string());
    LoggingHelper::log_upstream_forward(method.as_str(), upstream_path);

    let sends_body = method != reqwest::Method::GET && method != reqwest::Method::HEAD;
    let mut request_builder = RequestHeaderProcessor::for_proxy()
        .forward_request_headers(req, CLIENT.request(method, &upstream_url));
    if sends_body {
        request_builder = request_builder.body(body);
    }

    let upstream_response = match request_builder.send().await {
        Ok(response) => response,
        Err(e) => {
            LoggingHelper::log_upstream_failure(upstream_path, &e);
            return ResponseBuilder::upstream_failed(&e.to_string());
        }
    };

    relay_response(upstream_response, upstream_path).await
}

/// Turn the upstream response into ours: JSON when the body parses as JSON,
/// otherwise the raw text under the upstream content type
async fn relay_response(upstream_response: reqwest::Response, upstream_path: &str) -> HttpResponse {
    let status = upstream_response.status().as_u16();
    let content_type = upstream_response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    let text = match upstream_response.text().await {
        Ok(text) => text,
        Err(e) => {
            LoggingHelper::log_upstream_failure(upstream_path, &e);
            return ResponseBuilder::upstream_failed(&e.to_string());
        }
    };

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => ResponseBuilder::with_status(status).json(&json),
        Err(_) => ResponseBuilder::text(status, &content_type, text),
    }
}

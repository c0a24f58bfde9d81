//! Backend API client
//!
//! Thin wrapper over `reqwest` that resolves paths against the configured API
//! base, sends JSON, and attaches the session's bearer token read from the
//! [`SessionTokenStore`] immediately before each request.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::session::SessionTokenStore;
use crate::settings::sanitize_api_base;

static ABSOLUTE_URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^https?://").expect("absolute URL pattern is valid"));

/// API request failures
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend answered with a non-success status
    #[error("API {method} request failed with status {status}")]
    Status {
        method: Method,
        status: u16,
        /// Parsed response body (JSON, or the raw text as a JSON string)
        body: Value,
    },

    /// The request could not be sent or the connection failed
    #[error("API request could not be completed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request payload could not be encoded as JSON
    #[error("API request payload could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status of the failed request, when there was one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Serialization(_) => None,
        }
    }
}

/// Per-request options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Bearer token to use instead of the stored one
    pub token: Option<String>,
    /// Extra headers; these override the defaults
    pub headers: Vec<(String, String)>,
    /// Query parameters (GET only)
    pub params: Vec<(String, String)>,
}

impl RequestOptions {
    #[must_use]
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.push((name.to_string(), value.to_string()));
        self
    }
}

/// Client for the SmartHire backend API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    api_base: String,
    tokens: SessionTokenStore,
}

impl ApiClient {
    #[must_use]
    pub fn new(api_base: &str, tokens: SessionTokenStore) -> Self {
        Self::with_http_client(Client::new(), api_base, tokens)
    }

    #[must_use]
    pub fn with_http_client(http: Client, api_base: &str, tokens: SessionTokenStore) -> Self {
        Self {
            http,
            api_base: sanitize_api_base(api_base),
            tokens,
        }
    }

    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Whether an API base is configured
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.api_base.is_empty()
    }

    #[must_use]
    pub fn tokens(&self) -> &SessionTokenStore {
        &self.tokens
    }

    /// Resolve `path` against the API base
    ///
    /// Absolute `http(s)://` URLs pass through untouched. Without a base the
    /// path is returned as an absolute path.
    #[must_use]
    pub fn build_url(&self, path: &str) -> String {
        if ABSOLUTE_URL_PATTERN.is_match(path) {
            return path.to_string();
        }
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        format!("{}{path}", self.api_base)
    }

    /// GET `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend answers non-2xx
    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        self.send(Method::GET, path, None, options).await
    }

    /// POST `payload` as JSON to `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized, the request fails,
    /// or the backend answers non-2xx
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.send(Method::POST, path, Some(to_body(payload)?), options)
            .await
    }

    /// PATCH `payload` as JSON to `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized, the request fails,
    /// or the backend answers non-2xx
    pub async fn patch<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        self.send(Method::PATCH, path, Some(to_body(payload)?), options)
            .await
    }

    /// Attach the stored bearer token to an arbitrary request
    #[must_use]
    pub fn authorized(&self, request_builder: RequestBuilder) -> RequestBuilder {
        self.tokens.authorize(request_builder)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        options: RequestOptions,
    ) -> Result<Value, ApiError> {
        let target = self.build_url(path);

        let mut defaults = vec![("accept", "application/json")];
        if body.is_some() {
            defaults.push(("content-type", "application/json"));
        }
        let token = options.token.or_else(|| self.tokens.get_token());

        let mut request_builder = self.http.request(method.clone(), &target);
        for (name, value) in merge_headers(&defaults, &options.headers, token.as_deref()) {
            request_builder = request_builder.header(name, value);
        }
        if method == Method::GET && !options.params.is_empty() {
            request_builder = request_builder.query(&options.params);
        }
        if let Some(body) = body {
            request_builder = request_builder.body(body);
        }

        let response = request_builder.send().await?;
        let status = response.status();
        let body = parse_response(response).await;

        if !status.is_success() {
            log::debug!("API {method} {target} failed with status {status}");
            return Err(ApiError::Status {
                method,
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn to_body<T: Serialize + ?Sized>(payload: &T) -> Result<String, ApiError> {
    Ok(serde_json::to_string(payload)?)
}

/// Merge default and caller headers (caller wins, names are case-insensitive),
/// then set the bearer authorization when a token is available
fn merge_headers(
    defaults: &[(&str, &str)],
    extra: &[(String, String)],
    token: Option<&str>,
) -> BTreeMap<String, String> {
    let mut headers: BTreeMap<String, String> = defaults
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), (*value).to_string()))
        .collect();
    for (name, value) in extra {
        headers.insert(name.to_ascii_lowercase(), value.clone());
    }
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        headers.insert("authorization".to_string(), format!("Bearer {token}"));
    }
    headers
}

/// Read a response body as JSON, falling back to the raw text
///
/// An unreadable body is reported as `null`.
pub async fn parse_response(response: Response) -> Value {
    match response.text().await {
        Ok(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        Err(e) => {
            log::warn!("Failed to read API response body: {e}");
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, SessionTokenStore::in_memory())
    }

    #[test]
    fn test_build_url_with_base() {
        let api = client("https://api.smarthire.example/v1/");
        assert_eq!(api.api_base(), "https://api.smarthire.example/v1");
        assert_eq!(
            api.build_url("/jobs"),
            "https://api.smarthire.example/v1/jobs"
        );
        assert_eq!(
            api.build_url("jobs/42"),
            "https://api.smarthire.example/v1/jobs/42"
        );
    }

    #[test]
    fn test_build_url_passes_absolute_urls_through() {
        let api = client("https://api.smarthire.example");
        assert_eq!(
            api.build_url("HTTPS://other.example/x"),
            "HTTPS://other.example/x"
        );
        assert_eq!(api.build_url("http://other.example"), "http://other.example");
    }

    #[test]
    fn test_build_url_without_base() {
        let api = client("");
        assert!(!api.is_configured());
        assert_eq!(api.build_url("jobs"), "/jobs");
        assert_eq!(api.build_url("/jobs"), "/jobs");
    }

    #[test]
    fn test_merge_headers() {
        let defaults = [("accept", "application/json"), ("content-type", "application/json")];
        let extra = vec![("Accept".to_string(), "text/csv".to_string())];

        let merged = merge_headers(&defaults, &extra, Some("tok"));
        assert_eq!(merged["accept"], "text/csv");
        assert_eq!(merged["content-type"], "application/json");
        assert_eq!(merged["authorization"], "Bearer tok");

        let merged = merge_headers(&defaults, &[], None);
        assert!(!merged.contains_key("authorization"));
    }
}

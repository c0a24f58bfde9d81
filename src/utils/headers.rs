//! HTTP header processing for request forwarding

use actix_web::HttpRequest;
use reqwest::RequestBuilder;

/// Request headers the proxy passes through to the upstream API
pub const FORWARDED_HEADERS: [&str; 3] = ["authorization", "accept", "content-type"];

// ===============================
// REQUEST HEADER FORWARDING
// ===============================

/// Header processing strategy for request forwarding
///
/// Only allow-listed headers reach the upstream; cookies, hop-by-hop headers
/// and everything else the browser sends are dropped.
#[derive(Debug, Clone)]
pub struct RequestHeaderProcessor {
    allowed: Vec<String>,
}

impl Default for RequestHeaderProcessor {
    fn default() -> Self {
        Self {
            allowed: FORWARDED_HEADERS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl RequestHeaderProcessor {
    /// Processor with the default allow-list for proxy requests
    #[must_use]
    pub fn for_proxy() -> Self {
        Self::default()
    }

    /// Processor with a custom allow-list
    #[must_use]
    pub fn with_allowed(headers: &[&str]) -> Self {
        Self {
            allowed: headers.iter().map(|h| h.to_lowercase()).collect(),
        }
    }

    /// Whether `name` is passed through
    #[must_use]
    pub fn is_forwarded(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.allowed.iter().any(|allowed| *allowed == name)
    }

    /// Copy allow-listed headers from an actix `HttpRequest` onto a reqwest
    /// `RequestBuilder`
    ///
    /// Values that are not valid visible ASCII are skipped.
    pub fn forward_request_headers(
        &self,
        req: &HttpRequest,
        mut request_builder: RequestBuilder,
    ) -> RequestBuilder {
        for (name, value) in req.headers() {
            if !self.is_forwarded(name.as_str()) {
                continue;
            }
            if let Ok(value_str) = value.to_str() {
                request_builder = request_builder.header(name.as_str(), value_str);
            }
        }
        request_builder
    }
}

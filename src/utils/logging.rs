// Centralized logging utilities to reduce verbose logging patterns
//
// Token values are never logged; only their presence.
use log::{debug, info, warn};
use serde_json::Value;

use crate::popup::{PopupError, PopupGeometry};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log a popup being opened
    pub fn log_popup_opened(window_name: &str, geometry: &PopupGeometry) {
        debug!(
            "🪟 Opened popup '{}' ({}x{} at {},{})",
            window_name, geometry.width, geometry.height, geometry.left, geometry.top
        );
    }

    /// Log the platform refusing to open a popup
    pub fn log_popup_blocked(window_name: &str) {
        warn!("🚫 Popup '{}' was blocked by the platform", window_name);
    }

    /// Log a cross-window message that did not qualify
    pub fn log_popup_message_ignored(origin: &str, reason: &str) {
        debug!("Ignoring window message from {}: {}", origin, reason);
    }

    /// Log how a popup flow settled
    pub fn log_popup_settled(window_name: &str, error: Option<&PopupError>) {
        match error {
            None => info!("✅ Popup '{}' delivered an authentication result", window_name),
            Some(e) => warn!("❌ Popup '{}' flow failed: {}", window_name, e),
        }
    }

    /// Log the start of an OAuth flow against the backend
    pub fn log_flow_start(provider: &str, flow: &str, path: &str) {
        info!("🔄 Starting {} {} flow via {}", provider, flow, path);
    }

    /// Log the backend's start response, without leaking its contents
    pub fn log_flow_start_response(provider: &str, body: &Value) {
        debug!(
            "{} start response received (auth_url={})",
            provider,
            if body.get("auth_url").and_then(Value::as_str).is_some() {
                "present"
            } else {
                "missing"
            }
        );
    }

    /// Log a failed flow start
    pub fn log_flow_start_failed(provider: &str, error: &dyn std::error::Error) {
        warn!("❌ Could not start {} flow: {}", provider, error);
    }

    /// Log completion of an OAuth flow
    pub fn log_flow_completed(provider: &str, token_stored: bool) {
        if token_stored {
            info!("✅ {} flow completed, access token stored", provider);
        } else {
            warn!("{} flow completed without an access token in the payload", provider);
        }
    }

    /// Log a token captured from a redirect URL
    pub fn log_redirect_token_captured(path: &str) {
        info!("🔑 Captured access token from redirect to {}", path);
    }

    /// Log an upstream proxy request
    pub fn log_upstream_forward(method: &str, upstream_path: &str) {
        debug!("➡️  Forwarding {} {} to upstream API", method, upstream_path);
    }

    /// Log an upstream proxy failure
    pub fn log_upstream_failure(upstream_path: &str, error: &dyn std::error::Error) {
        warn!("Upstream request to {} failed: {}", upstream_path, error);
    }
}

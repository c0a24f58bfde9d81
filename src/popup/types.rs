//! Data types exchanged between the popup broker, its host and callers

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Tag carried by every message the OAuth callback page posts back to its opener
pub const DEFAULT_MESSAGE_SOURCE: &str = "smarthire-linkedin";

/// Default popup window name
pub const DEFAULT_WINDOW_NAME: &str = "oauth";

/// Default popup width in pixels
pub const DEFAULT_POPUP_WIDTH: u32 = 600;

/// Default popup height in pixels
pub const DEFAULT_POPUP_HEIGHT: u32 = 700;

/// Default overall flow timeout (two minutes)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(120_000);

/// Default interval at which the popup is checked for having been closed
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Payload delivered by the popup to its opener at the end of the OAuth dance
///
/// Shape: `{ "source": "<tag>", "data": { "access_token": "...", ...profile } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResult {
    pub source: String,
    #[serde(default)]
    pub data: Value,
}

impl AuthResult {
    /// The bearer token carried in `data.access_token`, if any
    ///
    /// Empty strings are treated as absent.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.data
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
    }
}

/// A raw cross-window message as seen by the opener
#[derive(Debug, Clone, PartialEq)]
pub struct WindowMessage {
    /// Origin of the sending window (e.g. `https://api.smarthire.example`)
    pub origin: String,
    /// Structured-clone payload of the message
    pub data: Value,
}

impl WindowMessage {
    #[must_use]
    pub fn new(origin: &str, data: Value) -> Self {
        Self {
            origin: origin.to_string(),
            data,
        }
    }
}

/// Options recognised by [`crate::popup::PopupAuthBroker::run_popup_flow`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupOptions {
    pub window_name: String,
    pub width: u32,
    pub height: u32,
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Only messages whose `source` equals this tag are considered
    pub message_source: String,
    /// Accepted sender origins. Empty accepts any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            window_name: DEFAULT_WINDOW_NAME.to_string(),
            width: DEFAULT_POPUP_WIDTH,
            height: DEFAULT_POPUP_HEIGHT,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            message_source: DEFAULT_MESSAGE_SOURCE.to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

impl PopupOptions {
    #[must_use]
    pub fn with_window_name(mut self, window_name: &str) -> Self {
        self.window_name = window_name.to_string();
        self
    }

    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub fn with_message_source(mut self, message_source: &str) -> Self {
        self.message_source = message_source.to_string();
        self
    }

    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    /// Check whether a message origin passes the allow-list
    #[must_use]
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.is_empty()
            || self
                .allowed_origins
                .iter()
                .any(|allowed| allowed.trim_end_matches('/') == origin.trim_end_matches('/'))
    }
}

/// Position and outer size of the opener window, in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenMetrics {
    pub screen_x: i32,
    pub screen_y: i32,
    pub outer_width: u32,
    pub outer_height: u32,
}

impl Default for ScreenMetrics {
    fn default() -> Self {
        Self {
            screen_x: 0,
            screen_y: 0,
            outer_width: 1280,
            outer_height: 800,
        }
    }
}

/// Popup placement centered over the opener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupGeometry {
    pub left: i64,
    pub top: i64,
    pub width: u32,
    pub height: u32,
}

impl PopupGeometry {
    /// Center a `width` x `height` popup over the opener window
    ///
    /// A popup larger than the opener ends up with a negative offset relative to
    /// the opener's origin, which is what the platform expects.
    #[must_use]
    pub fn centered(screen: ScreenMetrics, width: u32, height: u32) -> Self {
        let left = i64::from(screen.screen_x)
            + (i64::from(screen.outer_width) - i64::from(width)) / 2;
        let top = i64::from(screen.screen_y)
            + (i64::from(screen.outer_height) - i64::from(height)) / 2;
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Window feature string passed to the platform's `open` call
    #[must_use]
    pub fn features(&self) -> String {
        format!(
            "width={},height={},left={},top={},menubar=no,toolbar=no,location=yes,status=no,resizable=yes,scrollbars=yes",
            self.width, self.height, self.left, self.top
        )
    }
}

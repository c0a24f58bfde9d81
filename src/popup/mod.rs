//! Popup-based OAuth handshake
//!
//! # Modules
//!
//! - [`broker`] - Opens the popup and races message, close and timeout
//! - [`host`] - Ports onto the windowing environment and its message channel
//! - [`types`] - Payloads, options and popup geometry

pub mod broker;
pub mod host;
pub mod types;

pub use broker::{PopupAuthBroker, PopupError};
pub use host::{MessageBus, MessageListener, PopupHost, PopupWindow};
pub use types::{
    AuthResult, PopupGeometry, PopupOptions, ScreenMetrics, WindowMessage, DEFAULT_MESSAGE_SOURCE,
};

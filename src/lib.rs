#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

pub mod api;
pub mod handlers;
pub mod popup;
pub mod proxy;
pub mod session;
pub mod settings;
pub mod utils;

// Test doubles for unit tests, and for integration tests via the `testing` feature
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use api::{ApiClient, AuthFlowError, FlowKind, IdTokenExchange, OAuthFlowInitiator};
pub use handlers::{health, proxy_api};
pub use popup::{AuthResult, PopupAuthBroker, PopupError, PopupOptions};
pub use session::{RedirectTokenCapture, SessionTokenStore};
pub use settings::SmartHireSettings;

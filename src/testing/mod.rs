//! Testing utilities for SmartHire auth
//!
//! Test doubles for the platform ports and pre-built fixtures, shared by the
//! unit tests and, behind the `testing` feature, the integration tests.
//!
//! ## Organization
//!
//! - [`mock`] - Scripted popup host, window handles and failing storage
//! - [`location`] - In-memory browser location
//! - [`fixtures`] - Pre-built settings, stores and popup messages
//!
//! ## Usage
//!
//! ```rust
//! use smarthire_auth::popup::PopupAuthBroker;
//! use smarthire_auth::testing::{fixtures::TestFixtures, mock::{MockPopupHost, PopupScript}};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let script = PopupScript::idle()
//!     .post_after(Duration::from_secs(1), TestFixtures::linkedin_message("tok_123"));
//! let host = Arc::new(MockPopupHost::new(script));
//! let broker = PopupAuthBroker::new(host.clone());
//! ```

pub mod fixtures;
pub mod location;
pub mod mock;

pub use fixtures::TestFixtures;
pub use location::MemoryLocation;
pub use mock::{
    FailingSessionStorage, MockPopupHost, MockWindowHandle, OpenedPopup, PopupScript,
};

/// Common test constants
pub mod constants {
    /// Origin the mock callback page posts from
    pub const TEST_CALLBACK_ORIGIN: &str = "https://api.smarthire.example";

    /// Authorization URL handed to the popup
    pub const TEST_AUTH_URL: &str = "https://provider.example/auth";

    /// Access token delivered by the mock provider
    pub const TEST_ACCESS_TOKEN: &str = "tok_123";

    /// Google ID token used for exchange tests
    pub const TEST_ID_TOKEN: &str = "google_id_token_abc";
}

//! Test fixtures providing pre-built test objects
//!
//! Commonly used settings, stores and popup messages, so test files do not
//! rebuild the same objects over and over.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::ApiClient;
use crate::popup::{PopupAuthBroker, WindowMessage, DEFAULT_MESSAGE_SOURCE};
use crate::session::SessionTokenStore;
use crate::settings::SmartHireSettings;

use super::constants::TEST_CALLBACK_ORIGIN;
use super::mock::{MockPopupHost, PopupScript};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Default settings pointing at `api_base`
    #[must_use]
    pub fn settings(api_base: &str) -> SmartHireSettings {
        let mut settings = SmartHireSettings::default();
        settings.api.base_url = api_base.to_string();
        settings
    }

    /// Fresh in-memory token store, isolated from every other test
    #[must_use]
    pub fn token_store() -> SessionTokenStore {
        SessionTokenStore::in_memory()
    }

    /// API client for `api_base` sharing `tokens`
    #[must_use]
    pub fn api_client(api_base: &str, tokens: &SessionTokenStore) -> ApiClient {
        ApiClient::new(api_base, tokens.clone())
    }

    /// Mock host replaying `script` and a broker driving it
    #[must_use]
    pub fn broker(script: PopupScript) -> (Arc<MockPopupHost>, PopupAuthBroker) {
        let host = Arc::new(MockPopupHost::new(script));
        let broker = PopupAuthBroker::new(host.clone());
        (host, broker)
    }

    /// Callback-page message for the LinkedIn flow carrying `access_token`
    #[must_use]
    pub fn linkedin_message(access_token: &str) -> WindowMessage {
        Self::tagged_message(
            DEFAULT_MESSAGE_SOURCE,
            json!({
                "access_token": access_token,
                "user": { "name": "Test Recruiter", "email": "recruiter@example.com" },
            }),
        )
    }

    /// Callback-page message with an arbitrary tag and payload
    #[must_use]
    pub fn tagged_message(source: &str, data: Value) -> WindowMessage {
        WindowMessage::new(TEST_CALLBACK_ORIGIN, json!({ "source": source, "data": data }))
    }

    /// Message from an unrelated sender (browser extension, devtools bridge)
    #[must_use]
    pub fn foreign_message() -> WindowMessage {
        WindowMessage::new(
            TEST_CALLBACK_ORIGIN,
            json!({ "source": "react-devtools-content-script", "payload": {} }),
        )
    }
}

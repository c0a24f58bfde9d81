//! Session token store
//!
//! Single source of truth for the current bearer token. The store is an
//! injected service: every consumer holds a clone sharing the same storage
//! backend, and tests build isolated stores instead of sharing global state.

use std::fmt;
use std::sync::Arc;

use log::warn;

use super::storage::{MemorySessionStorage, SessionStorage, SessionStoreError};

/// Storage key the access token lives under
pub const ACCESS_TOKEN_KEY: &str = "app_access_token";

/// Holder of the session's bearer token
#[derive(Clone)]
pub struct SessionTokenStore {
    storage: Arc<dyn SessionStorage>,
    key: Arc<str>,
}

impl fmt::Debug for SessionTokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the token itself
        f.debug_struct("SessionTokenStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl SessionTokenStore {
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_key(storage, ACCESS_TOKEN_KEY)
    }

    #[must_use]
    pub fn with_key(storage: Arc<dyn SessionStorage>, key: &str) -> Self {
        Self {
            storage,
            key: Arc::from(key),
        }
    }

    /// A store over fresh in-memory storage
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStorage::new()))
    }

    /// Replace the current token, or clear it with `None`
    ///
    /// The token is opaque and not validated. An empty string clears the
    /// token, the same as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be written
    pub fn set_token(&self, token: Option<&str>) -> Result<(), SessionStoreError> {
        match token.filter(|t| !t.is_empty()) {
            Some(token) => self.storage.set_item(&self.key, token),
            None => self.storage.remove_item(&self.key),
        }
    }

    /// Current token, if any
    ///
    /// Storage read failures are logged and reported as "no token", so the
    /// request goes out unauthenticated and the backend decides.
    #[must_use]
    pub fn get_token(&self) -> Option<String> {
        match self.storage.get_item(&self.key) {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read session token: {e}");
                None
            }
        }
    }

    /// Clear the token (logout)
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be written
    pub fn clear(&self) -> Result<(), SessionStoreError> {
        self.set_token(None)
    }

    /// `Authorization` header value for the current token
    #[must_use]
    pub fn bearer_header(&self) -> Option<String> {
        self.get_token().map(|token| format!("Bearer {token}"))
    }

    /// Attach the current bearer token to an outgoing request, if present
    ///
    /// The store is read at call time, immediately before the request is sent.
    #[must_use]
    pub fn authorize(&self, request_builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.bearer_header() {
            Some(value) => request_builder.header(reqwest::header::AUTHORIZATION, value),
            None => request_builder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock::FailingSessionStorage;

    #[test]
    fn test_set_then_get() {
        let store = SessionTokenStore::in_memory();
        assert_eq!(store.get_token(), None);

        for token in ["tok_123", "eyJhbGciOiJIUzI1NiJ9.e30.sig", "with spaces / and ?&="] {
            store.set_token(Some(token)).unwrap();
            assert_eq!(store.get_token().as_deref(), Some(token));
        }

        store.set_token(None).unwrap();
        assert_eq!(store.get_token(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let store = SessionTokenStore::in_memory();
        store.set_token(Some("first")).unwrap();
        store.set_token(Some("second")).unwrap();
        assert_eq!(store.get_token().as_deref(), Some("second"));
    }

    #[test]
    fn test_empty_token_clears() {
        let store = SessionTokenStore::in_memory();
        store.set_token(Some("tok")).unwrap();
        store.set_token(Some("")).unwrap();
        assert_eq!(store.get_token(), None);
    }

    #[test]
    fn test_clones_share_storage_but_stores_are_isolated() {
        let store = SessionTokenStore::in_memory();
        let clone = store.clone();
        let other = SessionTokenStore::in_memory();

        store.set_token(Some("shared")).unwrap();
        assert_eq!(clone.get_token().as_deref(), Some("shared"));
        assert_eq!(other.get_token(), None);

        clone.clear().unwrap();
        assert_eq!(store.get_token(), None);
    }

    #[test]
    fn test_bearer_header_and_authorize() {
        let store = SessionTokenStore::in_memory();
        let client = reqwest::Client::new();

        let request = store
            .authorize(client.get("http://example.com"))
            .build()
            .unwrap();
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());

        store.set_token(Some("tok_123")).unwrap();
        assert_eq!(store.bearer_header().as_deref(), Some("Bearer tok_123"));

        let request = store
            .authorize(client.get("http://example.com"))
            .build()
            .unwrap();
        assert_eq!(
            request.headers()[reqwest::header::AUTHORIZATION],
            "Bearer tok_123"
        );
    }

    #[test]
    fn test_debug_does_not_leak_token() {
        let store = SessionTokenStore::in_memory();
        store.set_token(Some("super-secret")).unwrap();
        let rendered = format!("{store:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains(ACCESS_TOKEN_KEY));
    }

    #[test]
    fn test_read_failure_means_no_token() {
        let store = SessionTokenStore::new(Arc::new(FailingSessionStorage::reads_fail()));
        assert_eq!(store.get_token(), None);
        assert_eq!(store.bearer_header(), None);

        let request = store
            .authorize(reqwest::Client::new().get("http://example.com"))
            .build()
            .unwrap();
        assert!(request.headers().get(reqwest::header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let storage = Arc::new(FailingSessionStorage::writes_fail());
        let store = SessionTokenStore::new(storage.clone());

        assert!(matches!(
            store.set_token(Some("tok")),
            Err(SessionStoreError::Io(_))
        ));
        assert!(store.clear().is_err());
        assert_eq!(storage.write_attempts(), 2);
    }
}

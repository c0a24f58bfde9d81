//! Redirect-token capture
//!
//! Fallback path for flows where the backend redirects the whole page (not a
//! popup) to a callback route with the token in the query string.

use url::Url;

use super::storage::SessionStoreError;
use super::store::SessionTokenStore;
use crate::utils::logging::LoggingHelper;

/// Query parameters that may carry the token, in priority order
pub const TOKEN_QUERY_PARAMS: [&str; 2] = ["token", "access_token"];

/// The page's current location and history
pub trait BrowserLocation {
    /// URL currently shown in the address bar
    fn current_url(&self) -> Url;

    /// Replace the current history entry with `url`, without a reload
    fn replace_url(&self, url: &Url);
}

/// Reads a token from the callback URL into the session token store
#[derive(Debug, Clone)]
pub struct RedirectTokenCapture {
    store: SessionTokenStore,
}

impl RedirectTokenCapture {
    #[must_use]
    pub fn new(store: SessionTokenStore) -> Self {
        Self { store }
    }

    /// Capture the token from the current URL, if one is present
    ///
    /// On success the token is stored and the token parameters are stripped from
    /// the visible URL with a history replace. Returns `Ok(None)` and touches
    /// nothing when the URL carries no token, so calling it again after a
    /// capture is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be written to session storage. The
    /// URL is left untouched in that case.
    pub fn capture(
        &self,
        location: &dyn BrowserLocation,
    ) -> Result<Option<String>, SessionStoreError> {
        let current = location.current_url();
        let Some(token) = find_token(&current) else {
            return Ok(None);
        };

        self.store.set_token(Some(&token))?;
        location.replace_url(&strip_token_params(&current));
        LoggingHelper::log_redirect_token_captured(current.path());

        Ok(Some(token))
    }
}

/// First non-empty token parameter, checked in [`TOKEN_QUERY_PARAMS`] order
#[must_use]
pub fn find_token(url: &Url) -> Option<String> {
    TOKEN_QUERY_PARAMS.iter().find_map(|name| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    })
}

/// `url` without any token parameters; other parameters are kept in order
#[must_use]
pub fn strip_token_params(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !TOKEN_QUERY_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut stripped = url.clone();
    stripped.set_fragment(None);
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}

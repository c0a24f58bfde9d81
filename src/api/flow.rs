//! OAuth flow initiator
//!
//! Asks the backend for an authorization URL, drives the popup broker with it,
//! and stores the access token from the result.

use serde_json::{json, Value};
use std::fmt;

use super::client::{ApiClient, ApiError, RequestOptions};
use crate::popup::{AuthResult, PopupAuthBroker, PopupError, PopupOptions};
use crate::session::SessionStoreError;
use crate::utils::logging::LoggingHelper;

/// Backend endpoint that starts the LinkedIn flow
pub const LINKEDIN_START_PATH: &str = "/auth/linkedin";

/// Which logical flow the user asked for
///
/// Both currently start the same backend flow; the distinction is kept so the
/// endpoints can diverge without touching callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    SignIn,
    SignUp,
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowKind::SignIn => write!(f, "sign-in"),
            FlowKind::SignUp => write!(f, "sign-up"),
        }
    }
}

/// Ways a full OAuth flow can fail
#[derive(Debug, thiserror::Error)]
pub enum AuthFlowError {
    /// No API base is configured, so there is no backend to ask
    #[error("API base URL is not configured")]
    NotConfigured,

    /// The request for an authorization URL failed
    #[error("Network error when starting {provider} flow")]
    FlowStart {
        provider: String,
        #[source]
        source: ApiError,
    },

    /// The backend answered without an `auth_url`
    #[error("Failed to start {provider} flow: response did not include an auth_url")]
    MalformedResponse { provider: String, body: Value },

    /// The popup handshake failed
    #[error("{provider} popup flow failed")]
    Popup {
        provider: String,
        #[source]
        source: PopupError,
    },

    /// The token could not be written to session storage
    #[error("Failed to store the {provider} access token")]
    TokenStorage {
        provider: String,
        #[source]
        source: SessionStoreError,
    },
}

impl AuthFlowError {
    /// The underlying popup failure, for callers choosing a user-facing message
    #[must_use]
    pub fn popup_error(&self) -> Option<&PopupError> {
        match self {
            AuthFlowError::Popup { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Runs the "start flow → popup → store token" sequence for one provider
pub struct OAuthFlowInitiator {
    client: ApiClient,
    broker: PopupAuthBroker,
    provider: String,
    start_path: String,
    popup_options: PopupOptions,
}

impl OAuthFlowInitiator {
    /// Initiator for the LinkedIn flow with default popup options
    #[must_use]
    pub fn linkedin(client: ApiClient, broker: PopupAuthBroker) -> Self {
        Self {
            client,
            broker,
            provider: "LinkedIn".to_string(),
            start_path: LINKEDIN_START_PATH.to_string(),
            popup_options: PopupOptions::default().with_window_name("linkedin_oauth"),
        }
    }

    #[must_use]
    pub fn with_start_path(mut self, start_path: &str) -> Self {
        self.start_path = start_path.to_string();
        self
    }

    #[must_use]
    pub fn with_popup_options(mut self, popup_options: PopupOptions) -> Self {
        self.popup_options = popup_options;
        self
    }

    #[must_use]
    pub fn broker(&self) -> &PopupAuthBroker {
        &self.broker
    }

    /// Sign in with LinkedIn
    ///
    /// # Errors
    ///
    /// See [`OAuthFlowInitiator::start`]
    pub async fn sign_in_with_linkedin(&self) -> Result<AuthResult, AuthFlowError> {
        self.start(FlowKind::SignIn).await
    }

    /// Sign up with LinkedIn
    ///
    /// # Errors
    ///
    /// See [`OAuthFlowInitiator::start`]
    pub async fn sign_up_with_linkedin(&self) -> Result<AuthResult, AuthFlowError> {
        self.start(FlowKind::SignUp).await
    }

    /// Run the full flow
    ///
    /// On success the access token from the payload, when present, is written
    /// to the session token store. Nothing is written on failure. A payload
    /// without a token is returned as-is; deciding what to do with it is up to
    /// the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No API base is configured
    /// - The start request fails or returns a non-2xx status
    /// - The start response lacks `auth_url`
    /// - The popup is blocked, closed by the user, or times out
    /// - The token cannot be written to session storage
    pub async fn start(&self, kind: FlowKind) -> Result<AuthResult, AuthFlowError> {
        let authorization_url = self.request_authorization_url(kind).await?;

        let result = self
            .broker
            .run_popup_flow(&authorization_url, &self.popup_options)
            .await
            .map_err(|source| AuthFlowError::Popup {
                provider: self.provider.clone(),
                source,
            })?;

        let token = result.access_token();
        if let Some(token) = token {
            self.client
                .tokens()
                .set_token(Some(token))
                .map_err(|source| AuthFlowError::TokenStorage {
                    provider: self.provider.clone(),
                    source,
                })?;
        }
        LoggingHelper::log_flow_completed(&self.provider, token.is_some());

        Ok(result)
    }

    async fn request_authorization_url(&self, kind: FlowKind) -> Result<String, AuthFlowError> {
        if !self.client.is_configured() {
            return Err(AuthFlowError::NotConfigured);
        }
        LoggingHelper::log_flow_start(&self.provider, &kind.to_string(), &self.start_path);

        let body = self
            .client
            .post(&self.start_path, &json!({}), RequestOptions::default())
            .await
            .map_err(|source| {
                LoggingHelper::log_flow_start_failed(&self.provider, &source);
                AuthFlowError::FlowStart {
                    provider: self.provider.clone(),
                    source,
                }
            })?;
        LoggingHelper::log_flow_start_response(&self.provider, &body);

        match body.get("auth_url").and_then(Value::as_str) {
            Some(url) if !url.is_empty() => Ok(url.to_string()),
            _ => Err(AuthFlowError::MalformedResponse {
                provider: self.provider.clone(),
                body,
            }),
        }
    }
}

//! Google ID-token exchange
//!
//! Google runs its own popup; what reaches us is an ID token, which the backend
//! exchanges for a session. The ID token travels as the bearer credential of
//! that one request instead of the stored session token.

use serde_json::{json, Value};

use super::client::{ApiClient, ApiError, RequestOptions};

/// Backend endpoint that accepts Google ID tokens
pub const GOOGLE_AUTH_PATH: &str = "/auth/google";

/// Posts Google ID tokens to the backend
#[derive(Debug, Clone)]
pub struct IdTokenExchange {
    client: ApiClient,
    path: String,
}

impl IdTokenExchange {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self::with_path(client, GOOGLE_AUTH_PATH)
    }

    #[must_use]
    pub fn with_path(client: ApiClient, path: &str) -> Self {
        Self {
            client,
            path: path.to_string(),
        }
    }

    /// Exchange `id_token` for a backend session
    ///
    /// `body` is sent as the JSON request body; `None` sends `{}`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend answers non-2xx
    pub async fn exchange(&self, id_token: &str, body: Option<&Value>) -> Result<Value, ApiError> {
        let empty = json!({});
        self.client
            .post(
                &self.path,
                body.unwrap_or(&empty),
                RequestOptions::default().with_token(id_token),
            )
            .await
    }

    /// Sign in with a Google ID token
    ///
    /// # Errors
    ///
    /// See [`IdTokenExchange::exchange`]
    pub async fn sign_in_with_google(
        &self,
        id_token: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.exchange(id_token, body).await
    }

    /// Sign up with a Google ID token
    ///
    /// # Errors
    ///
    /// See [`IdTokenExchange::exchange`]
    pub async fn sign_up_with_google(
        &self,
        id_token: &str,
        body: Option<&Value>,
    ) -> Result<Value, ApiError> {
        self.exchange(id_token, body).await
    }
}

//! Token-caching authentication client.
//!
//! Holds the credentials and the current `AuthState`. A token is reused
//! until a caller reports that the server rejected it (`invalidate`), and
//! the next `ensure_valid_token` logs in again.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{ApiClient, AuthError};

use super::{AuthState, Credentials, Token};

pub struct AuthClient {
    api: ApiClient,
    credentials: Credentials,
    state: AuthState,
}

impl AuthClient {
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, AuthError> {
        let api = ApiClient::new(credentials.host(), timeout)
            .map_err(|e| AuthError::CannotConnect(e.to_string()))?;
        Ok(Self::with_api(api, credentials))
    }

    /// Build on an existing `ApiClient`, sharing its connection pool.
    pub fn with_api(api: ApiClient, credentials: Credentials) -> Self {
        Self {
            api: api.with_base_url(credentials.host()),
            credentials,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// The cached token, if any.
    pub fn token(&self) -> Option<&Token> {
        self.state.token()
    }

    /// Log in with the configured credentials, replacing any cached token.
    pub async fn authenticate(&mut self) -> Result<Token, AuthError> {
        debug!(
            host = %self.credentials.host(),
            username = %self.credentials.username(),
            "Authenticating"
        );

        let result = self
            .api
            .login(self.credentials.username(), self.credentials.password())
            .await;

        match result {
            Ok(value) => {
                let token = Token::new(value);
                info!(host = %self.credentials.host(), "Authenticated with Sinum controller");
                self.state = AuthState::Authenticated(token.clone());
                Ok(token)
            }
            Err(err) if err.is_authorization_failure() => {
                warn!(
                    host = %self.credentials.host(),
                    username = %self.credentials.username(),
                    error = %err,
                    "Credentials rejected"
                );
                self.state = AuthState::AuthFailed;
                Err(err.into())
            }
            Err(err) => {
                warn!(host = %self.credentials.host(), error = %err, "Authentication failed");
                self.state = AuthState::Unauthenticated;
                Err(err.into())
            }
        }
    }

    /// Return the cached token, logging in first if there is none.
    ///
    /// Fails with `invalid_auth` without contacting the server once the
    /// credentials have been rejected.
    pub async fn ensure_valid_token(&mut self) -> Result<Token, AuthError> {
        match &self.state {
            AuthState::Authenticated(token) => Ok(token.clone()),
            AuthState::AuthFailed => Err(AuthError::InvalidAuth(
                "credentials were rejected; reconfigure to retry".to_string(),
            )),
            AuthState::Unauthenticated => self.authenticate().await,
        }
    }

    /// Forget the cached token after the server refused it.
    pub fn invalidate(&mut self) {
        if let AuthState::Authenticated(token) = &self.state {
            debug!(
                token_age_secs = token.age().num_seconds(),
                "Token rejected by server, dropping it"
            );
            self.state = AuthState::Unauthenticated;
        }
    }

    /// Swap in new credentials and start over unauthenticated.
    pub fn reconfigure(&mut self, credentials: Credentials) {
        info!(
            host = %credentials.host(),
            username = %credentials.username(),
            "Credentials reconfigured"
        );
        self.api = self.api.with_base_url(credentials.host());
        self.credentials = credentials;
        self.state = AuthState::Unauthenticated;
    }
}

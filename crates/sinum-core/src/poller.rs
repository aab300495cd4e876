//! Authenticated room polling.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::FetchError;
use crate::auth::{AuthClient, Credentials};
use crate::models::Room;

/// Fetches the room list, re-authenticating once when the token is refused.
pub struct RoomPoller {
    auth: AuthClient,
}

impl RoomPoller {
    pub fn new(auth: AuthClient) -> Self {
        Self { auth }
    }

    /// Convenience constructor building its own `AuthClient`.
    pub fn connect(credentials: Credentials, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self::new(AuthClient::new(credentials, timeout)?))
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut AuthClient {
        &mut self.auth
    }

    /// Fetch and normalize the current room list.
    ///
    /// An authorization failure drops the token and retries exactly once
    /// with a fresh login. A second refusal is reported as `invalid_auth`.
    pub async fn fetch_rooms(&mut self) -> Result<Vec<Room>, FetchError> {
        let mut reauthenticated = false;

        loop {
            let token = self.auth.ensure_valid_token().await?;

            let result = self.auth.api().get_rooms(token.value()).await;
            match result {
                Ok(rooms) => {
                    debug!(count = rooms.len(), "Fetched rooms");
                    return Ok(rooms);
                }
                Err(err) if err.is_authorization_failure() => {
                    self.auth.invalidate();
                    if reauthenticated {
                        warn!(error = %err, "Token refused again after re-authentication");
                        return Err(FetchError::InvalidAuth(err.to_string()));
                    }
                    info!("Token refused, re-authenticating");
                    reauthenticated = true;
                }
                Err(err) => {
                    warn!(error = %err, "Failed to fetch rooms");
                    return Err(err.into());
                }
            }
        }
    }

    /// Log in from scratch and fetch the rooms once.
    pub async fn test_connection(&mut self) -> Result<Vec<Room>, FetchError> {
        self.auth.authenticate().await?;
        self.fetch_rooms().await
    }
}

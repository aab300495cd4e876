//! API client for communicating with the Sinum controller REST API.
//!
//! This module provides the `ApiClient` struct for the login call and the
//! authenticated room list request. It knows nothing about token caching;
//! that lives in `auth::AuthClient`.

use std::time::Duration;

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{parse_rooms, Room};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Login endpoint, relative to the configured host
const LOGIN_PATH: &str = "/api/v1/login";

/// Room list endpoint, relative to the configured host
const ROOMS_PATH: &str = "/api/v1/rooms";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

impl LoginResponse {
    fn into_token(self) -> Option<String> {
        self.token
            .filter(|t| !t.is_empty())
            .or_else(|| self.access_token.filter(|t| !t.is_empty()))
    }
}

/// Reject tokens that could not be sent back as an `Authorization` header.
fn check_token(token: &str) -> Result<(), ApiError> {
    header::HeaderValue::from_str(&format!("Bearer {}", token))
        .map(|_| ())
        .map_err(|_| {
            ApiError::InvalidResponse("Login token is not a valid header value".to_string())
        })
}

/// API client for one Sinum controller.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for `base_url` (scheme, host and optional port).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a new ApiClient pointing at another host, sharing the connection pool.
    pub fn with_base_url(&self, base_url: &str) -> Self {
        Self {
            client: self.client.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Log in and return the bearer token from the response.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let url = self.url(LOGIN_PATH);

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let body = response.text().await?;

        let login: LoginResponse = serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse login response: {}", e))
        })?;

        let token = login
            .into_token()
            .ok_or_else(|| ApiError::InvalidResponse("No token received from login".to_string()))?;
        check_token(&token)?;
        Ok(token)
    }

    /// Fetch the room list using `token` as bearer credential.
    pub async fn get_rooms(&self, token: &str) -> Result<Vec<Room>, ApiError> {
        let url = self.url(ROOMS_PATH);

        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let body = response.text().await?;
        debug!(bytes = body.len(), "Rooms response received");

        parse_rooms(&body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse rooms response: {}", e))
        })
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }
}

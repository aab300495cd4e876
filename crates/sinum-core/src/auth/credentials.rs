use std::fmt;

use anyhow::{Context, Result};
use keyring::Entry;
use reqwest::Url;
use thiserror::Error;

const SERVICE_NAME: &str = "sinum";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("Invalid host URL '{0}': expected scheme://host[:port], e.g. http://192.168.1.50")]
    InvalidHost(String),

    #[error("Username must not be empty")]
    MissingUsername,
}

/// Host, username and password for one controller.
///
/// Immutable once built; replace the whole value to reconfigure.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    host: String,
    username: String,
    password: String,
}

impl Credentials {
    /// Validate and build credentials.
    ///
    /// The host must carry its own `http` or `https` scheme. The port is
    /// optional and defaults to the scheme's.
    pub fn new(
        host: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        let trimmed = host.trim().trim_end_matches('/');
        let url = Url::parse(trimmed).map_err(|_| CredentialsError::InvalidHost(host.to_string()))?;
        let scheme_ok = matches!(url.scheme(), "http" | "https");
        if !scheme_ok || url.host_str().is_none() {
            return Err(CredentialsError::InvalidHost(host.to_string()));
        }

        let username = username.into();
        if username.trim().is_empty() {
            return Err(CredentialsError::MissingUsername);
        }

        Ok(Self {
            host: trimmed.to_string(),
            username,
            password: password.into(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Passwords kept in the OS keychain.
///
/// Entries are keyed by `username@host`, so the same account name on two
/// controllers gets two entries.
pub struct CredentialStore;

impl CredentialStore {
    fn entry(host: &str, username: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &account_key(host, username))
            .context("Failed to create keyring entry")
    }

    /// Store the password for `username` on `host`
    pub fn store(host: &str, username: &str, password: &str) -> Result<()> {
        Self::entry(host, username)?
            .set_password(password)
            .with_context(|| format!("Failed to store password for {} in keychain", host))
    }

    pub fn get_password(host: &str, username: &str) -> Result<String> {
        Self::entry(host, username)?
            .get_password()
            .with_context(|| format!("No password in keychain for {} on {}", username, host))
    }

    /// Delete the stored password; a missing entry is not an error.
    pub fn delete(host: &str, username: &str) -> Result<()> {
        match Self::entry(host, username)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err).context("Failed to delete credential from keychain"),
        }
    }
}

/// Keychain account name: username plus the host without scheme or
/// trailing slash, e.g. `admin@192.168.1.50:8080`.
fn account_key(host: &str, username: &str) -> String {
    let host = host.trim().trim_end_matches('/').to_ascii_lowercase();
    let host = host
        .strip_prefix("http://")
        .or_else(|| host.strip_prefix("https://"))
        .unwrap_or(&host);
    format!("{}@{}", username, host)
}

//! Authentication module for credentials and bearer token handling.
//!
//! This module provides:
//! - `Credentials`: validated host/username/password for one controller
//! - `CredentialStore`: OS-level password storage via keyring
//! - `Token`, `AuthState`: the cached token and its state machine
//! - `AuthClient`: login with lazy re-authentication
//!
//! Tokens carry no expiry; they are dropped when the server rejects them.

pub mod client;
pub mod credentials;
pub mod session;

pub use client::AuthClient;
pub use credentials::{CredentialStore, Credentials, CredentialsError};
pub use session::{AuthState, Token};

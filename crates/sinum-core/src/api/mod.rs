//! REST API client module for the Sinum controller.
//!
//! This module provides the `ApiClient` for the two endpoints the room
//! client needs: login and the room list. The controller uses bearer token
//! authentication; the token comes from the login endpoint.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{ApiError, AuthError, FetchError};

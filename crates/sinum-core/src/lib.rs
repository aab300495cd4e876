//! Client library for the Sinum building controller.
//!
//! Logs in against the controller's HTTP API, keeps a bearer token, polls
//! the room list and normalizes it into `Room` records with temperature,
//! humidity and heating/cooling circuit status.
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use std::time::Duration;
//! use sinum_core::{Credentials, RoomPoller};
//!
//! let credentials = Credentials::new("http://192.168.1.50", "admin", "secret")?;
//! let mut poller = RoomPoller::connect(credentials, Duration::from_secs(10))?;
//! for room in poller.fetch_rooms().await? {
//!     println!("{}: {:?}", room.name, room.temperature);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod coordinator;
pub mod models;
pub mod poller;

pub use api::{ApiClient, ApiError, AuthError, FetchError};
pub use auth::{AuthClient, AuthState, CredentialStore, Credentials, CredentialsError, Token};
pub use config::Config;
pub use coordinator::{RoomSnapshot, UpdateCoordinator};
pub use models::{Entity, EntityKind, EntityValue, Room, RoomId};
pub use poller::RoomPoller;

//! Client library for the Tonal fitness API.
//!
//! Sign in with [`TonalClient::login`] and call one method per endpoint.
//! The session refreshes its credential on demand, with at most one
//! renewal in flight, and transient failures are retried with backoff.

pub mod api;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod models;

pub use api::{ClientError, TonalClient};
pub use auth::{AuthSessionManager, CredentialStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, Config};

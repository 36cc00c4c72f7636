//! REST API client for the Tonal backend.
//!
//! This module provides the `TonalClient` facade and the layers under it:
//! - `RequestExecutor`: authenticated calls with bounded retries
//! - `RetryPolicy`: exponential backoff schedule
//! - `ClientError`: the error taxonomy shared with the auth layer
//!
//! All data endpoints expect the identity token as the bearer credential.

pub mod client;
pub mod error;
pub mod executor;
pub mod retry;

pub use client::TonalClient;
pub use error::{AuthStage, ClientError};
pub use executor::{RequestExecutor, RequestOptions};
pub use retry::{AttemptOutcome, RetryPolicy};

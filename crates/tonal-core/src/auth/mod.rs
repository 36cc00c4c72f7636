//! Authentication and session management.
//!
//! This module provides:
//! - `Credential` / `TokenStore`: the current bearer credential and its expiry
//! - `AuthSessionManager`: login, expiry checks and single-flight renewal
//! - `CredentialStore`: OS keychain storage for a saved password
//!
//! Credentials are held in memory only and are considered expired 60
//! seconds before the provider's stated expiry.

pub mod credentials;
pub mod oauth;
pub mod session;
pub mod token;

pub use credentials::CredentialStore;
pub use oauth::TokenResponse;
pub use session::AuthSessionManager;
pub use token::{Credential, TokenStore};

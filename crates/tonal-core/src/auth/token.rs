use std::fmt;

use chrono::{DateTime, Duration, Utc};

use super::oauth::TokenResponse;
use crate::api::error::{ClientError, Result};

/// A bearer credential issued by the identity provider.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// The value sent as `Authorization: Bearer ...` on API calls.
    pub id_token: String,
    pub access_token: String,
    /// Present when the provider granted `offline_access`.
    pub renewal_token: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Fails when `expires_in` cannot be represented as an instant.
    pub fn from_token_response(response: TokenResponse, now: DateTime<Utc>) -> Result<Self> {
        let expires_at = i64::try_from(response.expires_in)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                ClientError::Unknown(
                    "Invalid token response: expires_in out of range".to_string(),
                )
            })?;
        Ok(Self {
            id_token: response.id_token,
            access_token: response.access_token,
            renewal_token: response.refresh_token.filter(|t| !t.is_empty()),
            issued_at: now,
            expires_at,
        })
    }

    /// Usable only while `now < expires_at - skew`.
    pub fn is_valid_at(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        !self.id_token.is_empty() && now < self.expires_at - skew
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id_token", &"[redacted]")
            .field("access_token", &"[redacted]")
            .field(
                "renewal_token",
                &self.renewal_token.as_ref().map(|_| "[redacted]"),
            )
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Holds the live credential for one session.
#[derive(Debug, Clone)]
pub struct TokenStore {
    credential: Option<Credential>,
    skew: Duration,
}

impl TokenStore {
    pub fn new(skew: Duration) -> Self {
        Self {
            credential: None,
            skew,
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.credential
            .as_ref()
            .map(|c| c.is_valid_at(now, self.skew))
            .unwrap_or(false)
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// The credential, only if it is still usable at `now`.
    pub fn valid_credential(&self, now: DateTime<Utc>) -> Option<&Credential> {
        self.credential
            .as_ref()
            .filter(|c| c.is_valid_at(now, self.skew))
    }

    pub fn bearer(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.id_token.as_str())
    }

    pub fn renewal_token(&self) -> Option<&str> {
        self.credential
            .as_ref()
            .and_then(|c| c.renewal_token.as_deref())
    }

    /// Install a freshly issued credential. The previous renewal token is
    /// discarded along with the old credential.
    pub fn replace(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    /// Forget the renewal token, keeping the credential until it expires.
    pub fn revoke_renewal(&mut self) {
        if let Some(credential) = self.credential.as_mut() {
            credential.renewal_token = None;
        }
    }

    /// Time left before the credential stops being usable (negative once past).
    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.credential
            .as_ref()
            .map(|c| (c.expires_at - self.skew) - now)
    }
}

//! Session manager: login, expiry tracking, and single-flight renewal.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use reqwest::Client;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::oauth;
use super::token::{Credential, TokenStore};
use crate::api::error::{ClientError, Result};
use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;

/// Extra time a waiter allows beyond the refresher's own request timeout.
const REFRESH_WAIT_GRACE: Duration = Duration::from_secs(1);

type RefreshOutcome = Option<Result<Credential>>;

struct SessionState {
    store: TokenStore,
    /// Subscribed to by callers that arrive while a refresh is running.
    in_flight: Option<watch::Receiver<RefreshOutcome>>,
}

enum Role {
    Wait(watch::Receiver<RefreshOutcome>),
    Lead(watch::Sender<RefreshOutcome>, String),
}

/// Clears the in-flight marker however the refresher exits, including
/// when its future is dropped mid-request.
struct InFlightGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = None;
    }
}

/// Owns one user's credential and hands out usable bearer tokens.
///
/// At most one renewal request is in flight at a time. Callers that find
/// the credential stale while a renewal is running wait for its outcome
/// instead of issuing their own, because the provider rotates the renewal
/// token on every use.
pub struct AuthSessionManager {
    config: Arc<ClientConfig>,
    http: Client,
    clock: Arc<dyn Clock>,
    state: Mutex<SessionState>,
}

impl AuthSessionManager {
    pub fn new(config: Arc<ClientConfig>, http: Client) -> Self {
        Self::with_clock(config, http, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Arc<ClientConfig>, http: Client, clock: Arc<dyn Clock>) -> Self {
        let store = TokenStore::new(config.expiry_skew);
        Self {
            config,
            http,
            clock,
            state: Mutex::new(SessionState {
                store,
                in_flight: None,
            }),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Perform the password grant and store the resulting credential.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Credential> {
        debug!("Authenticating with password grant");

        let response = oauth::password_grant(&self.http, &self.config, username, password).await?;
        let credential = Credential::from_token_response(response, self.clock.now())?;

        if credential.renewal_token.is_none() {
            warn!("No renewal token issued; session will end when the credential expires");
        }
        info!(expires_at = %credential.expires_at, "Authenticated");

        self.lock_state().store.replace(credential.clone());
        Ok(credential)
    }

    /// Bearer value for the next API call, renewing it first if needed.
    pub async fn get_valid_token(&self) -> Result<String> {
        self.obtain(false).await.map(|c| c.id_token)
    }

    pub async fn get_valid_credential(&self) -> Result<Credential> {
        self.obtain(false).await
    }

    /// Renew even if the current credential still looks usable.
    pub async fn force_refresh(&self) -> Result<Credential> {
        self.obtain(true).await
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock_state().store.credential().is_some()
    }

    pub fn is_token_valid(&self) -> bool {
        self.lock_state().store.is_valid(self.clock.now())
    }

    pub fn has_renewal_token(&self) -> bool {
        self.lock_state().store.renewal_token().is_some()
    }

    /// Snapshot of the stored credential, valid or not.
    pub fn credential(&self) -> Option<Credential> {
        self.lock_state().store.credential().cloned()
    }

    async fn obtain(&self, force: bool) -> Result<Credential> {
        let mut force = force;
        loop {
            let role = {
                let mut state = self.lock_state();
                if !force {
                    if let Some(credential) = state.store.valid_credential(self.clock.now()) {
                        return Ok(credential.clone());
                    }
                }

                if let Some(rx) = state.in_flight.clone() {
                    Role::Wait(rx)
                } else if let Some(renewal) = state.store.renewal_token().map(str::to_string) {
                    let (tx, rx) = watch::channel(None);
                    state.in_flight = Some(rx);
                    Role::Lead(tx, renewal)
                } else {
                    return Err(ClientError::session_expired());
                }
            };

            match role {
                Role::Lead(tx, renewal) => return self.lead_refresh(tx, &renewal).await,
                Role::Wait(rx) => match self.wait_for_refresh(rx).await? {
                    Some(outcome) => return self.check_outcome(outcome),
                    None => {
                        // Refresher was cancelled before finishing; try again.
                        debug!("In-flight refresh abandoned, re-checking session");
                        force = false;
                    }
                },
            }
        }
    }

    async fn lead_refresh(
        &self,
        tx: watch::Sender<RefreshOutcome>,
        renewal: &str,
    ) -> Result<Credential> {
        let guard = InFlightGuard { state: &self.state };
        debug!("Refreshing session credential");

        let refreshed = oauth::refresh_grant(&self.http, &self.config, renewal)
            .await
            .and_then(|response| Credential::from_token_response(response, self.clock.now()));
        let outcome = match refreshed {
            Ok(credential) => {
                self.lock_state().store.replace(credential.clone());
                info!(expires_at = %credential.expires_at, "Session credential refreshed");
                Ok(credential)
            }
            Err(err) => {
                if matches!(err, ClientError::Authentication { status, .. } if status < 500) {
                    // A rejected renewal token will never work again.
                    warn!(error = %err, "Renewal token rejected; re-authentication required");
                    self.lock_state().store.revoke_renewal();
                } else {
                    warn!(error = %err, "Session refresh failed");
                }
                Err(err)
            }
        };

        drop(guard);
        tx.send_replace(Some(outcome.clone()));
        self.check_outcome(outcome)
    }

    /// Returns `None` when the refresher went away without an outcome.
    async fn wait_for_refresh(
        &self,
        mut rx: watch::Receiver<RefreshOutcome>,
    ) -> Result<Option<Result<Credential>>> {
        debug!("Waiting for in-flight session refresh");
        let cap = self.config.request_timeout + REFRESH_WAIT_GRACE;

        match tokio::time::timeout(cap, rx.wait_for(Option::is_some)).await {
            Err(_) => {
                warn!(waited_secs = cap.as_secs(), "Timed out waiting for session refresh");
                Err(ClientError::Timeout(cap))
            }
            Ok(Err(_closed)) => Ok(None),
            Ok(Ok(value)) => Ok(value.clone()),
        }
    }

    /// A refreshed credential must still be usable by the time it is handed out.
    fn check_outcome(&self, outcome: Result<Credential>) -> Result<Credential> {
        let credential = outcome?;
        if credential.is_valid_at(self.clock.now(), self.config.expiry_skew) {
            Ok(credential)
        } else {
            Err(ClientError::session_expired())
        }
    }
}

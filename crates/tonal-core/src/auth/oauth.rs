//! Identity provider token exchanges.
//!
//! Both the initial password grant and the renewal grant POST JSON to the
//! same token endpoint. The response carries an `id_token`, which is the
//! bearer value the data API expects (not `access_token`).

use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::error::{AuthStage, ClientError, Result};
use crate::config::ClientConfig;

/// Scope requesting a renewal token alongside the credential.
const OFFLINE_ACCESS_SCOPE: &str = "offline_access";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: String,
    pub id_token: String,
    /// Absent for clients not granted `offline_access`.
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Seconds until the credential expires (delta, not absolute)
    pub expires_in: u64,
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    username: &'a str,
    password: &'a str,
    client_id: &'a str,
    grant_type: &'static str,
    scope: &'static str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    client_id: &'a str,
    grant_type: &'static str,
    refresh_token: &'a str,
}

/// Exchange a username and password for a credential.
pub async fn password_grant(
    http: &Client,
    config: &ClientConfig,
    username: &str,
    password: &str,
) -> Result<TokenResponse> {
    let body = PasswordGrant {
        username,
        password,
        client_id: &config.client_id,
        grant_type: "password",
        scope: OFFLINE_ACCESS_SCOPE,
    };
    exchange(http, config, AuthStage::Login, &body).await
}

/// Exchange a renewal token for a new credential. The provider rotates the
/// renewal token on every call, so `refresh_token` is single use.
pub async fn refresh_grant(
    http: &Client,
    config: &ClientConfig,
    refresh_token: &str,
) -> Result<TokenResponse> {
    let body = RefreshGrant {
        client_id: &config.client_id,
        grant_type: "refresh_token",
        refresh_token,
    };
    exchange(http, config, AuthStage::Refresh, &body).await
}

async fn exchange<B: Serialize>(
    http: &Client,
    config: &ClientConfig,
    stage: AuthStage,
    body: &B,
) -> Result<TokenResponse> {
    debug!(stage = %stage, url = %config.auth_url, "Sending token request");

    let response = http
        .post(&config.auth_url)
        .header(header::CONTENT_TYPE, "application/json")
        .timeout(config.request_timeout)
        .json(body)
        .send()
        .await
        .map_err(|e| ClientError::from_transport(&e, config.request_timeout))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let err = ClientError::from_auth_status(stage, status.as_u16(), &text);
        warn!(stage = %stage, status = status.as_u16(), error = %err, "Token request rejected");
        return Err(err);
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| ClientError::Unknown(format!("Invalid token response: {}", e)))
}

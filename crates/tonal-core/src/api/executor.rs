//! Authenticated request execution with bounded retries.
//!
//! Each logical call runs up to `max_attempts` single attempts. A 401/403
//! on the first attempt re-checks the session and retries immediately;
//! server errors and transport failures back off exponentially; any other
//! client error is returned at once.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::error::{ClientError, Result};
use super::retry::{AttemptOutcome, RetryPolicy};
use crate::auth::AuthSessionManager;
use crate::config::ClientConfig;

/// Per-call extras layered over the default headers.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub json_body: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json_body = Some(body);
        self
    }
}

pub struct RequestExecutor {
    http: Client,
    session: Arc<AuthSessionManager>,
    base_url: String,
    timeout: Duration,
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(config: &ClientConfig, http: Client, session: Arc<AuthSessionManager>) -> Self {
        Self {
            http,
            session,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout,
            policy: RetryPolicy::from_config(config),
        }
    }

    pub fn session(&self) -> &Arc<AuthSessionManager> {
        &self.session
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Call `endpoint` and decode the JSON response into `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<T> {
        let body = self
            .request(method, endpoint, options, true)
            .await?
            .unwrap_or(Value::Null);
        serde_json::from_value(body).map_err(|e| {
            ClientError::Unknown(format!("Failed to parse response from {}: {}", endpoint, e))
        })
    }

    /// Call `endpoint` without reading the response body.
    pub async fn request_empty(
        &self,
        method: Method,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<()> {
        self.request(method, endpoint, options, false).await.map(|_| ())
    }

    /// Run one logical call. Returns `None` when `expects_body` is false.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        options: &RequestOptions,
        expects_body: bool,
    ) -> Result<Option<Value>> {
        let url = self.url(endpoint);
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 1;

        loop {
            debug!(method = %method, url = %url, attempt, max_attempts, "Executing request attempt");

            let outcome =
                AttemptOutcome::classify(self.attempt(&method, &url, options, expects_body).await);
            let (err, retryable) = match outcome {
                AttemptOutcome::Ok(body) => return Ok(body),
                AttemptOutcome::Retryable(err) => (err, true),
                AttemptOutcome::Fatal(err) => (err, false),
            };

            if attempt == 1 && attempt < max_attempts && err.is_auth_failure() {
                match self.session.get_valid_token().await {
                    Ok(_) => {
                        warn!(status = ?err.status(), url = %url, "Credential rejected, retrying with current session");
                        attempt += 1;
                        continue;
                    }
                    Err(refresh_err) => {
                        warn!(error = %refresh_err, "Session check after auth failure failed");
                    }
                }
            }

            if !retryable || attempt >= max_attempts {
                error!(
                    method = %method,
                    url = %url,
                    status = ?err.status(),
                    attempts = attempt,
                    error = %err,
                    "Request failed"
                );
                return Err(err);
            }

            let delay = self.policy.delay_for(attempt);
            warn!(
                url = %url,
                error = %err,
                delay_ms = delay.as_millis() as u64,
                attempt,
                max_attempts,
                "Request failed, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
        expects_body: bool,
    ) -> Result<Option<Value>> {
        let token = self.session.get_valid_token().await?;
        let headers = build_headers(&token, &options.headers)?;

        let mut request = self
            .http
            .request(method.clone(), url)
            .headers(headers)
            .timeout(self.timeout);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(ref body) = options.json_body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::from_transport(&e, self.timeout))?;

        let status = response.status();
        debug!(status = %status, url = %url, "Received HTTP response");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status.as_u16(), &text));
        }

        if !expects_body {
            return Ok(None);
        }

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::from_transport(&e, self.timeout))?;
        if text.trim().is_empty() {
            return Ok(Some(Value::Null));
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ClientError::Unknown(format!("Invalid JSON in response from {}: {}", url, e)))
    }
}

/// Default JSON headers, then caller headers, then the bearer credential.
/// Callers may override anything except `Authorization`.
fn build_headers(token: &str, extra: &[(String, String)]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ClientError::InvalidInput(format!("Invalid header name: {}", name)))?;
        if name == header::AUTHORIZATION {
            debug!("Ignoring caller-supplied Authorization header");
            continue;
        }
        let value = HeaderValue::from_str(value)
            .map_err(|_| ClientError::InvalidInput(format!("Invalid value for header {}", name)))?;
        headers.insert(name, value);
    }

    let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| ClientError::Session("credential is not a valid header value".to_string()))?;
    headers.insert(header::AUTHORIZATION, bearer);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Utc;
    use mockito::Matcher;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Message {
        message: String,
    }

    fn test_config(server: &mockito::ServerGuard) -> ClientConfig {
        ClientConfig {
            auth_url: format!("{}/oauth/token", server.url()),
            api_base_url: format!("{}/v6", server.url()),
            request_timeout: Duration::from_secs(5),
            initial_backoff: Duration::from_millis(10),
            ..ClientConfig::default()
        }
    }

    async fn logged_in_executor(
        server: &mut mockito::ServerGuard,
        config: ClientConfig,
    ) -> RequestExecutor {
        logged_in_executor_at(server, config, Arc::new(ManualClock::new(Utc::now()))).await
    }

    async fn logged_in_executor_at(
        server: &mut mockito::ServerGuard,
        config: ClientConfig,
        clock: Arc<ManualClock>,
    ) -> RequestExecutor {
        server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::PartialJson(json!({"grant_type": "password"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "access_token": "access-1",
                    "id_token": "id-1",
                    "refresh_token": "rt-1",
                    "scope": "offline_access",
                    "token_type": "Bearer",
                    "expires_in": 3600
                })
                .to_string(),
            )
            .create_async()
            .await;

        let config = Arc::new(config);
        let http = Client::new();
        let session = Arc::new(AuthSessionManager::with_clock(
            config.clone(),
            http.clone(),
            clock,
        ));
        session
            .authenticate("lifter@example.com", "hunter2")
            .await
            .expect("login succeeds");
        RequestExecutor::new(&config, http, session)
    }

    #[tokio::test]
    async fn test_request_sends_bearer_and_json_headers() {
        let mut server = mockito::Server::new_async().await;
        let config = test_config(&server);
        let executor = logged_in_executor(&mut server, config).await;

        let mock = server
            .mock("GET", "/v6/test")
            .match_header("authorization", "Bearer id-1")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_body(r#"{"message":"success"}"#)
            .expect(1)
            .create_async()
            .await;

        let result: Message = executor
            .request_json(Method::GET, "/test", &RequestOptions::new())
            .await
            .expect("request succeeds");
        assert_eq!(result.message, "success");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_caller_headers_cannot_replace_authorization() {
        let mut server = mockito::Server::new_async().await;
        let config = test_config(&server);
        let executor = logged_in_executor(&mut server, config).await;

        let mock = server
            .mock("GET", "/v6/user-workouts")
            .match_header("authorization", "Bearer id-1")
            .match_header("x-paginate-offset", "20")
            .match_header("accept", "*/*")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let options = RequestOptions::new()
            .header("Authorization", "Bearer stolen")
            .header("x-paginate-offset", "20")
            .header("Accept", "*/*");
        let workouts: Vec<Value> = executor
            .request_json(Method::GET, "/user-workouts", &options)
            .await
            .expect("request succeeds");
        assert!(workouts.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_first_attempt_retries_once() {
        let mut server = mockito::Server::new_async().await;
        let config = test_config(&server);
        let executor = logged_in_executor(&mut server, config).await;

        let rejected = server
            .mock("GET", "/v6/protected")
            .with_status(401)
            .with_body(r#"{"error":"Unauthorized"}"#)
            .expect(1)
            .create_async()
            .await;
        let accepted = server
            .mock("GET", "/v6/protected")
            .with_status(200)
            .with_body(r#"{"message":"success after retry"}"#)
            .expect(1)
            .create_async()
            .await;

        let result: Message = executor
            .request_json(Method::GET, "/protected", &RequestOptions::new())
            .await
            .expect("retry succeeds");
        assert_eq!(result.message, "success after retry");
        rejected.assert_async().await;
        accepted.assert_async().await;
    }

    #[tokio::test]
    async fn test_unauthorized_after_expiry_refreshes_before_retry() {
        let mut server = mockito::Server::new_async().await;
        let config = test_config(&server);
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let executor = logged_in_executor_at(&mut server, config, clock.clone()).await;

        let refresh = server
            .mock("POST", "/oauth/token")
            .match_body(Matcher::PartialJson(json!({
                "grant_type": "refresh_token",
                "refresh_token": "rt-1"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "access_token": "access-2",
                    "id_token": "id-2",
                    "scope": "offline_access",
                    "token_type": "Bearer",
                    "expires_in": 3600
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        // The credential lapses while the first attempt is in flight.
        let expiring = clock.clone();
        let rejected = server
            .mock("GET", "/v6/protected")
            .match_header("authorization", "Bearer id-1")
            .with_status(401)
            .with_body_from_request(move |_| {
                expiring.advance(chrono::Duration::hours(1));
                br#"{"error":"Unauthorized"}"#.to_vec()
            })
            .expect(1)
            .create_async()
            .await;
        let accepted = server
            .mock("GET", "/v6/protected")
            .match_header("authorization", "Bearer id-2")
            .with_status(200)
            .with_body(r#"{"message":"fresh token"}"#)
            .expect(1)
            .create_async()
            .await;

        let result: Message = executor
            .request_json(Method::GET, "/protected", &RequestOptions::new())
            .await
            .expect("retry with refreshed token succeeds");
        assert_eq!(result.message, "fresh token");
        refresh.assert_async().await;
        rejected.assert_async().await;
        accepted.assert_async().await;
    }

    #[tokio::test]
    async fn test_persistent_forbidden_gets_single_auth_retry() {
        let mut server = mockito::Server::new_async().await;
        let config = test_config(&server);
        let executor = logged_in_executor(&mut server, config).await;

        let mock = server
            .mock("GET", "/v6/programs/locked")
            .with_status(403)
            .with_body(r#"{"error":"forbidden"}"#)
            .expect(2)
            .create_async()
            .await;

        let err = executor
            .request_json::<Value>(Method::GET, "/programs/locked", &RequestOptions::new())
            .await
            .expect_err("still forbidden");
        assert_eq!(err.status(), Some(403));
        assert_eq!(err.to_string(), "API request failed (403): forbidden");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_exhausts_attempts() {
        let mut server = mockito::Server::new_async().await;
        let config = test_config(&server);
        let executor = logged_in_executor(&mut server, config).await;

        let mock = server
            .mock("GET", "/v6/goals")
            .with_status(500)
            .with_body(r#"{"error":"boom"}"#)
            .expect(3)
            .create_async()
            .await;

        let err = executor
            .request_json::<Value>(Method::GET, "/goals", &RequestOptions::new())
            .await
            .expect_err("server keeps failing");
        assert_eq!(err.status(), Some(500));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_default_backoff_doubles_between_attempts() {
        let mut server = mockito::Server::new_async().await;
        let config = ClientConfig {
            initial_backoff: ClientConfig::default().initial_backoff,
            ..test_config(&server)
        };
        let executor = logged_in_executor(&mut server, config).await;

        let mock = server
            .mock("GET", "/v6/goals")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        // Real time: reqwest's own timeout timer would fire under a paused clock.
        let started = tokio::time::Instant::now();
        let err = executor
            .request_json::<Value>(Method::GET, "/goals", &RequestOptions::new())
            .await
            .expect_err("server keeps failing");
        let elapsed = started.elapsed();

        assert_eq!(err.status(), Some(500));
        // 1s after attempt 1, 2s after attempt 2, no sleep after the last.
        assert!(elapsed >= Duration::from_secs(3), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_secs(4), "waited {elapsed:?}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_then_success() {
        let mut server = mockito::Server::new_async().await;
        let config = test_config(&server);
        let executor = logged_in_executor(&mut server, config).await;

        let failing = server
            .mock("GET", "/v6/movements")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/v6/movements")
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let movements: Vec<Value> = executor
            .request_json(Method::GET, "/movements", &RequestOptions::new())
            .await
            .expect("second attempt succeeds");
        assert!(movements.is_empty());
        failing.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let config = test_config(&server);
        let executor = logged_in_executor(&mut server, config).await;

        let mock = server
            .mock("GET", "/v6/workouts/missing")
            .with_status(404)
            .with_body("Not Found")
            .expect(1)
            .create_async()
            .await;

        let err = executor
            .request_json::<Value>(Method::GET, "/workouts/missing", &RequestOptions::new())
            .await
            .expect_err("not found");
        match err {
            ClientError::Http { status, message, .. } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_request_ignores_response_body() {
        let mut server = mockito::Server::new_async().await;
        let config = test_config(&server);
        let executor = logged_in_executor(&mut server, config).await;

        let mock = server
            .mock("DELETE", "/v6/user-workouts/abc")
            .with_status(200)
            .with_body("this is not json")
            .expect(1)
            .create_async()
            .await;

        executor
            .request_empty(Method::DELETE, "/user-workouts/abc", &RequestOptions::new())
            .await
            .expect("delete succeeds");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_and_json_body_are_sent() {
        let mut server = mockito::Server::new_async().await;
        let config = test_config(&server);
        let executor = logged_in_executor(&mut server, config).await;

        let mock = server
            .mock("POST", "/v6/user-workouts/estimate")
            .match_query(Matcher::UrlEncoded("dryRun".into(), "true".into()))
            .match_body(Matcher::Json(json!({"sets": [{"movementId": "m1"}]})))
            .with_status(200)
            .with_body(r#"{"duration": 1200}"#)
            .expect(1)
            .create_async()
            .await;

        let options = RequestOptions::new()
            .query("dryRun", true)
            .json(json!({"sets": [{"movementId": "m1"}]}));
        let result: Value = executor
            .request_json(Method::POST, "/user-workouts/estimate", &options)
            .await
            .expect("estimate succeeds");
        assert_eq!(result["duration"], 1200);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unresponsive_server_times_out() {
        let mut server = mockito::Server::new_async().await;
        let mut config = test_config(&server);
        config.max_attempts = 2;
        let executor = logged_in_executor(&mut server, config).await;

        // Accepts connections at the socket level but never answers.
        let silent = std::net::TcpListener::bind("127.0.0.1:0").expect("bind listener");
        let silent_url = format!("http://{}", silent.local_addr().expect("local addr"));
        let executor = RequestExecutor {
            base_url: silent_url,
            timeout: Duration::from_millis(200),
            ..executor
        };

        let err = executor
            .request_json::<Value>(Method::GET, "/users/userinfo", &RequestOptions::new())
            .await
            .expect_err("no response");
        assert!(matches!(err, ClientError::Timeout(_)));
        assert!(err.status().is_none());
    }

    #[tokio::test]
    async fn test_unauthenticated_executor_fails_without_network() {
        let server = mockito::Server::new_async().await;
        let config = Arc::new(test_config(&server));
        let http = Client::new();
        let session = Arc::new(AuthSessionManager::new(config.clone(), http.clone()));
        let executor = RequestExecutor::new(&config, http, session);

        let err = executor
            .request_json::<Value>(Method::GET, "/goals", &RequestOptions::new())
            .await
            .expect_err("no session");
        assert!(matches!(err, ClientError::Session(_)));
    }
}

//! API client for communicating with the exam portal REST API.
//!
//! This module provides the `ApiClient` struct, which attaches the session
//! credential to outbound requests and invalidates the session whenever the
//! server answers 401.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::{extract_login_credentials, LoginCredentials, SharedSession, DEFAULT_ROLE};
use crate::models::{CountdownSnapshot, LoginRequest, RegisterRequest, VerifyRequest};

use super::{ApiError, Endpoint};

// ============================================================================
// Constants
// ============================================================================

const REGISTER_PATH: &str = "/auth/register";
const VERIFY_PATH: &str = "/auth/verify";
const LOGIN_PATH: &str = "/auth/loginuser";
const USER_STATS_PATH: &str = "/admin/users/stats";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Receives authorization failures after the session has been cleared.
///
/// This is where a front end sends the user back to its login entry point.
/// It may be called several times for one logical failure, for example when
/// concurrent requests each observe a 401.
pub trait AuthFailureHandler: Send + Sync {
    fn on_unauthorized(&self);
}

impl<F> AuthFailureHandler for F
where
    F: Fn() + Send + Sync,
{
    fn on_unauthorized(&self) {
        self()
    }
}

/// API client for the exam portal.
/// Clone is cheap - the connection pool and session are shared.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: SharedSession,
    on_unauthorized: Arc<dyn AuthFailureHandler>,
    initial_backoff: Duration,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// `base_url` includes the API prefix, e.g. `http://host:8080/api`.
    pub fn new(
        base_url: &str,
        session: SharedSession,
        on_unauthorized: Arc<dyn AuthFailureHandler>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            on_unauthorized,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        })
    }

    /// Override the first rate-limit backoff delay. Later retries double it.
    pub fn with_retry_backoff(mut self, initial: Duration) -> Self {
        self.initial_backoff = initial;
        self
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    // ===== Authentication =====

    pub async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.request(Endpoint::Register, Method::POST, REGISTER_PATH, Some(&request.wire_body()))
            .await?;
        info!("Registration submitted");
        Ok(())
    }

    pub async fn verify(&self, request: &VerifyRequest) -> Result<(), ApiError> {
        self.request(Endpoint::Verify, Method::POST, VERIFY_PATH, Some(request))
            .await?;
        info!("Phone number verified");
        Ok(())
    }

    /// Log in and adopt the returned credential.
    ///
    /// With `remember` the session is persisted across runs. A response that
    /// carries no recognizable credential leaves the session untouched and
    /// returns `Ok(None)`.
    pub async fn login(
        &self,
        request: &LoginRequest,
        remember: bool,
    ) -> Result<Option<LoginCredentials>, ApiError> {
        let response = self
            .request(Endpoint::Login, Method::POST, LOGIN_PATH, Some(&request.wire_body()))
            .await?;

        let Some(found) = extract_login_credentials(&response) else {
            warn!("No credential found in login response");
            return Ok(None);
        };

        let role = found.role.unwrap_or_else(|| DEFAULT_ROLE.to_string());
        self.session
            .write()
            .await
            .adopt(&found.credential, Some(role.as_str()), remember);

        Ok(Some(LoginCredentials {
            credential: found.credential,
            role: Some(role),
        }))
    }

    /// Forget the session locally. The server is not contacted.
    pub async fn logout(&self) {
        self.session.write().await.clear();
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_authenticated()
    }

    // ===== Remaining-time sources =====

    /// Fetch the public countdown for an exam.
    pub async fn fetch_countdown(&self, exam_id: u32) -> Result<CountdownSnapshot, ApiError> {
        let path = format!("/tests/exam/{}/countdown", exam_id);
        let value = self
            .request(Endpoint::ExamCountdown, Method::GET, &path, None::<&()>)
            .await?;
        Self::decode(value, "countdown")
    }

    /// Fetch the admin user statistics, which report remaining time in the
    /// same shape as the exam countdown.
    pub async fn fetch_user_stats(&self) -> Result<CountdownSnapshot, ApiError> {
        let value = self
            .request(Endpoint::UserStats, Method::GET, USER_STATS_PATH, None::<&()>)
            .await?;
        Self::decode(value, "user stats")
    }

    // ===== Transport =====

    async fn credential_for(&self, endpoint: Endpoint) -> Option<String> {
        if !endpoint.sends_credential() {
            return None;
        }
        self.session.read().await.credential().map(str::to_string)
    }

    /// Clear the session and notify the failure handler.
    async fn invalidate_session(&self, endpoint: Endpoint) {
        warn!(endpoint = endpoint.name(), "Authorization rejected, clearing session");
        self.session.write().await.clear();
        self.on_unauthorized.on_unauthorized();
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        endpoint: Endpoint,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut retries = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let mut builder = self
                .client
                .request(method.clone(), &url)
                .header(header::ACCEPT, "application/json");
            if let Some(credential) = self.credential_for(endpoint).await {
                builder = builder.bearer_auth(credential);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(|e| {
                warn!(url = %url, error = %e, "Request failed before a response arrived");
                ApiError::NetworkError(e)
            })?;

            let status = response.status();
            debug!(url = %url, status = status.as_u16(), "Response received");

            if status.is_success() {
                let text = response.text().await?;
                return Self::parse_body(&text, &url);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(ApiError::RateLimited);
                }
                warn!(url = %url, retry = retries, backoff_ms = backoff.as_millis() as u64, "Rate limited, backing off");
                tokio::time::sleep(backoff).await;
                backoff *= 2; // Exponential backoff
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            let error = ApiError::from_status(status, &text);
            if error.is_unauthorized() {
                self.invalidate_session(endpoint).await;
            }
            return Err(error);
        }
    }

    fn parse_body(text: &str, url: &str) -> Result<Value, ApiError> {
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, ApiError> {
        serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {} response: {}", what, e)))
    }
}

//! Authenticated request gateway.
//!
//! Wraps outbound API calls: resolves the endpoint against the configured
//! base URL, attaches the bearer token, and on a 401 transparently exchanges
//! the refresh token for a new access token and retries the original request
//! exactly once. Terminal failures clear the session and hand control to the
//! login redirect, so callers never implement their own refresh logic.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DEFAULT_BASE_URL;
use crate::session::SessionManager;

/// Endpoint exchanged for a fresh access token.
const REFRESH_ENDPOINT: &str = "auth/refresh-token/";

/// Per-call request options: method, extra headers and an optional body.
///
/// Defaults to a GET with no body. The gateway adds a JSON content type and
/// the bearer token; caller headers win over the content type on conflict.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Builds options carrying a JSON-serialized body.
    ///
    /// # Errors
    /// Returns an error if the body cannot be serialized.
    pub fn json<T: Serialize>(method: Method, body: &T) -> Result<Self> {
        let body = serde_json::to_string(body).context("failed to serialize request body")?;
        Ok(Self {
            method,
            headers: HeaderMap::new(),
            body: Some(body),
        })
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Phases of the one-shot refresh-and-retry flow.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AuthState {
    /// The original response stands.
    Authorized,
    /// The original call came back 401.
    Unauthorized,
    /// The refresh exchange produced a new access token.
    Refreshed { access: String },
    /// Terminal: clear credentials and send the user back to login.
    Expired,
}

/// Transition applied to the original response status.
fn after_response(status: StatusCode) -> AuthState {
    if status == StatusCode::UNAUTHORIZED {
        AuthState::Unauthorized
    } else {
        AuthState::Authorized
    }
}

/// Transition applied to the refresh exchange result.
///
/// A successful exchange must carry `data.access`; anything else is terminal.
fn after_refresh_exchange(status: StatusCode, body: &Value) -> AuthState {
    if !status.is_success() {
        return AuthState::Expired;
    }
    match body.pointer("/data/access").and_then(Value::as_str) {
        Some(access) if !access.is_empty() => AuthState::Refreshed {
            access: access.to_string(),
        },
        _ => AuthState::Expired,
    }
}

/// Resolves an endpoint to an absolute URL.
///
/// Absolute endpoints pass through unchanged; relative ones are joined to the
/// base with a single separator.
fn resolve_url(base: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http") {
        return endpoint.to_string();
    }
    let clean = endpoint.strip_prefix('/').unwrap_or(endpoint);
    format!("{}/{clean}", base.trim_end_matches('/'))
}

/// Client for the guestbook backend API.
///
/// All authenticated traffic goes through [`ApiClient::request`]; the typed
/// endpoint methods in [`crate::api`] are thin wrappers over it.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    session: Arc<SessionManager>,
}

impl ApiClient {
    /// Creates a new client for the given base URL and session.
    ///
    /// # Panics
    /// - In test builds (`#[cfg(test)]`), panics if `base_url` is the
    ///   production API.
    /// - At runtime, panics if `GUESTBOOK_BLOCK_REAL_API=1` and `base_url` is
    ///   the production API.
    ///
    /// This prevents tests from accidentally making real network requests.
    /// Use `GUESTBOOK_BASE_URL` or config to point to a mock server.
    pub fn new(base_url: impl Into<String>, session: Arc<SessionManager>) -> Self {
        let base_url = base_url.into();

        // Compile-time guard for unit tests
        #[cfg(test)]
        assert!(
            base_url != DEFAULT_BASE_URL,
            "Tests must not use the production guestbook API!\n\
             Set GUESTBOOK_BASE_URL to a mock server (e.g., wiremock).\n\
             Found base_url: {base_url}"
        );

        // Runtime guard for integration tests
        #[cfg(not(test))]
        if std::env::var("GUESTBOOK_BLOCK_REAL_API").is_ok_and(|v| v == "1")
            && base_url == DEFAULT_BASE_URL
        {
            panic!(
                "GUESTBOOK_BLOCK_REAL_API=1 but trying to use the production guestbook API!\n\
                 Set GUESTBOOK_BASE_URL to a mock server.\n\
                 Found base_url: {base_url}"
            );
        }

        Self {
            base_url,
            http: reqwest::Client::new(),
            session,
        }
    }

    /// Returns the session manager backing this client.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Returns the bare HTTP client, for unauthenticated endpoints.
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Resolves an endpoint against this client's base URL.
    pub fn url(&self, endpoint: &str) -> String {
        resolve_url(&self.base_url, endpoint)
    }

    /// Performs an authenticated request, recovering from access-token expiry
    /// at most once.
    ///
    /// Returns the final [`Response`] even when it is an error status; the
    /// original 401 comes back when recovery fails. Transport errors on the
    /// original call propagate; a transport error during the refresh exchange
    /// propagates after the session-expiry path has run.
    ///
    /// # Errors
    /// Returns an error on transport failure.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Response> {
        let url = self.url(endpoint);
        let token = self.session.access_token();
        let response = self.send(&url, &options, token.as_deref()).await?;

        if after_response(response.status()) == AuthState::Authorized {
            return Ok(response);
        }
        debug!("access token rejected (401), attempting refresh");

        let Some(refresh_token) = self.session.refresh_token() else {
            warn!("no refresh token stored");
            self.session.expire().await;
            return Ok(response);
        };

        let exchange = self
            .http
            .post(self.url(REFRESH_ENDPOINT))
            .header(CONTENT_TYPE, "application/json")
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .send()
            .await;

        let refresh_response = match exchange {
            Ok(refresh_response) => refresh_response,
            Err(err) => {
                self.session.expire().await;
                return Err(err).context("token refresh request failed");
            }
        };

        let status = refresh_response.status();
        let body = refresh_response.json::<Value>().await.unwrap_or(Value::Null);

        match after_refresh_exchange(status, &body) {
            AuthState::Refreshed { access } => {
                if let Err(err) = self.session.store_access_token(&access) {
                    warn!("failed to persist refreshed access token: {err:#}");
                }
                // One retry with the new token; its outcome is final either way.
                self.send(&url, &options, Some(&access)).await
            }
            _ => {
                warn!("refresh token rejected or no access token returned");
                self.session.expire().await;
                Ok(response)
            }
        }
    }

    /// Issues a single request with the standard header set.
    ///
    /// Header precedence: JSON content type first, then caller headers, then
    /// the bearer token.
    async fn send(
        &self,
        url: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<Response> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in &options.headers {
            headers.insert(name.clone(), value.clone());
        }
        if let Some(token) = token {
            let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("stored access token is not a valid header value")?;
            headers.insert(AUTHORIZATION, bearer);
        }

        let mut builder = self
            .http
            .request(options.method.clone(), url)
            .headers(headers);
        if let Some(body) = &options.body {
            builder = builder.body(body.clone());
        }

        builder
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))
    }
}

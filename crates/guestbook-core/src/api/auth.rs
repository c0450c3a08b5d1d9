//! Authentication flows: login, email verification, logout.
//!
//! Login and email verification are unauthenticated endpoints; they bypass
//! the gateway so a 401 means bad credentials, not an expired session.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::{ensure_ok, read_json};
use crate::gateway::ApiClient;

/// Profile fields returned by the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    data: LoginData,
}

#[derive(Debug, Deserialize)]
struct LoginData {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    jwt: JwtPair,
}

#[derive(Debug, Deserialize)]
struct JwtPair {
    access: String,
    refresh: String,
}

impl ApiClient {
    /// Logs in with email and password and persists the resulting session
    /// (both tokens plus the user profile).
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-success status, or an
    /// unexpected response shape.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let response = self
            .http()
            .post(self.url("auth/login/"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .context("login request failed")?;

        let body = read_json(response).await?;
        let envelope: LoginEnvelope =
            serde_json::from_value(body).context("unexpected login response shape")?;
        let data = envelope.data;

        let profile = UserProfile {
            username: data.username,
            email: data.email,
            name: data.name,
        };
        let user_json = serde_json::to_string(&profile).context("failed to serialize profile")?;
        self.session()
            .store_session(&data.jwt.access, &data.jwt.refresh, &user_json)?;
        debug!("logged in, session stored");
        Ok(profile)
    }

    /// Submits the OTP code emailed during signup.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn verify_email(&self, email: &str, otp: &str) -> Result<()> {
        let response = self
            .http()
            .post(self.url("auth/verify-email/"))
            .json(&json!({ "email": email, "otp": otp }))
            .send()
            .await
            .context("email verification request failed")?;
        ensure_ok(response, "email verification").await
    }

    /// Requests a fresh OTP for the given address.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn resend_otp(&self, email: &str) -> Result<()> {
        let response = self
            .http()
            .post(self.url("auth/verify-email/"))
            .json(&json!({ "email": email }))
            .send()
            .await
            .context("OTP resend request failed")?;
        ensure_ok(response, "OTP resend").await
    }

    /// Drops the stored session.
    ///
    /// # Errors
    /// Returns an error if the session store could not be updated.
    pub fn logout(&self) -> Result<()> {
        self.session().clear()
    }

    /// Returns the stored user profile, if a session exists.
    pub fn current_user(&self) -> Option<UserProfile> {
        let raw = self.session().user_profile()?;
        serde_json::from_str(&raw).ok()
    }
}

// SPDX-License-Identifier: MIT

//! Identity provider client (hosted auth service).
//!
//! Handles:
//! - Email/password sign-up and sign-in
//! - OAuth authorize-URL construction and code exchange
//! - Current-user lookup and sign-out
//!
//! Sessions themselves are the provider's signed access tokens; this
//! client never mints credentials of its own.

use crate::error::AppError;
use serde::Deserialize;
use uuid::Uuid;

/// Identity provider client.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Option<IdentityInner>,
}

#[derive(Clone)]
struct IdentityInner {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    /// Create a client for the hosted project's auth endpoint.
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            inner: Some(IdentityInner {
                http: reqwest::Client::new(),
                base_url: format!("{}/auth/v1", base_url.trim_end_matches('/')),
                api_key: api_key.to_string(),
            }),
        }
    }

    /// Create a mock client for testing (offline mode).
    pub fn new_mock() -> Self {
        Self { inner: None }
    }

    fn get_inner(&self) -> Result<&IdentityInner, AppError> {
        self.inner.as_ref().ok_or_else(|| {
            AppError::Identity("Identity provider not configured (offline mode)".to_string())
        })
    }

    /// Register a new account with email and password.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let inner = self.get_inner()?;
        let url = format!("{}/signup", inner.base_url);

        let response = inner
            .http
            .post(&url)
            .header("apikey", &inner.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        Self::check_response_json(response).await
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AppError> {
        let inner = self.get_inner()?;
        let url = format!("{}/token?grant_type=password", inner.base_url);

        let response = inner
            .http
            .post(&url)
            .header("apikey", &inner.api_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        Self::check_response_json(response).await
    }

    /// Build the provider's OAuth authorization URL for a redirect.
    pub fn authorize_url(&self, provider: &str, redirect_uri: &str) -> Result<String, AppError> {
        let inner = self.get_inner()?;
        Ok(format!(
            "{}/authorize?provider={}&redirect_to={}",
            inner.base_url,
            urlencoding::encode(provider),
            urlencoding::encode(redirect_uri)
        ))
    }

    /// Exchange an OAuth authorization code for a session.
    pub async fn exchange_code(&self, code: &str) -> Result<AuthSession, AppError> {
        let inner = self.get_inner()?;
        let url = format!("{}/token?grant_type=authorization_code", inner.base_url);

        let response = inner
            .http
            .post(&url)
            .header("apikey", &inner.api_key)
            .form(&[("code", code)])
            .send()
            .await
            .map_err(|e| AppError::Identity(format!("Code exchange failed: {}", e)))?;

        Self::check_response_json(response).await
    }

    /// Fetch the user behind an access token.
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUserInfo, AppError> {
        let inner = self.get_inner()?;
        let url = format!("{}/user", inner.base_url);

        let response = inner
            .http
            .get(&url)
            .header("apikey", &inner.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        Self::check_response_json(response).await
    }

    /// Revoke a session at the provider.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let inner = self.get_inner()?;
        let url = format!("{}/logout", inner.base_url);

        let response = inner
            .http
            .post(&url)
            .header("apikey", &inner.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Identity(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AppError::Identity(format!("HTTP {}: {}", status, body)))
        }
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            // The provider wraps failures in {"error_description": "..."}
            // or {"msg": "..."}; pull the human message out when present.
            let message = serde_json::from_str::<ProviderError>(&body)
                .ok()
                .and_then(|e| e.message())
                .unwrap_or_else(|| format!("HTTP {}", status));

            return Err(AppError::Identity(message));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Identity(format!("JSON parse error: {}", e)))
    }
}

/// Session issued by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires
    pub expires_in: Option<i64>,
    pub user: AuthUserInfo,
}

/// Provider's view of a user.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUserInfo {
    pub id: Uuid,
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl AuthUserInfo {
    /// Best display name available: the OAuth full name, else the email.
    pub fn display_name(&self) -> String {
        self.user_metadata
            .full_name
            .clone()
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// OAuth-populated metadata attached to a user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserMetadata {
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
struct ProviderError {
    error_description: Option<String>,
    msg: Option<String>,
}

impl ProviderError {
    fn message(self) -> Option<String> {
        self.error_description.or(self.msg)
    }
}

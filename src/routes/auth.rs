// SPDX-License-Identifier: MIT

//! Authentication routes (hosted identity provider).

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::auth::SESSION_COOKIE;
use crate::models::{NewProfile, UserProfile};
use crate::services::identity::AuthUserInfo;
use crate::time_utils::now_rfc3339;
use crate::AppState;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use hmac::{Hmac, Mac};
use sha2::Sha256;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Session cookie lifetime. Provider access tokens expire sooner; the
/// middleware rejects those independently of the cookie.
const SESSION_COOKIE_DAYS: i64 = 30;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/oauth/{provider}", get(oauth_start))
        .route("/auth/callback", get(oauth_callback))
        .route("/auth/logout", post(logout))
}

// ─── Password Auth ───────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
}

#[derive(Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Session response returned by login/register.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub level: i32,
    pub xp: i32,
}

impl SessionResponse {
    fn from_profile(profile: UserProfile) -> Self {
        Self {
            user_id: profile.user_id.to_string(),
            name: profile.name,
            email: profile.email,
            photo_url: profile.photo_url,
            level: profile.level,
            xp: profile.xp,
        }
    }
}

/// Register a new account, then sign the user in.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<RegisterPayload>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let session = state
        .identity
        .sign_up(&payload.email, &payload.password)
        .await?;

    tracing::info!(user_id = %session.user.id, "Account registered");

    // The profile row is ours, not the provider's; create it with the
    // submitted display name rather than the email fallback.
    let now = now_rfc3339();
    let profile = state
        .db
        .insert_profile(
            &session.access_token,
            &NewProfile {
                user_id: session.user.id,
                name: payload.name,
                email: payload.email,
                created_at: now.clone(),
                last_login: now,
            },
        )
        .await?;

    let jar = jar.add(session_cookie(&session.access_token));
    Ok((jar, Json(SessionResponse::from_profile(profile))))
}

/// Sign in with email and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginPayload>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let session = state
        .identity
        .sign_in_with_password(&payload.email, &payload.password)
        .await?;

    let profile = ensure_profile(&state, &session.access_token, &session.user).await?;

    tracing::info!(user_id = %session.user.id, "Signed in");

    let jar = jar.add(session_cookie(&session.access_token));
    Ok((jar, Json(SessionResponse::from_profile(profile))))
}

// ─── OAuth ───────────────────────────────────────────────────

/// Query parameters for starting OAuth flow.
#[derive(Deserialize)]
pub struct OAuthStartParams {
    /// Frontend URL to redirect back to after OAuth completes.
    /// If not provided, uses the configured frontend URL.
    #[serde(default)]
    redirect_uri: Option<String>,
}

/// Start OAuth flow - redirect to the identity provider.
async fn oauth_start(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Query(params): Query<OAuthStartParams>,
    headers: axum::http::HeaderMap,
) -> Result<Redirect> {
    if !matches!(provider.as_str(), "google" | "discord" | "github") {
        return Err(AppError::BadRequest(format!(
            "Unsupported OAuth provider: {}",
            provider
        )));
    }

    let frontend_url = params
        .redirect_uri
        .unwrap_or_else(|| state.config.frontend_url.clone());

    // Encode frontend URL + timestamp in state
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis();

    let state_payload = format!("{}|{:x}", frontend_url, timestamp);

    // Sign the payload
    let mut mac = HmacSha256::new_from_slice(&state.config.oauth_state_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(state_payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed_state = format!("{}|{}", state_payload, hex::encode(signature));
    let oauth_state = URL_SAFE_NO_PAD.encode(signed_state.as_bytes());

    let callback_url = format!(
        "{}/auth/callback?state={}",
        service_url(&headers),
        urlencoding::encode(&oauth_state)
    );

    let auth_url = state.identity.authorize_url(&provider, &callback_url)?;

    tracing::info!(provider = %provider, frontend_url = %frontend_url, "Starting OAuth flow");

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    state: String,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for a session, sync the profile.
async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    // Decode and verify frontend URL from state parameter
    let frontend_url = verify_and_decode_state(&params.state, &state.config.oauth_state_key)
        .unwrap_or_else(|| {
            tracing::warn!(
                "Invalid or tampered state parameter, falling back to default frontend URL"
            );
            state.config.frontend_url.clone()
        });

    // Check for OAuth errors
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from provider");
        let redirect = format!("{}/login?error={}", frontend_url, urlencoding::encode(&error));
        return Ok((jar, Redirect::temporary(&redirect)));
    }

    let code = params.code.ok_or_else(|| {
        AppError::BadRequest("Missing authorization code in callback".to_string())
    })?;

    let session = state.identity.exchange_code(&code).await?;

    if let Err(e) = ensure_profile(&state, &session.access_token, &session.user).await {
        // Profile sync failing should not eat the sign-in; the dashboard
        // will retry the lazy create on its next load.
        tracing::warn!(error = %e, "Profile sync failed during OAuth callback");
    }

    tracing::info!(user_id = %session.user.id, "OAuth sign-in complete");

    let jar = jar.add(session_cookie(&session.access_token));
    Ok((jar, Redirect::temporary(&frontend_url)))
}

// ─── Logout ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LogoutResponse {
    pub success: bool,
}

/// Sign out: revoke the provider session and clear local state.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LogoutResponse>)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token = cookie.value().to_string();
        state.sessions.remove(&token);

        // Best-effort revocation; an already-expired token is fine.
        if let Err(e) = state.identity.sign_out(&token).await {
            tracing::debug!(error = %e, "Provider sign-out failed");
        }
    }

    let mut removal = Cookie::from(SESSION_COOKIE);
    removal.set_path("/");
    let jar = jar.remove(removal);

    Ok((jar, Json(LogoutResponse { success: true })))
}

// ─── Helpers ─────────────────────────────────────────────────

/// Build the session cookie for an access token.
fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_COOKIE_DAYS))
        .build()
}

/// The externally visible URL of this service, for callback links.
fn service_url(headers: &axum::http::HeaderMap) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| {
            std::env::var("API_HOST").unwrap_or_else(|_| "localhost:8080".to_string())
        });

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };

    format!("{}://{}", scheme, host)
}

/// Lazily create the profile row on first sign-in; refresh `last_login`
/// on every subsequent one.
async fn ensure_profile(
    state: &Arc<AppState>,
    token: &str,
    user: &AuthUserInfo,
) -> Result<UserProfile> {
    let now = now_rfc3339();

    match state.db.get_profile(token, user.id).await? {
        Some(profile) => {
            if let Err(e) = state.db.update_last_login(token, user.id, &now).await {
                tracing::warn!(error = %e, "Failed to update last login");
            }
            Ok(profile)
        }
        None => {
            let profile = state
                .db
                .insert_profile(
                    token,
                    &NewProfile {
                        user_id: user.id,
                        name: user.display_name(),
                        email: user.email.clone().unwrap_or_default(),
                        created_at: now.clone(),
                        last_login: now,
                    },
                )
                .await?;
            tracing::info!(user_id = %user.id, "Profile created on first sign-in");
            Ok(profile)
        }
    }
}

/// Verify HMAC signature and decode the frontend URL from the OAuth state
/// parameter.
fn verify_and_decode_state(state: &str, secret: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "frontend_url|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    let frontend_url = parts[0];
    let timestamp_hex = parts[1];
    let signature_hex = parts[2];

    // Reconstruct payload and verify signature
    let payload = format!("{}|{}", frontend_url, timestamp_hex);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());

    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if signature_hex != expected_signature {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    Some(frontend_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_and_decode_state_success() {
        let secret = b"secret_key";
        let frontend_url = "https://example.com";
        let timestamp = 1234567890u128;

        let payload = format!("{}|{:x}", frontend_url, timestamp);
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let state_data = format!("{}|{}", payload, signature);
        let encoded_state = URL_SAFE_NO_PAD.encode(state_data.as_bytes());

        let result = verify_and_decode_state(&encoded_state, secret);
        assert_eq!(result, Some(frontend_url.to_string()));
    }

    #[test]
    fn test_verify_and_decode_state_invalid_signature() {
        let secret = b"secret_key";
        let state_data = "https://example.com|499602d2|invalid_signature";
        let encoded_state = URL_SAFE_NO_PAD.encode(state_data.as_bytes());

        assert_eq!(verify_and_decode_state(&encoded_state, secret), None);
    }

    #[test]
    fn test_verify_and_decode_state_wrong_secret() {
        let secret = b"secret_key";
        let frontend_url = "https://example.com";

        let payload = format!("{}|{:x}", frontend_url, 1234567890u128);
        let mut mac = HmacSha256::new_from_slice(secret).unwrap();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        let state_data = format!("{}|{}", payload, signature);
        let encoded_state = URL_SAFE_NO_PAD.encode(state_data.as_bytes());

        assert_eq!(
            verify_and_decode_state(&encoded_state, b"wrong_key"),
            None
        );
    }

    #[test]
    fn test_verify_and_decode_state_malformed() {
        let encoded_state = URL_SAFE_NO_PAD.encode("invalid|format");
        assert_eq!(verify_and_decode_state(&encoded_state, b"secret_key"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("token-value");
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}

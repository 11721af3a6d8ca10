// SPDX-License-Identifier: MIT

//! Session authentication middleware.
//!
//! Sessions are the identity provider's HS256 access tokens, carried in a
//! cookie (set at login) or an Authorization header. Tokens are validated
//! locally against the provider's signing secret; validated sessions are
//! cached until their expiry so repeated requests skip the decode.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "questlog_session";

/// Access token claims issued by the identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
}

/// Authenticated user extracted from the session token.
///
/// This is the per-request session context: produced once here, consumed
/// by reference from request extensions everywhere else. The raw token is
/// kept so handlers can forward it to the gateway (row-level security).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub token: String,
}

/// Cached result of a successful validation.
#[derive(Debug, Clone)]
pub struct CachedSession {
    pub user_id: Uuid,
    pub email: Option<String>,
    /// Token expiry (Unix timestamp)
    pub expires_at: usize,
}

/// Middleware that requires a valid session.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get(SESSION_COOKIE) {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
            _ => return Err(StatusCode::UNAUTHORIZED),
        }
    };

    let now = chrono::Utc::now().timestamp() as usize;

    // Cache hit: reuse the validated session until the token expires.
    if let Some(session) = state.sessions.get(&token) {
        if session.expires_at > now {
            let auth_user = AuthUser {
                user_id: session.user_id,
                email: session.email.clone(),
                token: token.clone(),
            };
            drop(session);
            request.extensions_mut().insert(auth_user);
            return Ok(next.run(request).await);
        }
        drop(session);
        state.sessions.remove(&token);
    }

    let session = validate_token(&token, &state.config.jwt_secret)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let auth_user = AuthUser {
        user_id: session.user_id,
        email: session.email.clone(),
        token: token.clone(),
    };
    state.sessions.insert(token, session);

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Validate an access token and return the session to cache.
pub fn validate_token(token: &str, secret: &[u8]) -> Option<CachedSession> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(Algorithm::HS256);
    // The provider sets its own audience; we only care about signature
    // and expiry.
    validation.validate_aud = false;

    let token_data = decode::<Claims>(token, &key, &validation).ok()?;
    let user_id: Uuid = token_data.claims.sub.parse().ok()?;

    Some(CachedSession {
        user_id,
        email: token_data.claims.email,
        expires_at: token_data.claims.exp,
    })
}

/// Create a session token the way the provider mints them. Test-only
/// helper; production tokens always come from the identity provider.
pub fn create_session_token(
    user_id: Uuid,
    email: Option<&str>,
    secret: &[u8],
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(String::from),
        exp: now + 60 * 60, // 1 hour, matching the provider default
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )?)
}

// SPDX-License-Identifier: MIT

//! Profile routes: current user, display-name edits, and photo upload.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::UserProfile;
use crate::services::storage::{PROFILE_PHOTO_BUCKET, SIGNED_URL_TTL_SECS};
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Uploads above this size are rejected before hitting storage.
const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/profile", put(update_profile))
        .route("/api/profile/photo", post(upload_photo))
}

// ─── Current User ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub level: i32,
    pub xp: i32,
    pub last_login: Option<String>,
}

impl ProfileResponse {
    fn from_profile(profile: UserProfile) -> Self {
        Self {
            user_id: profile.user_id.to_string(),
            name: profile.name,
            email: profile.email,
            photo_url: profile.photo_url,
            level: profile.level,
            xp: profile.xp,
            last_login: profile.last_login,
        }
    }
}

/// Get the current user's profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .db
        .get_profile(&user.token, user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user.user_id)))?;

    Ok(Json(ProfileResponse::from_profile(profile)))
}

// ─── Display Name ────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateProfileResponse {
    pub success: bool,
}

/// Update the display name.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<UpdateProfileResponse>> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .db
        .update_profile_name(&user.token, user.user_id, payload.name.trim())
        .await?;

    Ok(Json(UpdateProfileResponse { success: true }))
}

// ─── Photo Upload ────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PhotoResponse {
    pub photo_url: String,
}

/// Upload a new profile photo.
///
/// The previous photo is removed best-effort, then the new one is
/// uploaded under a timestamped per-user path and the profile is pointed
/// at a year-long signed URL.
async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<PhotoResponse>> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some("photo") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(String::from)
            .unwrap_or_else(|| "application/octet-stream".to_string());
        if !content_type.starts_with("image/") {
            return Err(AppError::BadRequest(format!(
                "Expected an image upload, got {}",
                content_type
            )));
        }

        let extension = field
            .file_name()
            .and_then(|name| name.rsplit('.').next().map(str::to_lowercase))
            .unwrap_or_else(|| "jpg".to_string());

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;
        if bytes.len() > MAX_PHOTO_BYTES {
            return Err(AppError::BadRequest(
                "Photo exceeds the 5 MB limit".to_string(),
            ));
        }

        upload = Some((content_type, extension, bytes.to_vec()));
        break;
    }

    let (content_type, extension, bytes) =
        upload.ok_or_else(|| AppError::BadRequest("Missing 'photo' field".to_string()))?;

    // Remove the previous photo so orphans don't pile up. Failure here is
    // logged and ignored; the new upload still proceeds.
    if let Ok(Some(profile)) = state.db.get_profile(&user.token, user.user_id).await {
        if let Some(old_path) = profile.photo_url.as_deref().and_then(photo_path_from_url) {
            if let Err(e) = state
                .storage
                .remove(&user.token, PROFILE_PHOTO_BUCKET, &[&old_path])
                .await
            {
                tracing::debug!(error = %e, "Failed to remove previous photo");
            }
        }
    }

    // Timestamped path: unique per upload, no overwrite semantics needed.
    let path = format!(
        "{}/{}.{}",
        user.user_id,
        chrono::Utc::now().timestamp_millis(),
        extension
    );

    state
        .storage
        .upload(&user.token, PROFILE_PHOTO_BUCKET, &path, &content_type, bytes)
        .await?;

    let photo_url = state
        .storage
        .create_signed_url(&user.token, PROFILE_PHOTO_BUCKET, &path, SIGNED_URL_TTL_SECS)
        .await?;

    state
        .db
        .set_profile_photo(&user.token, user.user_id, &photo_url)
        .await?;

    tracing::info!(user_id = %user.user_id, "Profile photo updated");

    Ok(Json(PhotoResponse { photo_url }))
}

/// Recover the object path from a stored signed URL
/// (`.../object/sign/<bucket>/<path>?token=...`).
fn photo_path_from_url(url: &str) -> Option<String> {
    let marker = format!("/object/sign/{}/", PROFILE_PHOTO_BUCKET);
    let start = url.find(&marker)? + marker.len();
    let rest = &url[start..];
    let path = rest.split('?').next()?;
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

// SPDX-License-Identifier: MIT

//! User profile model for storage and API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile row stored in the gateway's `profiles` table.
///
/// Created lazily on first sign-in; `last_login` is refreshed on every
/// sign-in and `photo_url` on photo upload. XP is only ever adjusted
/// through the `update_user_xp` RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Identity provider user ID (also the row key)
    pub user_id: Uuid,
    /// Display name
    pub name: String,
    pub email: String,
    /// Profile photo URL (signed storage URL)
    pub photo_url: Option<String>,
    /// Gamification level
    pub level: i32,
    /// Experience points
    pub xp: i32,
    pub created_at: String,
    pub last_login: Option<String>,
}

/// Insert payload for the lazily-created profile row.
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub last_login: String,
}

// SPDX-License-Identifier: MIT

use questlog::config::Config;
use questlog::db::GatewayDb;
use questlog::middleware::auth::create_session_token;
use questlog::routes::create_router;
use questlog::services::{IdentityClient, MetadataClient, StorageClient};
use questlog::AppState;
use std::sync::Arc;
use uuid::Uuid;

/// Create a test app with offline mock clients.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();

    let state = Arc::new(AppState {
        config,
        db: GatewayDb::new_mock(),
        identity: IdentityClient::new_mock(),
        storage: StorageClient::new_mock(),
        metadata: MetadataClient::new_mock(),
        sessions: dashmap::DashMap::new(),
    });

    (create_router(state.clone()), state)
}

/// Mint a session token the way the identity provider would.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: Uuid, secret: &[u8]) -> String {
    create_session_token(user_id, Some("tester@example.com"), secret)
        .expect("test token should encode")
}

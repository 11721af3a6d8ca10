// SPDX-License-Identifier: MIT

//! Questlog: personal game library and challenge tracker
//!
//! This crate provides the backend API for a game-library dashboard.
//! Persistence, authentication, and file storage are delegated to a
//! hosted backend; the application layer owns the typed models, the
//! view-model logic, and the clients for those services.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::GatewayDb;
use middleware::auth::CachedSession;
use services::{IdentityClient, MetadataClient, StorageClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: GatewayDb,
    pub identity: IdentityClient,
    pub storage: StorageClient,
    pub metadata: MetadataClient,
    /// Validated sessions, keyed by access token. Entries expire with
    /// their tokens and are dropped on logout.
    pub sessions: dashmap::DashMap<String, CachedSession>,
}

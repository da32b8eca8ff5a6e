//! Reading progress sync server for KOReader.
//!
//! Devices register an account, then push their current position in a
//! document and pull the most recently stored one, so every device a user
//! reads on converges on the same page. One position is kept per
//! (user, document); the newest push wins.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod protocol;
pub mod service;

use auth::AuthGate;
use db::SyncRepo;
use handlers::sync::SyncState;
use service::SyncService;
use std::sync::Arc;

/// Build the full application router over an initialized repository.
pub fn build_router(repo: Arc<SyncRepo>) -> axum::Router {
    handlers::sync_routes(
        SyncState {
            service: SyncService::new(repo.clone()),
        },
        AuthGate::new(repo),
    )
}

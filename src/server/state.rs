/**
 * Application State Management
 *
 * Central state container shared by every handler, plus the `FromRef`
 * impls that let handlers extract only the part they need.
 *
 * # Thread Safety
 *
 * Every field is a cheap clone over shared innards: the pool and registry
 * are handle types, the gateway and verifier sit behind `Arc`/internal
 * sharing. Handlers clone freely.
 */

use crate::auth::verifier::TokenVerifier;
use crate::gateway::handler::CollabGateway;
use crate::room::registry::RoomRegistry;
use axum::extract::FromRef;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    /// SQLite connection pool backing every store operation.
    pub pool: SqlitePool,

    /// Live room membership, shared between the gateway and the REST
    /// handlers that need to notify open rooms.
    pub registry: RoomRegistry,

    /// The room protocol core. One instance serves every connection.
    pub gateway: Arc<CollabGateway>,

    /// Credential verifier for both the REST middleware and the socket
    /// upgrade.
    pub verifier: TokenVerifier,
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.pool.clone()
    }
}

impl FromRef<AppState> for RoomRegistry {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.registry.clone()
    }
}

impl FromRef<AppState> for Arc<CollabGateway> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.gateway.clone()
    }
}

impl FromRef<AppState> for TokenVerifier {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.verifier.clone()
    }
}

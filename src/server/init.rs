/**
 * Server Initialization
 *
 * Builds the application from configuration: database pool, room
 * registry, gateway, verifier, then the router. Initialization is
 * stepwise and fails fast - an unreachable database aborts startup
 * because every store operation depends on it.
 */

use crate::auth::verifier::TokenVerifier;
use crate::config::{connect_database, ServerConfig};
use crate::gateway::handler::CollabGateway;
use crate::room::registry::RoomRegistry;
use crate::routes::create_router;
use crate::server::state::AppState;
use axum::Router;
use std::sync::Arc;

/// Create and configure the application router.
pub async fn create_app(config: &ServerConfig) -> Result<Router<()>, sqlx::Error> {
    tracing::info!("Initializing collaboration server");

    // Step 1: Database pool with schema migration
    let pool = connect_database(&config.database_url).await?;

    // Step 2: Live room membership
    let registry = RoomRegistry::new();

    // Step 3: Protocol core over pool + registry
    let gateway = Arc::new(CollabGateway::new(pool.clone(), registry.clone()));

    // Step 4: Credential verifier
    let verifier = TokenVerifier::new(&config.jwt_secret);

    let app_state = AppState {
        pool,
        registry,
        gateway,
        verifier,
    };

    tracing::info!("Application state initialized");
    Ok(create_router(app_state))
}

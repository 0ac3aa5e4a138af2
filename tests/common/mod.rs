/*!
 * Shared Test Harness
 *
 * In-memory database setup, fixture principals, and a gateway session
 * harness that captures everything the gateway addresses to a session.
 */

#![allow(dead_code)]

use reviewroom::auth::verifier::{Principal, TokenVerifier};
use reviewroom::gateway::events::ServerEvent;
use reviewroom::gateway::handler::{CollabGateway, RoomSession};
use reviewroom::room::registry::RoomRegistry;
use reviewroom::routes::create_router;
use reviewroom::server::state::AppState;
use reviewroom::store::media::{create_media, Media};
use reviewroom::store::schema::migrate;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret";

/// Fresh in-memory database with the schema applied.
///
/// One connection only: each pooled connection to `sqlite::memory:` would
/// otherwise be its own empty database.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory database");
    migrate(&pool).await.expect("schema migration");
    pool
}

pub fn principal(name: &str) -> Principal {
    Principal {
        id: Uuid::new_v4(),
        display_name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
    }
}

/// A gateway session plus the receiving end of its outbound channel.
pub struct TestSession {
    pub session: RoomSession,
    pub rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl TestSession {
    pub fn new(principal: Principal) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session: RoomSession::new(principal, tx),
            rx,
        }
    }

    /// Everything delivered to this session so far.
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Full application router over the given pool, plus the verifier that
/// mints tokens it will accept.
pub fn test_app(pool: &SqlitePool) -> (axum::Router, TokenVerifier) {
    let registry = RoomRegistry::new();
    let gateway = Arc::new(CollabGateway::new(pool.clone(), registry.clone()));
    let verifier = TokenVerifier::new(TEST_SECRET);
    let app_state = AppState {
        pool: pool.clone(),
        registry,
        gateway,
        verifier: verifier.clone(),
    };
    (create_router(app_state), verifier)
}

pub async fn seed_media(pool: &SqlitePool, owner_id: Uuid) -> Media {
    create_media(pool, owner_id, "launch cut", "/uploads/launch.mp4", "video")
        .await
        .expect("seed media")
}

/**
 * Database Schema
 *
 * Programmatic schema creation for the collaboration stores. The statements
 * are idempotent; `migrate` runs at server startup and in tests against an
 * in-memory database.
 */

use sqlx::SqlitePool;

const CREATE_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS media (
        id BLOB PRIMARY KEY,
        owner_id BLOB NOT NULL,
        title TEXT NOT NULL,
        file_path TEXT NOT NULL,
        thumbnail_path TEXT,
        media_type TEXT NOT NULL CHECK (media_type IN ('image', 'video')),
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS access_grants (
        media_id BLOB NOT NULL,
        user_id BLOB NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('reviewer', 'viewer')),
        granted_by BLOB,
        created_at TEXT NOT NULL,
        PRIMARY KEY (media_id, user_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS share_links (
        id BLOB PRIMARY KEY,
        media_id BLOB NOT NULL,
        token TEXT NOT NULL UNIQUE,
        granted_role TEXT NOT NULL CHECK (granted_role IN ('reviewer', 'viewer')),
        created_by BLOB NOT NULL,
        expires_at TEXT,
        max_uses INTEGER,
        uses INTEGER NOT NULL DEFAULT 0,
        invitee_email TEXT,
        share_type TEXT NOT NULL CHECK (share_type IN ('public', 'email')),
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS annotations (
        id BLOB PRIMARY KEY,
        media_id BLOB NOT NULL,
        author_id BLOB NOT NULL,
        author_display_name TEXT NOT NULL,
        x REAL NOT NULL,
        y REAL NOT NULL,
        text TEXT NOT NULL,
        media_timestamp REAL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS comments (
        id BLOB PRIMARY KEY,
        media_id BLOB NOT NULL,
        author_id BLOB NOT NULL,
        author_display_name TEXT NOT NULL,
        text TEXT NOT NULL,
        media_timestamp REAL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_annotations_media ON annotations (media_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_comments_media ON comments (media_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_grants_user ON access_grants (user_id)",
];

/// Create all tables and indexes if they do not exist yet.
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in CREATE_TABLES {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

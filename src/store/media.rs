/**
 * Media Store
 *
 * Database operations for media records. A media item is created on upload
 * (the upload mechanics live outside this core), owned by exactly one
 * principal, and immutable except for deletion by its owner.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

/// A media record as persisted and served to clients.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    /// Path the front end resolves against the upload host.
    pub file_path: String,
    pub thumbnail_path: Option<String>,
    /// Either "image" or "video"; enforced by the schema.
    pub media_type: String,
    pub created_at: DateTime<Utc>,
}

/// Insert a new media record and return it.
pub async fn create_media(
    pool: &SqlitePool,
    owner_id: Uuid,
    title: &str,
    file_path: &str,
    media_type: &str,
) -> Result<Media, sqlx::Error> {
    let media = Media {
        id: Uuid::new_v4(),
        owner_id,
        title: title.to_string(),
        file_path: file_path.to_string(),
        thumbnail_path: None,
        media_type: media_type.to_string(),
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO media (id, owner_id, title, file_path, thumbnail_path, media_type, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(media.id)
    .bind(media.owner_id)
    .bind(&media.title)
    .bind(&media.file_path)
    .bind(&media.thumbnail_path)
    .bind(&media.media_type)
    .bind(media.created_at)
    .execute(pool)
    .await?;

    Ok(media)
}

/// Get a media record by id, or None if absent.
pub async fn get_media(pool: &SqlitePool, id: Uuid) -> Result<Option<Media>, sqlx::Error> {
    sqlx::query_as::<_, Media>(
        r#"
        SELECT id, owner_id, title, file_path, thumbnail_path, media_type, created_at
        FROM media
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// List media the user can see: their own plus anything granted to them,
/// newest first.
pub async fn list_accessible_media(
    pool: &SqlitePool,
    user_id: Uuid,
) -> Result<Vec<Media>, sqlx::Error> {
    sqlx::query_as::<_, Media>(
        r#"
        SELECT m.id, m.owner_id, m.title, m.file_path, m.thumbnail_path, m.media_type, m.created_at
        FROM media m
        WHERE m.owner_id = ?
           OR m.id IN (SELECT media_id FROM access_grants WHERE user_id = ?)
        ORDER BY m.created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Delete a media record together with its collaboration records and grants.
pub async fn delete_media(pool: &SqlitePool, id: Uuid) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM annotations WHERE media_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM comments WHERE media_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM access_grants WHERE media_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM share_links WHERE media_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM media WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

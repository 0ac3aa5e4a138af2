/**
 * Annotation Store
 *
 * Durable spatial annotations keyed by media id. Each record is owned by
 * exactly one author, set from the authenticated connection at creation
 * time and immutable afterwards: text edits are author-only, deletion is
 * author-or-owner, and ordered retrieval backs the room snapshot.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Resolution-independent position on the rendered surface, each axis a
/// fraction in [0, 1] so the point stays valid under viewport resizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub id: Uuid,
    pub media_id: Uuid,
    pub author_id: Uuid,
    pub author_display_name: String,
    #[sqlx(flatten)]
    pub position: Position,
    pub text: String,
    /// Seconds into the media; only meaningful for video.
    pub media_timestamp: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Persist a new annotation and return the full record, including the
/// server-assigned id and timestamp.
pub async fn create_annotation(
    pool: &SqlitePool,
    media_id: Uuid,
    author_id: Uuid,
    author_display_name: &str,
    position: Position,
    text: &str,
    media_timestamp: Option<f64>,
) -> Result<Annotation, sqlx::Error> {
    let annotation = Annotation {
        id: Uuid::new_v4(),
        media_id,
        author_id,
        author_display_name: author_display_name.to_string(),
        position,
        text: text.to_string(),
        media_timestamp,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO annotations (id, media_id, author_id, author_display_name, x, y, text, media_timestamp, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(annotation.id)
    .bind(annotation.media_id)
    .bind(annotation.author_id)
    .bind(&annotation.author_display_name)
    .bind(annotation.position.x)
    .bind(annotation.position.y)
    .bind(&annotation.text)
    .bind(annotation.media_timestamp)
    .bind(annotation.created_at)
    .execute(pool)
    .await?;

    Ok(annotation)
}

pub async fn get_annotation(
    pool: &SqlitePool,
    id: Uuid,
) -> Result<Option<Annotation>, sqlx::Error> {
    sqlx::query_as::<_, Annotation>(
        r#"
        SELECT id, media_id, author_id, author_display_name, x, y, text, media_timestamp, created_at
        FROM annotations
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// All annotations for a media item in creation order.
pub async fn list_annotations(
    pool: &SqlitePool,
    media_id: Uuid,
) -> Result<Vec<Annotation>, sqlx::Error> {
    sqlx::query_as::<_, Annotation>(
        r#"
        SELECT id, media_id, author_id, author_display_name, x, y, text, media_timestamp, created_at
        FROM annotations
        WHERE media_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(media_id)
    .fetch_all(pool)
    .await
}

/// Replace the text of an annotation and return the updated record.
pub async fn update_annotation_text(
    pool: &SqlitePool,
    id: Uuid,
    new_text: &str,
) -> Result<Option<Annotation>, sqlx::Error> {
    sqlx::query("UPDATE annotations SET text = ? WHERE id = ?")
        .bind(new_text)
        .bind(id)
        .execute(pool)
        .await?;

    get_annotation(pool, id).await
}

/// Delete one annotation. Returns true if a row was deleted.
pub async fn delete_annotation(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM annotations WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete every annotation for a media item in one operation.
pub async fn delete_all_annotations(pool: &SqlitePool, media_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM annotations WHERE media_id = ?")
        .bind(media_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

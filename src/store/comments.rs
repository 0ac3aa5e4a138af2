/**
 * Comment Store
 *
 * Time-anchored comments keyed by media id. Same authorization rules as
 * annotations (author-only edits, author-or-owner deletes) but without a
 * spatial position.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub media_id: Uuid,
    pub author_id: Uuid,
    pub author_display_name: String,
    pub text: String,
    /// Seconds into the media; only meaningful for video.
    pub media_timestamp: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Persist a new comment and return the full record.
pub async fn create_comment(
    pool: &SqlitePool,
    media_id: Uuid,
    author_id: Uuid,
    author_display_name: &str,
    text: &str,
    media_timestamp: Option<f64>,
) -> Result<Comment, sqlx::Error> {
    let comment = Comment {
        id: Uuid::new_v4(),
        media_id,
        author_id,
        author_display_name: author_display_name.to_string(),
        text: text.to_string(),
        media_timestamp,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO comments (id, media_id, author_id, author_display_name, text, media_timestamp, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(comment.id)
    .bind(comment.media_id)
    .bind(comment.author_id)
    .bind(&comment.author_display_name)
    .bind(&comment.text)
    .bind(comment.media_timestamp)
    .bind(comment.created_at)
    .execute(pool)
    .await?;

    Ok(comment)
}

pub async fn get_comment(pool: &SqlitePool, id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, media_id, author_id, author_display_name, text, media_timestamp, created_at
        FROM comments
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// All comments for a media item in creation order.
pub async fn list_comments(pool: &SqlitePool, media_id: Uuid) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, media_id, author_id, author_display_name, text, media_timestamp, created_at
        FROM comments
        WHERE media_id = ?
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(media_id)
    .fetch_all(pool)
    .await
}

/// Replace the text of a comment and return the updated record.
pub async fn update_comment_text(
    pool: &SqlitePool,
    id: Uuid,
    new_text: &str,
) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
        .bind(new_text)
        .bind(id)
        .execute(pool)
        .await?;

    get_comment(pool, id).await
}

/// Delete one comment. Returns true if a row was deleted.
pub async fn delete_comment(pool: &SqlitePool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

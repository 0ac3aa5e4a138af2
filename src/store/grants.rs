/**
 * Access Grant Store
 *
 * Persisted grants giving a specific user a non-owner role on a specific
 * media item. Grants are unique on (media_id, user_id) and upserted so the
 * latest granted role wins; they never imply ownership.
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub media_id: Uuid,
    pub user_id: Uuid,
    /// "reviewer" or "viewer".
    pub role: String,
    pub granted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Create or update the grant for (media_id, user_id). Redeeming a second
/// link with a different role updates the row rather than duplicating it.
pub async fn upsert_grant(
    pool: &SqlitePool,
    media_id: Uuid,
    user_id: Uuid,
    role: &str,
    granted_by: Option<Uuid>,
) -> Result<AccessGrant, sqlx::Error> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO access_grants (media_id, user_id, role, granted_by, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (media_id, user_id) DO UPDATE SET
            role = excluded.role,
            granted_by = excluded.granted_by
        "#,
    )
    .bind(media_id)
    .bind(user_id)
    .bind(role)
    .bind(granted_by)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(AccessGrant {
        media_id,
        user_id,
        role: role.to_string(),
        granted_by,
        created_at: now,
    })
}

/// Look up the grant for (media_id, user_id), or None.
pub async fn get_grant(
    pool: &SqlitePool,
    media_id: Uuid,
    user_id: Uuid,
) -> Result<Option<AccessGrant>, sqlx::Error> {
    sqlx::query_as::<_, AccessGrant>(
        r#"
        SELECT media_id, user_id, role, granted_by, created_at
        FROM access_grants
        WHERE media_id = ? AND user_id = ?
        "#,
    )
    .bind(media_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Remove a user's grant on a media item. Returns true if a row was deleted.
pub async fn revoke_grant(
    pool: &SqlitePool,
    media_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM access_grants WHERE media_id = ? AND user_id = ?")
        .bind(media_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/**
 * Share Link Store and Redemption
 *
 * Time- and use-limited bearer tokens that, once redeemed by an
 * authenticated principal, create or update an access grant. An expired or
 * exhausted link is inert: redemption fails with a distinguishable error
 * rather than silently granting access.
 *
 * # Redemption
 *
 * `check_link` is the unauthenticated validity probe used to render a
 * landing page before login. `redeem_link` re-validates everything at
 * grant time - the check/use gap is closed by a guarded use-count
 * increment inside the grant transaction, not by trusting an earlier
 * `check_link` result.
 */

use crate::access::policy::Capability;
use crate::access::resolver::resolve;
use crate::error::CollabError;
use crate::store::grants::{upsert_grant, AccessGrant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub id: Uuid,
    pub media_id: Uuid,
    pub token: String,
    /// "reviewer" or "viewer"; a link never grants ownership.
    pub granted_role: String,
    pub created_by: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i64>,
    pub uses: i64,
    pub invitee_email: Option<String>,
    /// "public" or "email".
    pub share_type: String,
    pub created_at: DateTime<Utc>,
}

/// Successful redemption: the grant the caller can navigate into the room
/// with. `existing_capability` is set when the principal already held an
/// equal-or-greater role and no new grant was written.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub media_id: Uuid,
    pub granted_role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_capability: Option<Capability>,
}

/// Create a share link for a media item. Links with an invitee email are
/// restricted to that address at redemption time.
pub async fn create_share_link(
    pool: &SqlitePool,
    media_id: Uuid,
    granted_role: &str,
    created_by: Uuid,
    expires_at: Option<DateTime<Utc>>,
    max_uses: Option<i64>,
    invitee_email: Option<String>,
) -> Result<ShareLink, sqlx::Error> {
    let invitee_email = invitee_email.map(|e| e.to_lowercase());
    let link = ShareLink {
        id: Uuid::new_v4(),
        media_id,
        token: generate_token(),
        granted_role: granted_role.to_string(),
        created_by,
        expires_at,
        max_uses,
        uses: 0,
        share_type: if invitee_email.is_some() {
            "email".to_string()
        } else {
            "public".to_string()
        },
        invitee_email,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO share_links
            (id, media_id, token, granted_role, created_by, expires_at, max_uses, uses, invitee_email, share_type, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(link.id)
    .bind(link.media_id)
    .bind(&link.token)
    .bind(&link.granted_role)
    .bind(link.created_by)
    .bind(link.expires_at)
    .bind(link.max_uses)
    .bind(link.uses)
    .bind(&link.invitee_email)
    .bind(&link.share_type)
    .bind(link.created_at)
    .execute(pool)
    .await?;

    Ok(link)
}

pub async fn get_link_by_token(
    pool: &SqlitePool,
    token: &str,
) -> Result<Option<ShareLink>, sqlx::Error> {
    sqlx::query_as::<_, ShareLink>(
        r#"
        SELECT id, media_id, token, granted_role, created_by, expires_at, max_uses, uses, invitee_email, share_type, created_at
        FROM share_links
        WHERE token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(pool)
    .await
}

/// Unauthenticated validity probe: NotFound, LinkExpired or LinkExhausted,
/// otherwise the link details needed to render a landing page.
pub async fn check_link(pool: &SqlitePool, token: &str) -> Result<ShareLink, CollabError> {
    let link = get_link_by_token(pool, token)
        .await?
        .ok_or(CollabError::not_found("share link"))?;
    validate_link(&link)?;
    Ok(link)
}

/// Authenticated redemption per the rules above. On success the grant is
/// upserted and the use count incremented atomically.
pub async fn redeem_link(
    pool: &SqlitePool,
    token: &str,
    user_id: Uuid,
    user_email: &str,
) -> Result<Redemption, CollabError> {
    let link = get_link_by_token(pool, token)
        .await?
        .ok_or(CollabError::not_found("share link"))?;
    validate_link(&link)?;

    // Equal-or-greater existing capability short-circuits without writing
    // a grant or spending a use.
    let granted = Capability::from_grant_role(&link.granted_role)
        .ok_or_else(|| CollabError::validation("grantedRole", "unknown role on link"))?;
    let existing = resolve(pool, user_id, link.media_id).await?;
    if existing.capability >= granted {
        return Ok(Redemption {
            media_id: link.media_id,
            granted_role: link.granted_role,
            existing_capability: Some(existing.capability),
        });
    }

    if link.share_type == "email" {
        if let Some(invitee) = &link.invitee_email {
            if !user_email.eq_ignore_ascii_case(invitee) {
                return Err(CollabError::EmailMismatch {
                    expected_email: invitee.clone(),
                });
            }
        }
    }

    let mut tx = pool.begin().await?;

    // Guarded increment: loses the race to a concurrent redeemer rather
    // than exceeding max_uses.
    let incremented = sqlx::query(
        r#"
        UPDATE share_links
        SET uses = uses + 1
        WHERE id = ? AND (max_uses IS NULL OR uses < max_uses)
        "#,
    )
    .bind(link.id)
    .execute(&mut *tx)
    .await?;
    if incremented.rows_affected() == 0 {
        return Err(CollabError::LinkExhausted);
    }

    sqlx::query(
        r#"
        INSERT INTO access_grants (media_id, user_id, role, granted_by, created_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (media_id, user_id) DO UPDATE SET
            role = excluded.role,
            granted_by = excluded.granted_by
        "#,
    )
    .bind(link.media_id)
    .bind(user_id)
    .bind(&link.granted_role)
    .bind(link.created_by)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        "[Share] User {} redeemed link for media {} as {}",
        user_id,
        link.media_id,
        link.granted_role
    );

    Ok(Redemption {
        media_id: link.media_id,
        granted_role: link.granted_role,
        existing_capability: None,
    })
}

/// Grant a role directly, without a link. Backs the owner's explicit
/// grant endpoint and kept next to redemption so both paths share the
/// same upsert semantics.
pub async fn grant_direct(
    pool: &SqlitePool,
    media_id: Uuid,
    user_id: Uuid,
    role: &str,
    granted_by: Uuid,
) -> Result<AccessGrant, sqlx::Error> {
    upsert_grant(pool, media_id, user_id, role, Some(granted_by)).await
}

fn validate_link(link: &ShareLink) -> Result<(), CollabError> {
    if let Some(expires_at) = link.expires_at {
        if Utc::now() > expires_at {
            return Err(CollabError::LinkExpired);
        }
    }
    if let Some(max_uses) = link.max_uses {
        if link.uses >= max_uses {
            return Err(CollabError::LinkExhausted);
        }
    }
    Ok(())
}

fn generate_token() -> String {
    format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

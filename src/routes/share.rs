/**
 * Share Link Handlers
 *
 * REST surface for creating and redeeming share links. Creation is
 * owner-only; checking is unauthenticated so a landing page can be
 * rendered before login; acceptance requires an authenticated principal
 * and goes through the transactional redemption in the store.
 */

use crate::auth::middleware::AuthUser;
use crate::error::CollabError;
use crate::server::state::AppState;
use crate::store::share_links;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareLinkRequest {
    pub role: String,
    pub expires_in_days: Option<i64>,
    pub max_uses: Option<i64>,
    pub invitee_email: Option<String>,
}

/// Handle share link creation (POST /media/{id}/share-links)
pub async fn create_share_link(
    State(app_state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(media_id): Path<Uuid>,
    Json(request): Json<CreateShareLinkRequest>,
) -> Result<Json<share_links::ShareLink>, CollabError> {
    let access = crate::access::resolver::resolve(&app_state.pool, principal.id, media_id).await?;
    let media = access.media.ok_or(CollabError::not_found("media"))?;
    if media.owner_id != principal.id {
        return Err(CollabError::access_denied(
            "only the owner can create share links",
        ));
    }

    // A link never grants ownership.
    if !matches!(request.role.as_str(), "reviewer" | "viewer") {
        return Err(CollabError::validation(
            "role",
            "role must be 'reviewer' or 'viewer'",
        ));
    }
    if let Some(max_uses) = request.max_uses {
        if max_uses < 1 {
            return Err(CollabError::validation("maxUses", "must be at least 1"));
        }
    }
    if let Some(days) = request.expires_in_days {
        if days < 1 {
            return Err(CollabError::validation("expiresInDays", "must be at least 1"));
        }
    }

    let expires_at = request.expires_in_days.map(|days| Utc::now() + Duration::days(days));
    let link = share_links::create_share_link(
        &app_state.pool,
        media_id,
        &request.role,
        principal.id,
        expires_at,
        request.max_uses,
        request.invitee_email,
    )
    .await?;

    tracing::info!(
        "[Share] {} created {} link for media {}",
        principal.display_name,
        link.share_type,
        media_id
    );
    Ok(Json(link))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGrantRequest {
    pub user_id: Uuid,
    pub role: String,
}

/// Handle direct grant (POST /media/{id}/grants)
///
/// The owner's explicit share flow: grants a role to a known user without
/// a link, with the same upsert semantics as link redemption.
pub async fn create_grant(
    State(app_state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(media_id): Path<Uuid>,
    Json(request): Json<CreateGrantRequest>,
) -> Result<Json<crate::store::grants::AccessGrant>, CollabError> {
    let access = crate::access::resolver::resolve(&app_state.pool, principal.id, media_id).await?;
    let media = access.media.ok_or(CollabError::not_found("media"))?;
    if media.owner_id != principal.id {
        return Err(CollabError::access_denied("only the owner can grant access"));
    }
    if !matches!(request.role.as_str(), "reviewer" | "viewer") {
        return Err(CollabError::validation(
            "role",
            "role must be 'reviewer' or 'viewer'",
        ));
    }
    if request.user_id == principal.id {
        return Err(CollabError::validation(
            "userId",
            "the owner already has full access",
        ));
    }

    let grant = share_links::grant_direct(
        &app_state.pool,
        media_id,
        request.user_id,
        &request.role,
        principal.id,
    )
    .await?;

    tracing::info!(
        "[Share] {} granted {} on media {} to {}",
        principal.display_name,
        grant.role,
        media_id,
        request.user_id
    );
    Ok(Json(grant))
}

/// Handle share link check (GET /share-links/{token}/check)
///
/// Unauthenticated: the landing page needs to know whether the link is
/// worth logging in for. Expired and exhausted links are distinguishable
/// by status and code.
pub async fn check_share_link(
    State(app_state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<serde_json::Value>, CollabError> {
    let link = share_links::check_link(&app_state.pool, &token).await?;
    Ok(Json(serde_json::json!({
        "mediaId": link.media_id,
        "grantedRole": link.granted_role,
        "shareType": link.share_type,
        "inviteeEmail": link.invitee_email,
        "expiresAt": link.expires_at,
    })))
}

/// Handle share link acceptance (POST /share-links/{token}/accept)
pub async fn accept_share_link(
    State(app_state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(token): Path<String>,
) -> Result<Json<share_links::Redemption>, CollabError> {
    let redemption = share_links::redeem_link(
        &app_state.pool,
        &token,
        principal.id,
        &principal.email,
    )
    .await?;
    Ok(Json(redemption))
}

/**
 * Media Handlers
 *
 * REST handlers for the media library and the initial-load record fetch.
 * These mirror what the room snapshot carries, so a client that prefers a
 * plain fetch before opening a socket sees exactly the same data.
 *
 * # Access
 *
 * Every handler resolves the caller's capability fresh. A media id that
 * does not exist is reported as 404 before any access decision, so probing
 * cannot distinguish "never existed" from "deleted", but a denied caller
 * always knows the item exists.
 */

use crate::access::policy::Action;
use crate::access::resolver;
use crate::auth::middleware::AuthUser;
use crate::error::CollabError;
use crate::gateway::events::ServerEvent;
use crate::server::state::AppState;
use crate::store::{annotations, comments, media};
use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

/// Handle media list (GET /media)
///
/// Everything the caller can see: owned items plus granted ones, newest
/// first.
pub async fn list_media(
    State(app_state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<media::Media>>, CollabError> {
    let items = media::list_accessible_media(&app_state.pool, principal.id).await?;
    Ok(Json(items))
}

/// Handle single media fetch (GET /media/{id})
pub async fn get_media(
    State(app_state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<media::Media>, CollabError> {
    let access = resolver::resolve(&app_state.pool, principal.id, id).await?;
    let media = access.media.ok_or(CollabError::not_found("media"))?;
    if !access.capability.allows(Action::View) {
        return Err(CollabError::access_denied("no access to this media"));
    }
    Ok(Json(media))
}

/// Handle media deletion (DELETE /media/{id})
///
/// Owner only. Removes the record together with its annotations, comments,
/// grants and share links, then tells any live room to drop its state.
pub async fn delete_media(
    State(app_state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, CollabError> {
    let access = resolver::resolve(&app_state.pool, principal.id, id).await?;
    let media = access.media.ok_or(CollabError::not_found("media"))?;
    if media.owner_id != principal.id {
        return Err(CollabError::access_denied("only the owner can delete media"));
    }

    media::delete_media(&app_state.pool, id).await?;
    app_state
        .registry
        .broadcast(id, ServerEvent::AnnotationsCleared, None);

    tracing::info!("[Media] {} deleted media {}", principal.display_name, id);
    Ok(Json(serde_json::json!({ "deleted": id })))
}

/// Handle comment fetch (GET /comments/{media_id})
pub async fn list_comments(
    State(app_state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(media_id): Path<Uuid>,
) -> Result<Json<Vec<comments::Comment>>, CollabError> {
    require_view(&app_state, principal.id, media_id).await?;
    let records = comments::list_comments(&app_state.pool, media_id).await?;
    Ok(Json(records))
}

/// Handle annotation fetch (GET /comments/{media_id}/annotations)
pub async fn list_annotations(
    State(app_state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(media_id): Path<Uuid>,
) -> Result<Json<Vec<annotations::Annotation>>, CollabError> {
    require_view(&app_state, principal.id, media_id).await?;
    let records = annotations::list_annotations(&app_state.pool, media_id).await?;
    Ok(Json(records))
}

async fn require_view(
    app_state: &AppState,
    user_id: Uuid,
    media_id: Uuid,
) -> Result<(), CollabError> {
    let access = resolver::resolve(&app_state.pool, user_id, media_id).await?;
    if access.media.is_none() {
        return Err(CollabError::not_found("media"));
    }
    if !access.capability.allows(Action::View) {
        return Err(CollabError::access_denied("no access to this media"));
    }
    Ok(())
}

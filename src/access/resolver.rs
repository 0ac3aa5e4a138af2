/**
 * Access Resolver
 *
 * Computes a principal's effective capability for one media item from
 * owned data: ownership first, then the access-grant table. The resolver
 * is a pure read - it is called once per mutating event so that a revoked
 * grant takes effect immediately, and it deliberately has no cache.
 */

use crate::access::policy::Capability;
use crate::error::CollabError;
use crate::store::grants::get_grant;
use crate::store::media::{get_media, Media};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Result of resolving a principal against a media item.
///
/// `media` is `None` when the media id does not exist, which callers must
/// surface as "not found" rather than "forbidden".
#[derive(Debug, Clone)]
pub struct ResolvedAccess {
    pub capability: Capability,
    pub media: Option<Media>,
}

/// Resolve the effective capability of `user_id` on `media_id`.
///
/// First match wins: missing media => `None`; ownership => `Owner`;
/// otherwise the stored grant role, or `None` without one.
pub async fn resolve(
    pool: &SqlitePool,
    user_id: Uuid,
    media_id: Uuid,
) -> Result<ResolvedAccess, CollabError> {
    let Some(media) = get_media(pool, media_id).await? else {
        return Ok(ResolvedAccess {
            capability: Capability::None,
            media: None,
        });
    };

    if media.owner_id == user_id {
        return Ok(ResolvedAccess {
            capability: Capability::Owner,
            media: Some(media),
        });
    }

    let capability = match get_grant(pool, media_id, user_id).await? {
        Some(grant) => Capability::from_grant_role(&grant.role).unwrap_or(Capability::None),
        None => Capability::None,
    };

    Ok(ResolvedAccess {
        capability,
        media: Some(media),
    })
}

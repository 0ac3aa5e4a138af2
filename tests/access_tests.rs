/**
 * Access Resolution and Store Tests
 *
 * Resolver precedence, media listing, and the cascading delete that keeps
 * collaboration records from outliving their media.
 */

mod common;

use common::{principal, seed_media, test_pool};
use reviewroom::access::policy::Capability;
use reviewroom::access::resolver::resolve;
use reviewroom::store::annotations::{create_annotation, list_annotations, Position};
use reviewroom::store::grants::{revoke_grant, upsert_grant};
use reviewroom::store::media::{delete_media, list_accessible_media};
use reviewroom::store::share_links::{create_share_link, get_link_by_token};
use uuid::Uuid;

#[tokio::test]
async fn test_resolver_precedence() {
    let pool = test_pool().await;
    let owner = principal("Owner");
    let media = seed_media(&pool, owner.id).await;

    // Missing media: capability None and no record to report.
    let missing = resolve(&pool, owner.id, Uuid::new_v4()).await.unwrap();
    assert_eq!(missing.capability, Capability::None);
    assert!(missing.media.is_none());

    // Ownership beats any grant.
    upsert_grant(&pool, media.id, owner.id, "viewer", None)
        .await
        .unwrap();
    let owned = resolve(&pool, owner.id, media.id).await.unwrap();
    assert_eq!(owned.capability, Capability::Owner);

    // Grant role for non-owners; none without a grant.
    let guest = principal("Guest");
    assert_eq!(
        resolve(&pool, guest.id, media.id).await.unwrap().capability,
        Capability::None
    );
    upsert_grant(&pool, media.id, guest.id, "reviewer", Some(owner.id))
        .await
        .unwrap();
    assert_eq!(
        resolve(&pool, guest.id, media.id).await.unwrap().capability,
        Capability::Reviewer
    );

    // Revocation drops straight back to none.
    revoke_grant(&pool, media.id, guest.id).await.unwrap();
    assert_eq!(
        resolve(&pool, guest.id, media.id).await.unwrap().capability,
        Capability::None
    );
}

#[tokio::test]
async fn test_accessible_media_covers_owned_and_granted() {
    let pool = test_pool().await;
    let alice = principal("Alice");
    let bob = principal("Bob");

    let alices = seed_media(&pool, alice.id).await;
    let bobs = seed_media(&pool, bob.id).await;
    upsert_grant(&pool, bobs.id, alice.id, "viewer", Some(bob.id))
        .await
        .unwrap();

    let visible = list_accessible_media(&pool, alice.id).await.unwrap();
    let ids: Vec<Uuid> = visible.iter().map(|m| m.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&alices.id));
    assert!(ids.contains(&bobs.id));

    // Bob sees only his own.
    let visible = list_accessible_media(&pool, bob.id).await.unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, bobs.id);
}

#[tokio::test]
async fn test_media_deletion_cascades() {
    let pool = test_pool().await;
    let owner = principal("Owner");
    let media = seed_media(&pool, owner.id).await;

    create_annotation(
        &pool,
        media.id,
        owner.id,
        &owner.display_name,
        Position { x: 0.2, y: 0.8 },
        "doomed",
        None,
    )
    .await
    .unwrap();
    let link = create_share_link(&pool, media.id, "viewer", owner.id, None, None, None)
        .await
        .unwrap();
    let guest = principal("Guest");
    upsert_grant(&pool, media.id, guest.id, "viewer", Some(owner.id))
        .await
        .unwrap();

    delete_media(&pool, media.id).await.unwrap();

    assert!(list_annotations(&pool, media.id).await.unwrap().is_empty());
    assert!(get_link_by_token(&pool, &link.token).await.unwrap().is_none());
    let access = resolve(&pool, guest.id, media.id).await.unwrap();
    assert!(access.media.is_none());
}

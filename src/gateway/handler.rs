/**
 * Collaboration Gateway
 *
 * Transport-independent core of the room protocol. The WebSocket layer
 * decodes frames into `ClientEvent`s and feeds them here; everything that
 * matters - capability checks, persistence, fan-out - happens in this
 * module, so the whole protocol is testable without a socket.
 *
 * # Ordering and failure rules
 *
 * Mutations commit to the store before any broadcast. A failed write
 * produces a rejection to the caller and nothing else: no event a client
 * ever receives describes state the store does not hold. Rejections go to
 * the offending session only, never to the room.
 *
 * Authorization is two-tier. Every mutation first checks the acting
 * principal's room capability (resolved fresh from owned data, so a
 * revoked grant takes effect on the next event), then record edits and
 * deletes additionally check authorship against the stored record.
 */

use crate::access::policy::{Action, Capability};
use crate::access::resolver::{self, ResolvedAccess};
use crate::auth::verifier::Principal;
use crate::error::CollabError;
use crate::gateway::events::{
    normalize_annotation, normalize_comment, ClientEvent, ServerEvent,
};
use crate::room::registry::{RoomMember, RoomRegistry};
use crate::store::{annotations, comments};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Per-connection state owned by the transport task.
#[derive(Debug)]
pub struct RoomSession {
    pub connection_id: Uuid,
    pub principal: Principal,
    pub joined_media: Option<Uuid>,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl RoomSession {
    pub fn new(principal: Principal, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            principal,
            joined_media: None,
            sender,
        }
    }

    /// Deliver an event to this session only. A closed receiver means the
    /// connection is tearing down, which is not an error here.
    pub fn reply(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

/// Shared protocol core. One instance serves every connection.
pub struct CollabGateway {
    pool: SqlitePool,
    registry: RoomRegistry,
}

impl CollabGateway {
    pub fn new(pool: SqlitePool, registry: RoomRegistry) -> Self {
        Self { pool, registry }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Process one inbound event for a session. Rejections are delivered to
    /// the session before this returns; successful mutations are committed
    /// and broadcast.
    pub async fn handle(&self, session: &mut RoomSession, event: ClientEvent) {
        match event {
            ClientEvent::Join { media_id } => {
                if let Err(err) = self.join(session, media_id).await {
                    session.reply(rejection(err, None, Some(media_id)));
                }
            }
            ClientEvent::Leave { media_id } => {
                self.leave(session, media_id);
            }
            ClientEvent::CreateAnnotation {
                media_id,
                position,
                coordinates,
                data,
                text,
                media_timestamp,
            } => {
                let result = self
                    .create_annotation(
                        session,
                        media_id,
                        position,
                        coordinates,
                        data,
                        text,
                        media_timestamp,
                    )
                    .await;
                if let Err(err) = result {
                    session.reply(rejection(err, None, Some(media_id)));
                }
            }
            ClientEvent::CreateComment {
                media_id,
                text,
                data,
                media_timestamp,
            } => {
                let result = self
                    .create_comment(session, media_id, text, data, media_timestamp)
                    .await;
                if let Err(err) = result {
                    session.reply(rejection(err, None, Some(media_id)));
                }
            }
            ClientEvent::EditAnnotation { id, new_text } => {
                if let Err(err) = self.edit_annotation(session, id, &new_text).await {
                    session.reply(rejection(err, Some(id), None));
                }
            }
            ClientEvent::EditComment { id, new_text } => {
                if let Err(err) = self.edit_comment(session, id, &new_text).await {
                    session.reply(rejection(err, Some(id), None));
                }
            }
            ClientEvent::DeleteAnnotation { id } => {
                if let Err(err) = self.delete_annotation(session, id).await {
                    session.reply(rejection(err, Some(id), None));
                }
            }
            ClientEvent::DeleteComment { id } => {
                if let Err(err) = self.delete_comment(session, id).await {
                    session.reply(rejection(err, Some(id), None));
                }
            }
            ClientEvent::ClearAllAnnotations { media_id } => {
                if let Err(err) = self.clear_all_annotations(session, media_id).await {
                    session.reply(rejection(err, None, Some(media_id)));
                }
            }
            ClientEvent::TypingIndicator { media_id } => {
                if let Err(err) = self.ephemeral(
                    session,
                    media_id,
                    ServerEvent::TypingIndicator {
                        media_id,
                        user_id: session.principal.id,
                        user_name: session.principal.display_name.clone(),
                    },
                )
                .await
                {
                    session.reply(rejection(err, None, Some(media_id)));
                }
            }
            ClientEvent::PresenceHeartbeat { media_id } => {
                if let Err(err) = self.ephemeral(
                    session,
                    media_id,
                    ServerEvent::PresenceHeartbeat {
                        media_id,
                        user_id: session.principal.id,
                        user_name: session.principal.display_name.clone(),
                    },
                )
                .await
                {
                    session.reply(rejection(err, None, Some(media_id)));
                }
            }
        }
    }

    /// Tear down a session: remove it from every room and announce the
    /// departure to each. Called by the transport on socket close.
    pub fn disconnect(&self, session: &RoomSession) {
        let left = self.registry.remove_connection(session.connection_id);
        for media_id in left {
            self.registry.broadcast(
                media_id,
                ServerEvent::PresenceLeft {
                    user_id: session.principal.id,
                    user_name: session.principal.display_name.clone(),
                },
                None,
            );
        }
        tracing::info!(
            "[Room] Session {} ({}) disconnected",
            session.connection_id,
            session.principal.display_name
        );
    }

    async fn join(&self, session: &mut RoomSession, media_id: Uuid) -> Result<(), CollabError> {
        let access = self.require(session, media_id, Action::View).await?;

        // A session is joined to at most one room. Switching rooms leaves
        // the previous one, with its departure announced, so membership
        // always matches `joined_media`.
        if let Some(previous) = session.joined_media {
            if previous != media_id {
                self.leave(session, previous);
            }
        }

        let annotation_list = annotations::list_annotations(&self.pool, media_id).await?;
        let comment_list = comments::list_comments(&self.pool, media_id).await?;

        self.registry.join(
            media_id,
            RoomMember {
                connection_id: session.connection_id,
                user_id: session.principal.id,
                user_name: session.principal.display_name.clone(),
                sender: session.sender.clone(),
            },
        );
        session.joined_media = Some(media_id);

        // Snapshot to the joiner only; presence to everyone else. The
        // snapshot is taken before any later mutation can broadcast, so a
        // joining client starts from a state every live event builds on.
        session.reply(ServerEvent::RoomSnapshot {
            media_id,
            annotations: annotation_list,
            comments: comment_list,
        });
        self.registry.broadcast(
            media_id,
            ServerEvent::PresenceJoined {
                user_id: session.principal.id,
                user_name: session.principal.display_name.clone(),
            },
            Some(session.connection_id),
        );

        tracing::info!(
            "[Room] {} joined room {} as {}",
            session.principal.display_name,
            media_id,
            access.capability.as_str()
        );
        Ok(())
    }

    fn leave(&self, session: &mut RoomSession, media_id: Uuid) {
        if self.registry.leave(media_id, session.connection_id) {
            self.registry.broadcast(
                media_id,
                ServerEvent::PresenceLeft {
                    user_id: session.principal.id,
                    user_name: session.principal.display_name.clone(),
                },
                None,
            );
        }
        if session.joined_media == Some(media_id) {
            session.joined_media = None;
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn create_annotation(
        &self,
        session: &RoomSession,
        media_id: Uuid,
        position: Option<annotations::Position>,
        coordinates: Option<annotations::Position>,
        data: Option<crate::gateway::events::DraftFields>,
        text: Option<String>,
        media_timestamp: Option<f64>,
    ) -> Result<(), CollabError> {
        self.require(session, media_id, Action::Annotate).await?;
        let draft = normalize_annotation(position, coordinates, data, text, media_timestamp)?;

        let annotation = annotations::create_annotation(
            &self.pool,
            media_id,
            session.principal.id,
            &session.principal.display_name,
            draft.position,
            &draft.text,
            draft.media_timestamp,
        )
        .await?;

        // Everyone in the room, author included: the author's own UI
        // confirms the write from the same event as everyone else.
        self.registry
            .broadcast(media_id, ServerEvent::AnnotationAdded(annotation), None);
        Ok(())
    }

    async fn create_comment(
        &self,
        session: &RoomSession,
        media_id: Uuid,
        text: Option<String>,
        data: Option<crate::gateway::events::DraftFields>,
        media_timestamp: Option<f64>,
    ) -> Result<(), CollabError> {
        self.require(session, media_id, Action::Annotate).await?;
        let draft = normalize_comment(text, data, media_timestamp)?;

        let comment = comments::create_comment(
            &self.pool,
            media_id,
            session.principal.id,
            &session.principal.display_name,
            &draft.text,
            draft.media_timestamp,
        )
        .await?;

        self.registry
            .broadcast(media_id, ServerEvent::CommentAdded(comment), None);
        Ok(())
    }

    async fn edit_annotation(
        &self,
        session: &RoomSession,
        id: Uuid,
        new_text: &str,
    ) -> Result<(), CollabError> {
        let new_text = non_empty(new_text)?;
        let record = annotations::get_annotation(&self.pool, id)
            .await?
            .ok_or_else(|| CollabError::not_found("annotation"))?;

        self.require(session, record.media_id, Action::Annotate).await?;
        if record.author_id != session.principal.id {
            return Err(CollabError::RecordAuthorMismatch { id });
        }

        let updated = annotations::update_annotation_text(&self.pool, id, new_text)
            .await?
            .ok_or_else(|| CollabError::not_found("annotation"))?;

        self.registry.broadcast(
            record.media_id,
            ServerEvent::AnnotationEdited(updated),
            None,
        );
        Ok(())
    }

    async fn edit_comment(
        &self,
        session: &RoomSession,
        id: Uuid,
        new_text: &str,
    ) -> Result<(), CollabError> {
        let new_text = non_empty(new_text)?;
        let record = comments::get_comment(&self.pool, id)
            .await?
            .ok_or_else(|| CollabError::not_found("comment"))?;

        self.require(session, record.media_id, Action::Annotate).await?;
        if record.author_id != session.principal.id {
            return Err(CollabError::RecordAuthorMismatch { id });
        }

        let updated = comments::update_comment_text(&self.pool, id, new_text)
            .await?
            .ok_or_else(|| CollabError::not_found("comment"))?;

        self.registry
            .broadcast(record.media_id, ServerEvent::CommentEdited(updated), None);
        Ok(())
    }

    async fn delete_annotation(&self, session: &RoomSession, id: Uuid) -> Result<(), CollabError> {
        let record = annotations::get_annotation(&self.pool, id)
            .await?
            .ok_or_else(|| CollabError::not_found("annotation"))?;

        self.authorize_removal(session, record.media_id, record.author_id, id)
            .await?;

        if annotations::delete_annotation(&self.pool, id).await? {
            self.registry.broadcast(
                record.media_id,
                ServerEvent::AnnotationDeleted { id },
                None,
            );
        }
        Ok(())
    }

    async fn delete_comment(&self, session: &RoomSession, id: Uuid) -> Result<(), CollabError> {
        let record = comments::get_comment(&self.pool, id)
            .await?
            .ok_or_else(|| CollabError::not_found("comment"))?;

        self.authorize_removal(session, record.media_id, record.author_id, id)
            .await?;

        if comments::delete_comment(&self.pool, id).await? {
            self.registry
                .broadcast(record.media_id, ServerEvent::CommentDeleted { id }, None);
        }
        Ok(())
    }

    async fn clear_all_annotations(
        &self,
        session: &RoomSession,
        media_id: Uuid,
    ) -> Result<(), CollabError> {
        // A bulk wipe destroys other participants' work, so it is owner-only
        // rather than gated on annotate like single-record deletion.
        self.require(session, media_id, Action::Delete).await?;

        let removed = annotations::delete_all_annotations(&self.pool, media_id).await?;
        self.registry
            .broadcast(media_id, ServerEvent::AnnotationsCleared, None);

        tracing::info!(
            "[Room] {} cleared {} annotations in room {}",
            session.principal.display_name,
            removed,
            media_id
        );
        Ok(())
    }

    /// Broadcast-only events: never persisted, sender excluded.
    async fn ephemeral(
        &self,
        session: &RoomSession,
        media_id: Uuid,
        event: ServerEvent,
    ) -> Result<(), CollabError> {
        self.require(session, media_id, Action::View).await?;
        self.registry
            .broadcast(media_id, event, Some(session.connection_id));
        Ok(())
    }

    /// Resolve the session's capability on `media_id` and require `action`.
    ///
    /// A missing media id is reported as not-found, never as a denial, so a
    /// client cannot distinguish "deleted" from "never existed" but can
    /// always distinguish both from "exists and you lack access".
    async fn require(
        &self,
        session: &RoomSession,
        media_id: Uuid,
        action: Action,
    ) -> Result<ResolvedAccess, CollabError> {
        let access = resolver::resolve(&self.pool, session.principal.id, media_id).await?;
        if access.media.is_none() {
            return Err(CollabError::not_found("media"));
        }
        if !access.capability.allows(action) {
            tracing::warn!(
                "[Room] {} denied {:?} on {} (capability: {})",
                session.principal.display_name,
                action,
                media_id,
                access.capability.as_str()
            );
            return Err(CollabError::access_denied(format!(
                "insufficient access for {:?}",
                action
            )));
        }
        Ok(access)
    }

    /// Record deletion rule: the media owner may remove anything, the
    /// author may always remove their own record, even after their grant
    /// was revoked or downgraded.
    async fn authorize_removal(
        &self,
        session: &RoomSession,
        media_id: Uuid,
        author_id: Uuid,
        record_id: Uuid,
    ) -> Result<(), CollabError> {
        let access = resolver::resolve(&self.pool, session.principal.id, media_id).await?;
        if access.media.is_none() {
            return Err(CollabError::not_found("media"));
        }
        if access.capability >= Capability::Owner || author_id == session.principal.id {
            return Ok(());
        }
        Err(CollabError::RecordAuthorMismatch { id: record_id })
    }
}

fn non_empty(text: &str) -> Result<&str, CollabError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CollabError::validation("newText", "text must not be empty"));
    }
    Ok(text)
}

/// Map a failure to the wire event delivered to the offending session.
///
/// Room-level denials with a known media id use the dedicated
/// `accessDenied` event; everything else, including record-scoped denials,
/// is a `requestFailed` carrying the stable error code and, when known,
/// the record id the client should unwind.
fn rejection(err: CollabError, id: Option<Uuid>, media_id: Option<Uuid>) -> ServerEvent {
    match (&err, media_id) {
        (CollabError::AccessDenied { reason }, Some(media_id)) => ServerEvent::AccessDenied {
            media_id,
            reason: reason.clone(),
        },
        _ => ServerEvent::RequestFailed {
            code: err.code().into(),
            reason: err.to_string(),
            id,
            media_id,
        },
    }
}

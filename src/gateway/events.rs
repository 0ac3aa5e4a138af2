/**
 * Room Event Protocol
 *
 * The wire contract between clients and the collaboration core. Events are
 * internally tagged JSON (`{"event": "...", ...}`) with camelCase fields;
 * the names and field sets here are the contract the front end is built
 * against.
 *
 * # Ingress normalization
 *
 * Clients historically sent annotation payloads in more than one shape -
 * the position under `position`, `coordinates`, or `data.position`, the
 * text under `text` or `data.text`. Normalization happens here, on
 * receipt, into one canonical draft; alternate shapes never leak past
 * this module.
 */

use crate::error::CollabError;
use crate::store::annotations::{Annotation, Position};
use crate::store::comments::Comment;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Alternate nesting some clients use for annotation payload fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftFields {
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Inbound events a connected client may emit.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    Join {
        media_id: Uuid,
    },
    Leave {
        media_id: Uuid,
    },
    CreateAnnotation {
        media_id: Uuid,
        #[serde(default)]
        position: Option<Position>,
        #[serde(default)]
        coordinates: Option<Position>,
        #[serde(default)]
        data: Option<DraftFields>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        media_timestamp: Option<f64>,
    },
    CreateComment {
        media_id: Uuid,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        data: Option<DraftFields>,
        #[serde(default)]
        media_timestamp: Option<f64>,
    },
    EditAnnotation {
        id: Uuid,
        new_text: String,
    },
    EditComment {
        id: Uuid,
        new_text: String,
    },
    DeleteAnnotation {
        id: Uuid,
    },
    DeleteComment {
        id: Uuid,
    },
    ClearAllAnnotations {
        media_id: Uuid,
    },
    TypingIndicator {
        media_id: Uuid,
    },
    PresenceHeartbeat {
        media_id: Uuid,
    },
}

/// Outbound events the gateway emits to sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Full current state of a room, sent to a joining session only. A
    /// freshly joined or reconnected client needs no separate fetch to be
    /// consistent with live participants.
    RoomSnapshot {
        media_id: Uuid,
        annotations: Vec<Annotation>,
        comments: Vec<Comment>,
    },
    PresenceJoined {
        user_id: Uuid,
        user_name: String,
    },
    PresenceLeft {
        user_id: Uuid,
        user_name: String,
    },
    AnnotationAdded(Annotation),
    AnnotationEdited(Annotation),
    AnnotationDeleted {
        id: Uuid,
    },
    AnnotationsCleared,
    CommentAdded(Comment),
    CommentEdited(Comment),
    CommentDeleted {
        id: Uuid,
    },
    /// Broadcast-only, never persisted; receivers apply a local expiry.
    TypingIndicator {
        media_id: Uuid,
        user_id: Uuid,
        user_name: String,
    },
    PresenceHeartbeat {
        media_id: Uuid,
        user_id: Uuid,
        user_name: String,
    },
    /// Room-level capability rejection, sent to the caller only.
    AccessDenied {
        media_id: Uuid,
        reason: String,
    },
    /// Any other rejection, sent to the caller only. `id` names the record
    /// for record-scoped failures so the client can clear a specific
    /// pending UI state.
    RequestFailed {
        code: String,
        reason: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<Uuid>,
        #[serde(skip_serializing_if = "Option::is_none")]
        media_id: Option<Uuid>,
    },
}

/// Canonical annotation creation payload after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDraft {
    pub position: Position,
    pub text: String,
    pub media_timestamp: Option<f64>,
}

/// Canonical comment creation payload after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentDraft {
    pub text: String,
    pub media_timestamp: Option<f64>,
}

/// Collapse the accepted annotation payload shapes into one draft.
pub fn normalize_annotation(
    position: Option<Position>,
    coordinates: Option<Position>,
    data: Option<DraftFields>,
    text: Option<String>,
    media_timestamp: Option<f64>,
) -> Result<AnnotationDraft, CollabError> {
    let data = data.unwrap_or_default();
    let position = position
        .or(coordinates)
        .or(data.position)
        .ok_or_else(|| CollabError::validation("position", "annotation position is required"))?;

    if !(0.0..=1.0).contains(&position.x) || !(0.0..=1.0).contains(&position.y) {
        return Err(CollabError::validation(
            "position",
            "coordinates must be fractions in [0, 1]",
        ));
    }

    let text = normalize_text(text.or(data.text))?;

    Ok(AnnotationDraft {
        position,
        text,
        media_timestamp,
    })
}

/// Validate and trim a comment payload.
pub fn normalize_comment(
    text: Option<String>,
    data: Option<DraftFields>,
    media_timestamp: Option<f64>,
) -> Result<CommentDraft, CollabError> {
    let text = normalize_text(text.or(data.unwrap_or_default().text))?;
    Ok(CommentDraft {
        text,
        media_timestamp,
    })
}

fn normalize_text(text: Option<String>) -> Result<String, CollabError> {
    let text = text.map(|t| t.trim().to_string()).unwrap_or_default();
    if text.is_empty() {
        return Err(CollabError::validation("text", "text must not be empty"));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_join_event_wire_shape() {
        let media_id = Uuid::new_v4();
        let json = format!(r#"{{"event": "join", "mediaId": "{}"}}"#, media_id);
        let event: ClientEvent = serde_json::from_str(&json).unwrap();
        assert_matches!(event, ClientEvent::Join { media_id: m } if m == media_id);
    }

    #[test]
    fn test_create_annotation_accepts_canonical_shape() {
        let json = format!(
            r#"{{"event": "createAnnotation", "mediaId": "{}",
                 "position": {{"x": 0.5, "y": 0.25}}, "text": "look here",
                 "mediaTimestamp": 12.0}}"#,
            Uuid::new_v4()
        );
        let event: ClientEvent = serde_json::from_str(&json).unwrap();
        let ClientEvent::CreateAnnotation {
            position,
            coordinates,
            data,
            text,
            media_timestamp,
            ..
        } = event
        else {
            panic!("wrong variant");
        };
        let draft =
            normalize_annotation(position, coordinates, data, text, media_timestamp).unwrap();
        assert_eq!(draft.position, Position { x: 0.5, y: 0.25 });
        assert_eq!(draft.text, "look here");
        assert_eq!(draft.media_timestamp, Some(12.0));
    }

    #[test]
    fn test_create_annotation_accepts_coordinates_shape() {
        let json = format!(
            r#"{{"event": "createAnnotation", "mediaId": "{}",
                 "coordinates": {{"x": 0.1, "y": 0.9}}, "text": "alt"}}"#,
            Uuid::new_v4()
        );
        let event: ClientEvent = serde_json::from_str(&json).unwrap();
        let ClientEvent::CreateAnnotation {
            position,
            coordinates,
            data,
            text,
            media_timestamp,
            ..
        } = event
        else {
            panic!("wrong variant");
        };
        let draft =
            normalize_annotation(position, coordinates, data, text, media_timestamp).unwrap();
        assert_eq!(draft.position, Position { x: 0.1, y: 0.9 });
    }

    #[test]
    fn test_create_annotation_accepts_nested_data_shape() {
        let json = format!(
            r#"{{"event": "createAnnotation", "mediaId": "{}",
                 "data": {{"position": {{"x": 0.3, "y": 0.4}}, "text": "nested"}}}}"#,
            Uuid::new_v4()
        );
        let event: ClientEvent = serde_json::from_str(&json).unwrap();
        let ClientEvent::CreateAnnotation {
            position,
            coordinates,
            data,
            text,
            media_timestamp,
            ..
        } = event
        else {
            panic!("wrong variant");
        };
        let draft =
            normalize_annotation(position, coordinates, data, text, media_timestamp).unwrap();
        assert_eq!(draft.position, Position { x: 0.3, y: 0.4 });
        assert_eq!(draft.text, "nested");
    }

    #[test]
    fn test_normalize_rejects_out_of_range_position() {
        let result = normalize_annotation(
            Some(Position { x: 1.5, y: 0.5 }),
            None,
            None,
            Some("x".into()),
            None,
        );
        assert_matches!(result, Err(CollabError::Validation { .. }));
    }

    #[test]
    fn test_normalize_rejects_missing_position() {
        let result = normalize_annotation(None, None, None, Some("x".into()), None);
        assert_matches!(result, Err(CollabError::Validation { .. }));
    }

    #[test]
    fn test_normalize_comment_rejects_blank_text() {
        let result = normalize_comment(Some("   ".into()), None, None);
        assert_matches!(result, Err(CollabError::Validation { .. }));
    }

    #[test]
    fn test_server_event_tag_names() {
        let cleared = serde_json::to_value(&ServerEvent::AnnotationsCleared).unwrap();
        assert_eq!(cleared, serde_json::json!({"event": "annotationsCleared"}));

        let deleted = serde_json::to_value(&ServerEvent::AnnotationDeleted {
            id: Uuid::nil(),
        })
        .unwrap();
        assert_eq!(deleted["event"], "annotationDeleted");
        assert_eq!(deleted["id"], Uuid::nil().to_string());
    }

    #[test]
    fn test_request_failed_omits_absent_fields() {
        let value = serde_json::to_value(&ServerEvent::RequestFailed {
            code: "notFound".into(),
            reason: "annotation not found".into(),
            id: None,
            media_id: None,
        })
        .unwrap();
        assert_eq!(value["event"], "requestFailed");
        assert!(value.get("id").is_none());
        assert!(value.get("mediaId").is_none());
    }

    #[test]
    fn test_added_event_carries_full_record() {
        let annotation = Annotation {
            id: Uuid::new_v4(),
            media_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            author_display_name: "alice".into(),
            position: Position { x: 0.5, y: 0.5 },
            text: "note".into(),
            media_timestamp: None,
            created_at: chrono::Utc::now(),
        };
        let value = serde_json::to_value(&ServerEvent::AnnotationAdded(annotation.clone())).unwrap();
        assert_eq!(value["event"], "annotationAdded");
        assert_eq!(value["id"], annotation.id.to_string());
        assert_eq!(value["authorDisplayName"], "alice");
        assert_eq!(value["position"]["x"], 0.5);
    }
}

/**
 * Collaboration Error Types
 *
 * This module defines the error taxonomy shared by the REST boundary and
 * the room gateway. Every rejection is returned synchronously to the caller
 * that produced it; errors are never broadcast to a room.
 *
 * # Error Categories
 *
 * - `Unauthenticated` - no or invalid credential, refused before any room action
 * - `NotFound` - media, record or link does not exist (distinct from denial)
 * - `AccessDenied` - room-level capability check failed
 * - `RecordAuthorMismatch` - capability sufficient for the room but not for
 *   this specific record edit/delete
 * - `LinkExpired` / `LinkExhausted` / `EmailMismatch` - redemption-specific,
 *   each independently user-actionable
 * - `Validation` - malformed event payload
 * - `Unavailable` - persistence failure; a failed write is never followed
 *   by a broadcast
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use uuid::Uuid;

/// All failure modes of the collaboration core.
#[derive(Debug, Error)]
pub enum CollabError {
    /// No credential, or a credential the verifier rejected.
    #[error("Unauthenticated: {reason}")]
    Unauthenticated { reason: String },

    /// The referenced media, record or link does not exist.
    #[error("{what} not found")]
    NotFound { what: &'static str },

    /// Room-level capability check failed.
    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },

    /// The acting principal is neither the record's author nor the media owner.
    #[error("Not the author of record {id}")]
    RecordAuthorMismatch { id: Uuid },

    /// The share link's expiry has passed.
    #[error("Share link expired")]
    LinkExpired,

    /// The share link's use budget is spent.
    #[error("Share link exhausted")]
    LinkExhausted,

    /// Email-restricted link redeemed by a principal with a different email.
    #[error("Link restricted to {expected_email}")]
    EmailMismatch { expected_email: String },

    /// Malformed or incomplete payload.
    #[error("Validation error in field '{field}': {message}")]
    Validation { field: String, message: String },

    /// Store-layer failure surfaced as a generic unavailability.
    #[error("Storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
}

impl CollabError {
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated {
            reason: reason.into(),
        }
    }

    pub fn access_denied(reason: impl Into<String>) -> Self {
        Self::AccessDenied {
            reason: reason.into(),
        }
    }

    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound { what }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code carried on the wire in `requestFailed`
    /// events and REST error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::NotFound { .. } => "notFound",
            Self::AccessDenied { .. } => "accessDenied",
            Self::RecordAuthorMismatch { .. } => "recordAuthorMismatch",
            Self::LinkExpired => "linkExpired",
            Self::LinkExhausted => "linkExhausted",
            Self::EmailMismatch { .. } => "emailMismatch",
            Self::Validation { .. } => "validationError",
            Self::Unavailable(_) => "unavailable",
        }
    }

    /// HTTP status for the REST boundary.
    ///
    /// NotFound maps to 404 and AccessDenied to 403 so clients can render
    /// "this link is invalid" and "ask the owner for access" differently.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::AccessDenied { .. } | Self::RecordAuthorMismatch { .. } => StatusCode::FORBIDDEN,
            Self::LinkExpired => StatusCode::GONE,
            Self::LinkExhausted => StatusCode::TOO_MANY_REQUESTS,
            Self::EmailMismatch { .. } => StatusCode::FORBIDDEN,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for CollabError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("[Error] {}", self);
        }
        let mut body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        // The caller may need to re-authenticate as a different identity,
        // so the expected address is part of the error body.
        if let Self::EmailMismatch { expected_email } = &self {
            body["expectedEmail"] = serde_json::json!(expected_email);
        }
        (status, Json(body)).into_response()
    }
}

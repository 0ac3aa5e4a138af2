/**
 * Authentication Middleware
 *
 * Middleware for REST routes that require an authenticated principal. It
 * extracts the bearer token from the Authorization header, verifies it,
 * and attaches the principal to request extensions for handlers.
 */

use crate::auth::verifier::Principal;
use crate::error::CollabError;
use crate::server::state::AppState;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

/// Verify the Authorization header and attach the principal.
///
/// Returns 401 before any handler runs if the token is missing or invalid.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, CollabError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("[Auth] Missing Authorization header");
            CollabError::unauthenticated("no token provided")
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        tracing::warn!("[Auth] Malformed Authorization header");
        CollabError::unauthenticated("invalid token format")
    })?;

    let principal = app_state.verifier.verify(token)?;
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Axum extractor for the authenticated principal.
///
/// Use as a handler parameter on routes behind `auth_middleware`.
#[derive(Clone, Debug)]
pub struct AuthUser(pub Principal);

impl axum::extract::FromRequestParts<AppState> for AuthUser {
    type Rejection = CollabError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("[Auth] Principal not found in request extensions");
                CollabError::unauthenticated("not authenticated")
            })?;

        Ok(AuthUser(principal))
    }
}

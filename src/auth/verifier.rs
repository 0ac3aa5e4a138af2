/**
 * Bearer Token Verification
 *
 * The identity provider is an external collaborator: this module verifies
 * the opaque bearer token presented at connection and REST-call time and
 * extracts the few claims the core consumes - subject id for
 * authorization, display name and email for presentation and matching.
 * Nothing else in the token is trusted or inspected.
 */

use crate::error::CollabError;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Claims the verifier understands. Unknown claims are ignored.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id (stringified UUID).
    pub sub: String,
    pub email: String,
    /// Display name, when the IdP provides one.
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at time (Unix timestamp)
    pub iat: u64,
}

/// The authenticated identity a connection or request acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
}

impl Principal {
    fn from_claims(claims: Claims) -> Result<Self, CollabError> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| CollabError::unauthenticated("invalid subject in token"))?;
        let display_name = claims
            .preferred_username
            .or(claims.name)
            .unwrap_or_else(|| "Anonymous".to_string());
        Ok(Self {
            id,
            display_name,
            email: claims.email,
        })
    }
}

/// Verifies bearer tokens against a shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    /// Verify a token and build the acting principal from its claims.
    ///
    /// An expired token is reported distinctly from an invalid one so the
    /// client knows to refresh rather than re-authenticate.
    pub fn verify(&self, token: &str) -> Result<Principal, CollabError> {
        let validation = Validation::default();
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        CollabError::unauthenticated("token expired")
                    }
                    _ => CollabError::unauthenticated("invalid token"),
                }
            })?;
        Principal::from_claims(token_data.claims)
    }

    /// Issue a token for a principal. Used by tests and local tooling; in
    /// production tokens come from the IdP.
    pub fn create_token(
        &self,
        user_id: Uuid,
        display_name: &str,
        email: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before epoch")
            .as_secs();

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            preferred_username: Some(display_name.to_string()),
            name: None,
            exp: now + 30 * 24 * 60 * 60,
            iat: now,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }
}

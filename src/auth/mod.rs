//! Connection and request authentication against the external IdP seam.

pub mod middleware;
pub mod verifier;

pub use middleware::{auth_middleware, AuthUser};
pub use verifier::{Principal, TokenVerifier};

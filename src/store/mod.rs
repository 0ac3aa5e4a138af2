//! Durable stores backing the collaboration core.
//!
//! All collaboration records are keyed by media id; author identity is set
//! from the authenticated connection at creation time and never taken from
//! client-supplied payload fields.

pub mod annotations;
pub mod comments;
pub mod grants;
pub mod media;
pub mod schema;
pub mod share_links;

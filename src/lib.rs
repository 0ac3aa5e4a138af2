//! ReviewRoom - Real-time media review and collaboration core
//!
//! ReviewRoom turns a media record into a collaborative review session:
//! authenticated participants join a per-media room over WebSocket,
//! place durable annotations and time-anchored comments, and see every
//! accepted change live.
//!
//! # Module Structure
//!
//! - **`access`** - capability model and the per-event access resolver
//! - **`store`** - SQLite persistence: media, grants, annotations,
//!   comments, share links
//! - **`room`** - live room membership and fan-out
//! - **`gateway`** - the room protocol: wire events, the
//!   transport-independent core, and the WebSocket adapter
//! - **`auth`** - bearer-token verification and the REST middleware
//! - **`routes`** - REST boundary for the media library and share links
//! - **`server`** - application state and stepwise startup

pub mod access;
pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod room;
pub mod routes;
pub mod server;
pub mod store;

pub use error::CollabError;

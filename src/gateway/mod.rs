//! Room protocol: wire events, the transport-independent core, and the
//! WebSocket adapter.

pub mod events;
pub mod handler;
pub mod socket;

pub use events::{ClientEvent, ServerEvent};
pub use handler::{CollabGateway, RoomSession};

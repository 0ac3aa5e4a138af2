//! Live room membership and fan-out.

pub mod registry;

pub use registry::{RoomMember, RoomRegistry};

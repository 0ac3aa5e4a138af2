//! Layered access model: room-level capabilities resolved from owned data.

pub mod policy;
pub mod resolver;

pub use policy::{Action, Capability};
pub use resolver::{resolve, ResolvedAccess};

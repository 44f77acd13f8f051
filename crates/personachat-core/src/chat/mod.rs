//! Conversation core: storage ports, context assembly, per-session locking,
//! and the service that orchestrates one chat turn.

pub mod context;
pub mod lock;
pub mod registry;
pub mod service;
pub mod session_id;
pub mod store;

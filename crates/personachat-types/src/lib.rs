//! Shared domain types for personachat.
//!
//! Personas, sessions, turns, completion engine shapes, configuration, and
//! the error taxonomy. No infrastructure dependencies: only serde,
//! chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod persona;

//! Infrastructure layer for personachat.
//!
//! Contains implementations of the traits defined in `personachat-core`:
//! SQLite message store and session registry, the OpenAI-compatible
//! completion client, and configuration loading.

pub mod config;
pub mod llm;
pub mod sqlite;

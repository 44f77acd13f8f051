//! Business logic and repository trait definitions for personachat.
//!
//! This crate defines the "ports" (storage and completion traits) that the
//! infrastructure layer implements. It depends only on `personachat-types`,
//! never on `personachat-infra` or any database/IO crate.

pub mod chat;
pub mod llm;

//! Completion engine abstraction for personachat.

pub mod provider;

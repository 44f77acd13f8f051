//! Request extractors.

pub mod identity;

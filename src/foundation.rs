//! Shared primitives: core geometry/pixel types and the crate error type.

pub mod core;
pub mod error;

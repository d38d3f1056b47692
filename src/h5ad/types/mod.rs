//! Foundational data structures, error types, and element type descriptors.

pub mod dtype;
pub mod error;
pub mod mapping;
pub mod models;

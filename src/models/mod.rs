//! Core data models
//!
//! Profile records and the pool they live in, plus slot sequences and
//! per-slot runtime state.

pub mod profile;
pub mod slot;

pub use profile::*;
pub use slot::*;

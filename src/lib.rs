//! Slotboard - looping kiosk display board
//!
//! A looping kiosk board: a fixed grid of slots, each rotating through its own
//! block of profiles with a wipe transition, started in staggered waves and
//! scrolled horizontally as one seamless strip.

pub mod assets;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod render;
pub mod services;

//! Rendering boundary
//!
//! The scheduling core pushes rendering intents into a [`Sink`] and asks it
//! for slot widths. It never knows how a card is drawn.

pub mod layout;
pub mod mirror;

pub use layout::{CardLayout, content_width};
pub use mirror::{MirrorBoard, SlotElement};

use crate::error::Result;
use crate::models::profile::ProfileRecord;
use crate::models::slot::TransitionPhase;

/// Content to show in one slot
#[derive(Debug, Clone, Copy)]
pub struct RenderIntent<'a> {
    /// Pool index of the profile
    pub index: usize,
    pub profile: &'a ProfileRecord,
    /// Underbar accent for the slot
    pub accent: usize,
    /// Whether the image finished loading before the swap
    pub asset_ready: bool,
}

/// Something the board renders into
///
/// Implementations own every rendered copy of a slot and must update all of
/// them before returning from [`Sink::render`].
pub trait Sink: Send + Sync {
    /// Replace a slot's content across its mirror group
    fn render(&self, slot: usize, intent: &RenderIntent<'_>) -> Result<()>;

    /// Transition phase change for a slot's mirror group
    fn phase(&self, slot: usize, phase: TransitionPhase);

    /// Current rendered width of a slot
    fn width_of(&self, slot: usize) -> f64;

    /// Horizontal scroll position of the whole board
    fn scroll_to(&self, _offset: f64) {}
}
